/// Loading of task sections (REACTIONS, CONCENTRATIONS, PIPE) from a plain text task file
pub mod load_from_file;
/// terminal + optional file logging
pub mod logger;
