use log::{error, info, warn};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::Corrosion::corrosion_calc::PipeInputs;
use crate::Kinetics::molecules::ConcentrationVector;
use crate::Kinetics::reaction_table::ReactionTableConfig;

pub const REACTIONS_HEADER: &str = "REACTIONS";
pub const CONCENTRATIONS_HEADER: &str = "CONCENTRATIONS";
pub const PIPE_HEADER: &str = "PIPE";

/// Task file reader. A task file is plain text made of sections: an upper-case
/// header line (`REACTIONS`, `CONCENTRATIONS`, `PIPE`) followed by a JSON document.
/// ```text
/// CONCENTRATIONS
/// {"H2O": 40, "O2": 15, "NO2": 15, "H2S": 3}
/// PIPE
/// {"inner_diameter": 36, "drop_out_length": 1000, "flowrate": 20}
/// ```
/// The file is read once by [`LoadData::open`]; sections are cut from the cached lines.
pub struct LoadData {
    pub file_name: PathBuf,
    lines: Vec<String>,
}

impl LoadData {
    pub fn open(file_name: impl Into<PathBuf>) -> Result<Self, String> {
        let file_name = file_name.into();
        let lines = read_lines(&file_name)?;
        Ok(LoadData { file_name, lines })
    }
    pub fn has_section(&self, header: &str) -> bool {
        find_header(&self.lines, header).is_some()
    }
    pub fn load_section<T: DeserializeOwned>(&self, header: &str) -> Result<T, String> {
        parse_section(&self.lines, header, &self.file_name)
    }
    pub fn load_reactions(&self) -> Result<ReactionTableConfig, String> {
        let config: ReactionTableConfig = self.load_section(REACTIONS_HEADER)?;
        if config.reactions.is_empty() {
            warn!(
                "Reaction section of '{}' contains no reactions",
                self.file_name.display()
            );
        }
        Ok(config)
    }
    pub fn load_concentrations(&self) -> Result<ConcentrationVector, String> {
        self.load_section(CONCENTRATIONS_HEADER)
    }
    pub fn load_pipe(&self) -> Result<PipeInputs, String> {
        self.load_section(PIPE_HEADER)
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>, String> {
    if !path.exists() {
        return Err(format!("File '{}' does not exist", path.display()));
    }
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return Err(format!("Failed to open file '{}': {}", path.display(), e)),
    };
    let reader = BufReader::new(file);
    reader
        .lines()
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))
}

fn is_header(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_uppercase() || c == '_')
}

fn find_header(lines: &[String], header: &str) -> Option<usize> {
    lines
        .iter()
        .position(|line| line.trim().eq_ignore_ascii_case(header))
}

/// Extracts the JSON text under `header` (up to the next header or end of file)
/// and deserializes it. Parse errors are reported with the line in the file.
pub fn load_section_from_file<T: DeserializeOwned>(path: &Path, header: &str) -> Result<T, String> {
    parse_section(&read_lines(path)?, header, path)
}

fn parse_section<T: DeserializeOwned>(lines: &[String], header: &str, path: &Path) -> Result<T, String> {
    // Start from the line after the header
    let start_index = match find_header(lines, header) {
        Some(index) => index + 1,
        None => {
            return Err(format!(
                "No '{}' header found in file '{}'",
                header,
                path.display()
            ));
        }
    };

    // Find the end index (next header or end of file)
    let end_index = lines[start_index..]
        .iter()
        .position(|line| is_header(line))
        .map(|offset| start_index + offset)
        .unwrap_or(lines.len());

    let section = lines[start_index..end_index].join("\n");
    if section.trim().is_empty() {
        warn!("Section '{}' in file '{}' is empty", header, path.display());
    }

    match serde_json::from_str::<T>(&section) {
        Ok(data) => {
            info!(
                "Successfully parsed section '{}' from file '{}'",
                header,
                path.display()
            );
            Ok(data)
        }
        Err(e) => {
            let error_line = e.line();
            let error_column = e.column();
            // line numbers in the file are 1-based, the header sits at start_index
            let actual_line = start_index + error_line;
            let error_msg = format!(
                "Error parsing section '{}' at line {}, column {} (line {} in file): {}",
                header, error_line, error_column, actual_line, e
            );
            error!("{}", error_msg);
            if error_line > 0 {
                if let Some(problem_line) = lines.get(start_index + error_line - 1) {
                    error!("Problematic line: {}", problem_line);
                    if error_column > 0 {
                        let pointer = " ".repeat(error_column - 1) + "^";
                        error!("{}", pointer);
                    }
                }
            }
            Err(error_msg)
        }
    }
}

pub fn load_reaction_table_from_file(path: &Path) -> Result<ReactionTableConfig, String> {
    LoadData::open(path)?.load_reactions()
}

pub fn load_concentrations_from_file(path: &Path) -> Result<ConcentrationVector, String> {
    load_section_from_file(path, CONCENTRATIONS_HEADER)
}

pub fn load_pipe_inputs_from_file(path: &Path) -> Result<PipeInputs, String> {
    load_section_from_file(path, PIPE_HEADER)
}
