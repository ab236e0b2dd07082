#[allow(non_snake_case)]
pub mod Corrosion;
#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Kinetics;
#[allow(non_snake_case)]
pub mod Utils;
pub mod cli;
pub mod grid_sweep;
pub mod settings;
