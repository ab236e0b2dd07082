//! Non-interactive runner: solves one task file and prints the trace, the final
//! state and the corrosion rates.
//!
//! Sections missing from the task file are taken from the settings: no
//! `REACTIONS` means the built-in catalogue, no `CONCENTRATIONS` means the
//! default inputs, no `PIPE` means the default pipe.
use log::{error, info};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::Corrosion::corrosion_calc::{CorrosionRates, PipeInputs, corrosion_rates_from_concentrations};
use crate::Kinetics::reaction_solver::{ReactionSolver, SolveResult};
use crate::Kinetics::reaction_table::ReactionTable;
use crate::Utils::load_from_file::{
    CONCENTRATIONS_HEADER, LoadData, PIPE_HEADER, REACTIONS_HEADER,
};
use crate::settings::Settings;

#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub solution: SolveResult,
    pub pipe: PipeInputs,
    pub corrosion: CorrosionRates,
}

pub fn run_task(path: &Path, settings: &Settings) -> Result<TaskReport, String> {
    let task = LoadData::open(path)?;
    let table = if task.has_section(REACTIONS_HEADER) {
        ReactionTable::from_config(&task.load_reactions()?).map_err(|e| e.to_string())?
    } else {
        ReactionTable::co2_impurities().map_err(|e| e.to_string())?
    };
    let initial = if task.has_section(CONCENTRATIONS_HEADER) {
        task.load_concentrations()?
    } else {
        info!("no {} section, using default inputs", CONCENTRATIONS_HEADER);
        settings.default_inputs
    };
    let pipe = if task.has_section(PIPE_HEADER) {
        task.load_pipe()?
    } else {
        settings.pipe
    };

    let solution = ReactionSolver::new(&table, settings.solver)
        .solve(&initial)
        .map_err(|e| e.to_string())?;
    let corrosion =
        corrosion_rates_from_concentrations(&pipe.geometry(), pipe.flowrate, &solution.final_)
            .map_err(|e| e.to_string())?;
    Ok(TaskReport {
        solution,
        pipe,
        corrosion,
    })
}

pub fn print_report(report: &TaskReport) {
    println!("\n=== Reaction steps ===");
    report.solution.pretty_print_trace();
    println!("\n=== Flow rates, mol/h ===");
    report.solution.summary_table().printstd();
    print_corrosion(&report.pipe, &report.corrosion);
}

pub fn print_corrosion(pipe: &PipeInputs, rates: &CorrosionRates) {
    println!(
        "\n=== Corrosion: pipe {} in, drop-out length {} m, flowrate {} MT/Y ===",
        pipe.inner_diameter, pipe.drop_out_length, pipe.flowrate
    );
    println!("H2SO4 corrosion rate: {:.3} mm/y", rates.h2so4_mm_yr);
    println!("HNO3 corrosion rate:  {:.3} mm/y", rates.hno3_mm_yr);
    println!("total:                {:.3} mm/y", rates.total_mm_yr);
}

/// solve, print, and write the report as JSON when `json_out` is given
pub fn run_task_file(path: &Path, settings: &Settings, json_out: Option<&Path>) -> Result<(), String> {
    info!("running task file {}", path.display());
    let report = run_task(path, settings).inspect_err(|e| error!("{}", e))?;
    print_report(&report);
    if let Some(out) = json_out {
        let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        fs::write(out, json).map_err(|e| format!("cannot write {}: {}", out.display(), e))?;
        info!("report written to {}", out.display());
    }
    Ok(())
}
