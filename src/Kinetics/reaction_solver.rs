//! # Reaction solver
//!
//! Greedy, priority-ordered application of reactions until nothing can proceed.
//!
//! One step: scan the table from the top, skip inactive reactions, and apply the
//! first reaction whose multiplier (extent bounded by the scarcest reactant) is
//! at least `epsilon`. After an application the scan restarts from the top, so a
//! reaction higher in the table that became possible always goes first. The run
//! ends when a full scan finds nothing to apply.
//!
//! The number of applications is capped; hitting the cap means the table is
//! cyclic or does not converge and is reported as an error.
//!
//! The caller's concentration vector is never touched: the solver works on its
//! own copy and returns fresh vectors.
use log::debug;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Kinetics::molecules::{ConcentrationVector, Molecule};
use crate::Kinetics::reaction::Reaction;
use crate::Kinetics::reaction_table::ReactionTable;
use crate::settings::SolverSettings;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error(
        "no convergence after {cap} reaction steps (last applied: reaction {last_reaction}); the reaction table is cyclic or does not converge"
    )]
    IterationCapExceeded { cap: usize, last_reaction: usize },
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("invalid solver settings: {0}")]
    InvalidSettings(String),
}

/// one applied reaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub reaction_index: usize,
    pub multiplier: f64,
    pub equation: String,
    /// concentrations right after the application
    pub snapshot: ConcentrationVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub initial: ConcentrationVector,
    #[serde(rename = "final")]
    pub final_: ConcentrationVector,
    /// per-molecule maximum seen during the run
    pub max: ConcentrationVector,
    /// empty when trace recording is off
    pub trace: Vec<StepRecord>,
    /// number of applications, also counted when the trace is off
    pub steps: usize,
}

impl SolveResult {
    /// Trace as a table: one column per molecule, one row per step, first row
    /// the initial state.
    pub fn trace_table(&self) -> Table {
        let mut table = Table::new();
        let mut header: Vec<Cell> = Molecule::ALL
            .iter()
            .map(|m| Cell::new(m.display_text()))
            .collect();
        header.push(Cell::new("step"));
        table.add_row(Row::new(header));

        table.add_row(concentration_row(&self.initial, "initial".to_string()));
        for step in &self.trace {
            let label = format!(
                "eq {} * {:.3} : {}",
                step.reaction_index, step.multiplier, step.equation
            );
            table.add_row(concentration_row(&step.snapshot, label));
        }
        table
    }

    pub fn pretty_print_trace(&self) {
        self.trace_table().printstd();
    }

    /// initial / final / max side by side
    pub fn summary_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("molecule"),
            Cell::new("initial"),
            Cell::new("final"),
            Cell::new("max"),
        ]));
        for m in Molecule::ALL {
            table.add_row(Row::new(vec![
                Cell::new(m.display_text()),
                Cell::new(&format!("{:.3}", self.initial.get(m))),
                Cell::new(&format!("{:.3}", self.final_.get(m))),
                Cell::new(&format!("{:.3}", self.max.get(m))),
            ]));
        }
        table
    }
}

fn concentration_row(c: &ConcentrationVector, label: String) -> Row {
    let mut cells: Vec<Cell> = c.iter().map(|(_, v)| Cell::new(&format!("{:.1}", v))).collect();
    cells.push(Cell::new(&label));
    Row::new(cells)
}

/// Solver bound to one reaction table. Cheap to create, holds only a reference,
/// so it can be created per thread.
#[derive(Debug, Clone, Copy)]
pub struct ReactionSolver<'a> {
    table: &'a ReactionTable,
    settings: SolverSettings,
}

impl<'a> ReactionSolver<'a> {
    pub fn new(table: &'a ReactionTable, settings: SolverSettings) -> Self {
        Self { table, settings }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// first active reaction in priority order that can proceed, with its multiplier
    pub fn next_applicable(&self, concentrations: &ConcentrationVector) -> Option<(&'a Reaction, f64)> {
        self.table
            .active()
            .map(|r| (r, r.multiplier(concentrations)))
            .find(|&(_, multiplier)| multiplier >= self.settings.epsilon)
    }

    /// Fails with [`SolverError::InvalidSettings`] before any step when epsilon is
    /// not a positive number or the iteration cap is zero.
    pub fn solve(&self, initial: &ConcentrationVector) -> Result<SolveResult, SolverError> {
        self.settings
            .validate()
            .map_err(|e| SolverError::InvalidSettings(e.to_string()))?;
        let mut concentrations = *initial;
        let mut max = *initial;
        let mut trace = Vec::new();
        let mut steps = 0usize;
        let mut last_reaction = 0usize;

        while let Some((reaction, multiplier)) = self.next_applicable(&concentrations) {
            if steps >= self.settings.max_iterations {
                return Err(SolverError::IterationCapExceeded {
                    cap: self.settings.max_iterations,
                    last_reaction,
                });
            }
            reaction.apply(&mut concentrations, multiplier);
            max.raise_to(&concentrations);
            steps += 1;
            last_reaction = reaction.index();
            debug!(
                "step {}: applied eq {} * {:.3} : {} -> {}",
                steps,
                reaction.index(),
                multiplier,
                reaction,
                concentrations
            );
            if self.settings.record_trace {
                trace.push(StepRecord {
                    reaction_index: reaction.index(),
                    multiplier,
                    equation: reaction.to_string(),
                    snapshot: concentrations,
                });
            }
        }
        debug!("reaction network converged after {} steps", steps);
        Ok(SolveResult {
            initial: *initial,
            final_: concentrations,
            max,
            trace,
            steps,
        })
    }
}

/// solve with default settings
pub fn solve(
    initial: &ConcentrationVector,
    table: &ReactionTable,
) -> Result<SolveResult, SolverError> {
    ReactionSolver::new(table, SolverSettings::default()).solve(initial)
}
