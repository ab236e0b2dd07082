//! # Grid sweep
//!
//! Solves the reaction network on a 2-D grid of initial states: one molecule is
//! varied along the rows, another along the columns, everything else comes from
//! a base vector. The final concentration of a chosen molecule is pivoted into a
//! matrix `z[row][column]` (heatmap data).
//!
//! Rows are solved in parallel on the rayon pool. Every cell builds its own
//! initial vector; the only thing shared between workers is the read-only
//! reaction table.
use log::info;
use nalgebra::DMatrix;
use prettytable::{Cell, Row, Table};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Corrosion::corrosion_calc::{CorrosionError, PipeInputs, corrosion_rates_from_concentrations};
use crate::Kinetics::molecules::{ConcentrationVector, Molecule};
use crate::Kinetics::reaction_solver::{ReactionSolver, SolverError};
use crate::Kinetics::reaction_table::ReactionTable;
use crate::settings::SolverSettings;

pub const MAX_AXIS_POINTS: usize = 10_000;

/// evenly spaced axis, both ends included
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Default for GridAxis {
    /// 0.5, 1.0, ... 10.0 (20 points)
    fn default() -> Self {
        Self {
            start: 0.5,
            stop: 10.0,
            step: 0.5,
        }
    }
}

impl GridAxis {
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    fn validate(&self) -> Result<(), SolverError> {
        let finite = self.start.is_finite() && self.stop.is_finite() && self.step.is_finite();
        if !finite || self.step <= 0.0 || self.stop < self.start || self.start < 0.0 {
            return Err(SolverError::InvalidGrid(format!(
                "axis {}..{} step {} must be nonnegative, increasing, with positive step",
                self.start, self.stop, self.step
            )));
        }
        if self.point_count().is_none() {
            return Err(SolverError::InvalidGrid(format!(
                "axis {}..{} step {} has more than {} points",
                self.start, self.stop, self.step, MAX_AXIS_POINTS
            )));
        }
        Ok(())
    }

    /// None when the axis is malformed or longer than [`MAX_AXIS_POINTS`]
    pub fn point_count(&self) -> Option<usize> {
        if self.step.is_nan() || self.step <= 0.0 {
            return None;
        }
        // small slack so that 10.0 is not lost to rounding of (stop - start) / step
        let intervals = ((self.stop - self.start) / self.step + 1e-9).floor();
        if !intervals.is_finite() || intervals < 0.0 || intervals >= MAX_AXIS_POINTS as f64 {
            return None;
        }
        (intervals as usize).checked_add(1)
    }

    /// empty for an axis rejected by [`GridAxis::point_count`]
    pub fn values(&self) -> Vec<f64> {
        let n = self.point_count().unwrap_or(0);
        (0..n).map(|i| self.start + i as f64 * self.step).collect()
    }
}

/// which molecules span the grid and which one is reported
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSelection {
    pub row: Molecule,
    pub column: Molecule,
    pub value: Molecule,
}

impl Default for GridSelection {
    fn default() -> Self {
        Self {
            row: Molecule::NO2,
            column: Molecule::O2,
            value: Molecule::H2SO4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSweep {
    pub selection: GridSelection,
    pub base: ConcentrationVector,
    pub rows: GridAxis,
    pub columns: GridAxis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridResult {
    /// column axis values
    pub x: Vec<f64>,
    /// row axis values
    pub y: Vec<f64>,
    pub value: Molecule,
    /// z[row][column] = final concentration of `value`
    pub z: Vec<Vec<f64>>,
    /// final state of every cell, same layout as `z`
    pub finals: Vec<Vec<ConcentrationVector>>,
}

impl GridSweep {
    pub fn new(selection: GridSelection, base: ConcentrationVector) -> Self {
        Self {
            selection,
            base,
            rows: GridAxis::default(),
            columns: GridAxis::default(),
        }
    }

    fn cell_initial(&self, y: f64, x: f64) -> Result<ConcentrationVector, SolverError> {
        self.base
            .with(self.selection.row, y)
            .and_then(|c| c.with(self.selection.column, x))
            .map_err(|e| SolverError::InvalidGrid(e.to_string()))
    }

    pub fn run(
        &self,
        table: &ReactionTable,
        settings: SolverSettings,
    ) -> Result<GridResult, SolverError> {
        if self.selection.row == self.selection.column {
            return Err(SolverError::InvalidGrid(format!(
                "row and column molecule are both {}",
                self.selection.row
            )));
        }
        self.rows.validate()?;
        self.columns.validate()?;
        let x = self.columns.values();
        let y = self.rows.values();
        info!(
            "grid sweep {} x {}: rows {}, columns {}, value {}",
            y.len(),
            x.len(),
            self.selection.row,
            self.selection.column,
            self.selection.value
        );

        settings
            .validate()
            .map_err(|e| SolverError::InvalidSettings(e.to_string()))?;
        let solver = ReactionSolver::new(table, settings.without_trace());
        let rows: Vec<Result<Vec<ConcentrationVector>, SolverError>> = y
            .par_iter()
            .map(|&yvalue| {
                x.iter()
                    .map(|&xvalue| {
                        let initial = self.cell_initial(yvalue, xvalue)?;
                        solver.solve(&initial).map(|result| result.final_)
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect();
        let finals = rows.into_iter().collect::<Result<Vec<_>, _>>()?;
        info!("grid sweep finished: {} cells solved", y.len() * x.len());

        let mut result = GridResult {
            x,
            y,
            value: self.selection.value,
            z: Vec::new(),
            finals,
        };
        result.z = result.pivot(self.selection.value);
        Ok(result)
    }
}

impl GridResult {
    /// final concentration of `molecule` per cell
    pub fn pivot(&self, molecule: Molecule) -> Vec<Vec<f64>> {
        self.finals
            .iter()
            .map(|row| row.iter().map(|c| c.get(molecule)).collect())
            .collect()
    }

    /// total corrosion rate (mm/year) per cell
    pub fn corrosion_grid(&self, pipe: &PipeInputs) -> Result<Vec<Vec<f64>>, CorrosionError> {
        let geometry = pipe.geometry();
        self.finals
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| {
                        corrosion_rates_from_concentrations(&geometry, pipe.flowrate, c)
                            .map(|rates| rates.total_mm_yr)
                    })
                    .collect()
            })
            .collect()
    }

    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.y.len(), self.x.len(), |i, j| self.z[i][j])
    }

    /// rows printed bottom to top so the table reads like the heatmap
    pub fn pretty_table(&self) -> Table {
        let mut table = Table::new();
        let mut header = vec![Cell::new(&format!("{} \\ x", self.value.display_text()))];
        header.extend(self.x.iter().map(|x| Cell::new(&format!("{:.1}", x))));
        table.add_row(Row::new(header));
        for (yvalue, row) in self.y.iter().zip(self.z.iter()).rev() {
            let mut cells = vec![Cell::new(&format!("{:.1}", yvalue))];
            cells.extend(row.iter().map(|v| Cell::new(&format!("{:.2}", v))));
            table.add_row(Row::new(cells));
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kinetics::reaction_solver::solve;
    use approx::assert_relative_eq;

    fn base() -> ConcentrationVector {
        ConcentrationVector::from_pairs([
            (Molecule::H2O, 30.0),
            (Molecule::SO2, 10.0),
            (Molecule::H2S, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_default_axis() {
        let values = GridAxis::default().values();
        assert_eq!(values.len(), 20);
        assert_eq!(values[0], 0.5);
        assert_relative_eq!(values[19], 10.0);
    }

    #[test]
    fn test_grid_matches_single_solves() {
        let table = ReactionTable::co2_impurities().unwrap();
        let mut sweep = GridSweep::new(GridSelection::default(), base());
        sweep.rows = GridAxis::new(1.0, 3.0, 1.0);
        sweep.columns = GridAxis::new(0.5, 2.0, 0.5);
        let result = sweep.run(&table, SolverSettings::default()).unwrap();

        assert_eq!(result.y, vec![1.0, 2.0, 3.0]);
        assert_eq!(result.x.len(), 4);
        assert_eq!(result.z.len(), 3);
        assert!(result.z.iter().all(|row| row.len() == 4));

        for (i, &yv) in result.y.iter().enumerate() {
            for (j, &xv) in result.x.iter().enumerate() {
                let initial = base()
                    .with(Molecule::NO2, yv)
                    .unwrap()
                    .with(Molecule::O2, xv)
                    .unwrap();
                let single = solve(&initial, &table).unwrap();
                assert_relative_eq!(result.z[i][j], single.final_.get(Molecule::H2SO4));
            }
        }
        let matrix = result.to_matrix();
        assert_eq!(matrix.shape(), (3, 4));
        assert_eq!(matrix[(2, 3)], result.z[2][3]);
    }

    #[test]
    fn test_corrosion_grid() {
        let table = ReactionTable::co2_impurities().unwrap();
        let mut sweep = GridSweep::new(GridSelection::default(), base());
        sweep.rows = GridAxis::new(1.0, 2.0, 1.0);
        sweep.columns = GridAxis::new(1.0, 2.0, 1.0);
        let result = sweep.run(&table, SolverSettings::default()).unwrap();
        let corrosion = result.corrosion_grid(&PipeInputs::default()).unwrap();
        assert_eq!(corrosion.len(), 2);
        assert!(corrosion.iter().flatten().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_invalid_grids() {
        let table = ReactionTable::co2_impurities().unwrap();
        let same = GridSelection {
            row: Molecule::O2,
            column: Molecule::O2,
            value: Molecule::H2SO4,
        };
        assert!(matches!(
            GridSweep::new(same, base()).run(&table, SolverSettings::default()),
            Err(SolverError::InvalidGrid(_))
        ));
        let mut sweep = GridSweep::new(GridSelection::default(), base());
        sweep.rows = GridAxis::new(1.0, 0.0, 0.5);
        assert!(sweep.run(&table, SolverSettings::default()).is_err());
        sweep.rows = GridAxis::new(0.0, 1.0, 0.0);
        assert!(sweep.run(&table, SolverSettings::default()).is_err());
    }

    #[test]
    fn test_axis_point_limit() {
        let tiny_step = GridAxis::new(0.0, 1.0, 1e-300);
        assert_eq!(tiny_step.point_count(), None);
        assert!(tiny_step.values().is_empty());
        assert!(matches!(tiny_step.validate(), Err(SolverError::InvalidGrid(_))));

        let too_long = GridAxis::new(0.0, 10_000.0, 1.0);
        assert!(too_long.validate().is_err());
        let longest = GridAxis::new(0.0, 9_999.0, 1.0);
        assert_eq!(longest.point_count(), Some(MAX_AXIS_POINTS));
        assert!(longest.validate().is_ok());

        let table = ReactionTable::co2_impurities().unwrap();
        let mut sweep = GridSweep::new(GridSelection::default(), base());
        sweep.columns = tiny_step;
        assert!(matches!(
            sweep.run(&table, SolverSettings::default()),
            Err(SolverError::InvalidGrid(_))
        ));
    }

    #[test]
    fn test_grid_rejects_bad_settings() {
        let table = ReactionTable::co2_impurities().unwrap();
        let mut sweep = GridSweep::new(GridSelection::default(), base());
        sweep.rows = GridAxis::new(1.0, 2.0, 1.0);
        sweep.columns = GridAxis::new(1.0, 2.0, 1.0);
        let bad = SolverSettings {
            epsilon: f64::NAN,
            ..SolverSettings::default()
        };
        assert!(matches!(
            sweep.run(&table, bad),
            Err(SolverError::InvalidSettings(_))
        ));
    }
}
