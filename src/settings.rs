//! # Settings Module
//!
//! ## Purpose
//! Holds every tunable of the crate in one serializable structure: solver
//! thresholds, default inputs shown by the CLI and the default grid selection.
//! Settings are loaded once and passed down explicitly; nothing here is global.
//!
//! ## Configuration Format
//! ```json
//! {
//!   "solver": { "epsilon": 0.001, "max_iterations": 10000, "record_trace": true },
//!   "default_inputs": { "H2O": 30.0, "O2": 30.0, "SO2": 10.0, "NO2": 20.0, "H2S": 0.0 },
//!   "pipe": { "inner_diameter": 30.0, "drop_out_length": 1000.0, "flowrate": 20.0 },
//!   "grid": { "row": "NO2", "column": "O2", "value": "H2SO4" }
//! }
//! ```
//! Every field is optional; missing fields take the defaults above.
//!
//! ## Solver tunables
//! | Field | Default | Meaning |
//! |-------|---------|---------|
//! | epsilon | 0.001 | smallest multiplier for which a reaction counts as applicable |
//! | max_iterations | 10000 | cap on reaction applications per solve |
//! | record_trace | true | keep a step record per application |

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::Corrosion::corrosion_calc::PipeInputs;
use crate::Kinetics::molecules::{ConcentrationVector, Molecule};
use crate::grid_sweep::GridSelection;

pub const DEFAULT_CONFIG_FILE: &str = "co2spec_config.json";
pub const DEFAULT_EPSILON: f64 = 0.001;
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub epsilon: f64,
    pub max_iterations: usize,
    pub record_trace: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            record_trace: true,
        }
    }
}

impl SolverSettings {
    /// epsilon must be positive, otherwise the solver could chase vanishing steps
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "epsilon must be a positive number, got {}",
                self.epsilon
            )));
        }
        if self.max_iterations == 0 {
            return Err(SettingsError::Invalid(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn without_trace(self) -> Self {
        Self {
            record_trace: false,
            ..self
        }
    }
}

fn default_inputs() -> ConcentrationVector {
    ConcentrationVector::from_pairs([
        (Molecule::H2O, 30.0),
        (Molecule::O2, 30.0),
        (Molecule::SO2, 10.0),
        (Molecule::NO2, 20.0),
        (Molecule::H2S, 0.0),
    ])
    .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub solver: SolverSettings,
    pub default_inputs: ConcentrationVector,
    pub pipe: PipeInputs,
    pub grid: GridSelection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            solver: SolverSettings::default(),
            default_inputs: default_inputs(),
            pipe: PipeInputs::default(),
            grid: GridSelection::default(),
        }
    }
}

impl Settings {
    /// Reads and validates settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path.as_ref())?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.solver.validate()?;
        info!("settings loaded from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Like [`Settings::load`] but falls back to defaults when the file is
    /// missing or broken.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        self.solver.validate()?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        info!("settings saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.solver.epsilon, 0.001);
        assert_eq!(settings.solver.max_iterations, 10_000);
        assert!(settings.solver.record_trace);
        assert_eq!(settings.default_inputs.get(Molecule::SO2), 10.0);
        assert_eq!(settings.default_inputs.get(Molecule::HNO3), 0.0);
        assert_eq!(settings.pipe.inner_diameter, 30.0);
        assert_eq!(settings.grid.row, Molecule::NO2);
        assert_eq!(settings.grid.column, Molecule::O2);
        assert_eq!(settings.grid.value, Molecule::H2SO4);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"solver": {"max_iterations": 50}}"#).unwrap();
        assert_eq!(settings.solver.max_iterations, 50);
        assert_eq!(settings.solver.epsilon, 0.001);
        assert_eq!(settings.pipe, PipeInputs::default());
    }

    #[test]
    fn test_save_and_load() {
        let file = NamedTempFile::new().unwrap();
        let mut settings = Settings::default();
        settings.solver.epsilon = 0.01;
        settings.pipe.flowrate = 12.5;
        settings.save(file.path()).unwrap();
        let loaded = Settings::load(file.path()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_invalid_solver_settings() {
        let bad = SolverSettings {
            epsilon: 0.0,
            ..SolverSettings::default()
        };
        assert!(matches!(bad.validate(), Err(SettingsError::Invalid(_))));
        let bad = SolverSettings {
            max_iterations: 0,
            ..SolverSettings::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_load_or_default_on_broken_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();
        assert_eq!(Settings::load_or_default(file.path()), Settings::default());
        assert_eq!(
            Settings::load_or_default("/no/such/co2spec_config.json"),
            Settings::default()
        );
    }
}
