//! Closed vocabulary of the species tracked in a CO2 stream and the typed
//! concentration vector over them.
//!
//! Concentrations are flow quantities in an arbitrary but consistent unit
//! (mol/hour in the corrosion model). Every entry is nonnegative; a molecule that
//! was never set reads as zero.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::str::FromStr;
use thiserror::Error;

/// tracked chemical species
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Molecule {
    #[serde(alias = "h2o")]
    H2O,
    #[serde(alias = "o2")]
    O2,
    #[serde(alias = "so2")]
    SO2,
    #[serde(alias = "no2")]
    NO2,
    #[serde(alias = "h2s")]
    H2S,
    #[serde(alias = "h2so4")]
    H2SO4,
    #[serde(alias = "hno3")]
    HNO3,
    #[serde(alias = "hno2")]
    HNO2,
    #[serde(alias = "s8")]
    S8,
    #[serde(alias = "no")]
    NO,
}

impl Molecule {
    pub const COUNT: usize = 10;
    /// all molecules in column order of the concentration vector
    pub const ALL: [Molecule; Molecule::COUNT] = [
        Molecule::H2O,
        Molecule::O2,
        Molecule::SO2,
        Molecule::NO2,
        Molecule::H2S,
        Molecule::H2SO4,
        Molecule::HNO3,
        Molecule::HNO2,
        Molecule::S8,
        Molecule::NO,
    ];

    pub fn position(self) -> usize {
        self as usize
    }
    /// plain ASCII formula, also the serialized name
    pub fn formula(self) -> &'static str {
        match self {
            Molecule::H2O => "H2O",
            Molecule::O2 => "O2",
            Molecule::SO2 => "SO2",
            Molecule::NO2 => "NO2",
            Molecule::H2S => "H2S",
            Molecule::H2SO4 => "H2SO4",
            Molecule::HNO3 => "HNO3",
            Molecule::HNO2 => "HNO2",
            Molecule::S8 => "S8",
            Molecule::NO => "NO",
        }
    }
    /// formula with unicode subscripts, used for traces and tables
    pub fn display_text(self) -> &'static str {
        match self {
            Molecule::H2O => "H₂O",
            Molecule::O2 => "O₂",
            Molecule::SO2 => "SO₂",
            Molecule::NO2 => "NO₂",
            Molecule::H2S => "H₂S",
            Molecule::H2SO4 => "H₂SO₄",
            Molecule::HNO3 => "HNO₃",
            Molecule::HNO2 => "HNO₂",
            Molecule::S8 => "S₈",
            Molecule::NO => "NO",
        }
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.formula())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("unknown molecule '{0}'")]
pub struct UnknownMolecule(pub String);

impl FromStr for Molecule {
    type Err = UnknownMolecule;
    /// case-insensitive, accepts "H2SO4" as well as "h2so4"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Molecule::ALL
            .iter()
            .copied()
            .find(|m| m.formula().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownMolecule(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConcentrationError {
    #[error("concentration of {molecule} must be nonnegative, got {value}")]
    Negative { molecule: Molecule, value: f64 },
    #[error("concentration of {molecule} is not a finite number")]
    NonFinite { molecule: Molecule },
}

fn check_value(molecule: Molecule, value: f64) -> Result<f64, ConcentrationError> {
    if !value.is_finite() {
        return Err(ConcentrationError::NonFinite { molecule });
    }
    if value < 0.0 {
        return Err(ConcentrationError::Negative { molecule, value });
    }
    Ok(value)
}

/// Total mapping Molecule -> nonnegative flow quantity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Molecule, f64>",
    into = "BTreeMap<Molecule, f64>"
)]
pub struct ConcentrationVector {
    values: [f64; Molecule::COUNT],
}

impl ConcentrationVector {
    /// all concentrations zero
    pub fn new() -> Self {
        Self::default()
    }

    /// builds a vector from (molecule, value) pairs; molecules not listed stay zero,
    /// a molecule listed twice keeps the last value
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConcentrationError>
    where
        I: IntoIterator<Item = (Molecule, f64)>,
    {
        let mut vector = Self::new();
        for (molecule, value) in pairs {
            vector.set(molecule, value)?;
        }
        Ok(vector)
    }

    /// get-or-zero accessor
    pub fn get(&self, molecule: Molecule) -> f64 {
        self.values[molecule.position()]
    }

    pub fn set(&mut self, molecule: Molecule, value: f64) -> Result<(), ConcentrationError> {
        self.values[molecule.position()] = check_value(molecule, value)?;
        Ok(())
    }

    /// builder flavour of `set`
    pub fn with(mut self, molecule: Molecule, value: f64) -> Result<Self, ConcentrationError> {
        self.set(molecule, value)?;
        Ok(self)
    }

    /// Adds `delta` (may be negative). Floating residue below zero is clamped to
    /// exactly zero so the vector never shows negative entries.
    pub(crate) fn add(&mut self, molecule: Molecule, delta: f64) {
        let slot = &mut self.values[molecule.position()];
        *slot = (*slot + delta).max(0.0);
    }

    /// elementwise maximum with another vector
    pub(crate) fn raise_to(&mut self, other: &ConcentrationVector) {
        for (mine, theirs) in self.values.iter_mut().zip(other.values.iter()) {
            *mine = mine.max(*theirs);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Molecule, f64)> + '_ {
        Molecule::ALL.iter().map(move |&m| (m, self.get(m)))
    }

    pub fn to_map(&self) -> BTreeMap<Molecule, f64> {
        self.iter().collect()
    }

    /// copy with every value rounded to `decimals` digits
    pub fn rounded(&self, decimals: i32) -> Self {
        let scale = 10f64.powi(decimals);
        let mut values = self.values;
        for v in values.iter_mut() {
            *v = (*v * scale).round() / scale;
        }
        Self { values }
    }

    /// largest absolute difference over all molecules
    pub fn max_abs_diff(&self, other: &ConcentrationVector) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl Index<Molecule> for ConcentrationVector {
    type Output = f64;
    fn index(&self, molecule: Molecule) -> &f64 {
        &self.values[molecule.position()]
    }
}

impl TryFrom<BTreeMap<Molecule, f64>> for ConcentrationVector {
    type Error = ConcentrationError;
    fn try_from(map: BTreeMap<Molecule, f64>) -> Result<Self, Self::Error> {
        Self::from_pairs(map)
    }
}

impl From<ConcentrationVector> for BTreeMap<Molecule, f64> {
    fn from(vector: ConcentrationVector) -> Self {
        vector.to_map()
    }
}

impl fmt::Display for ConcentrationVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(m, v)| format!("{}: {:.1}", m.formula(), v))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_molecule_from_str() {
        assert_eq!("H2SO4".parse::<Molecule>(), Ok(Molecule::H2SO4));
        assert_eq!("h2so4".parse::<Molecule>(), Ok(Molecule::H2SO4));
        assert_eq!(" NO ".parse::<Molecule>(), Ok(Molecule::NO));
        assert_eq!(
            "CO2".parse::<Molecule>(),
            Err(UnknownMolecule("CO2".to_string()))
        );
    }

    #[test]
    fn test_positions_follow_all() {
        for (i, m) in Molecule::ALL.iter().enumerate() {
            assert_eq!(m.position(), i);
        }
    }

    #[test]
    fn test_missing_molecule_is_zero() {
        let c = ConcentrationVector::from_pairs([(Molecule::H2O, 4.0)]).unwrap();
        assert_eq!(c.get(Molecule::H2O), 4.0);
        assert_eq!(c.get(Molecule::S8), 0.0);
        assert_eq!(c[Molecule::NO], 0.0);
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        let err = ConcentrationVector::from_pairs([(Molecule::O2, -1.0)]).unwrap_err();
        assert_eq!(
            err,
            ConcentrationError::Negative {
                molecule: Molecule::O2,
                value: -1.0
            }
        );
        let err = ConcentrationVector::new()
            .with(Molecule::NO2, f64::NAN)
            .unwrap_err();
        assert_eq!(
            err,
            ConcentrationError::NonFinite {
                molecule: Molecule::NO2
            }
        );
    }

    #[test]
    fn test_add_clamps_residue() {
        let mut c = ConcentrationVector::from_pairs([(Molecule::NO2, 0.3)]).unwrap();
        c.add(Molecule::NO2, -0.1 * 3.0);
        assert_eq!(c.get(Molecule::NO2), 0.0);
    }

    #[test]
    fn test_json_keys() {
        let json = r#"{"H2O": 40.0, "no2": 15.0}"#;
        let c: ConcentrationVector = serde_json::from_str(json).unwrap();
        assert_eq!(c.get(Molecule::H2O), 40.0);
        assert_eq!(c.get(Molecule::NO2), 15.0);
        assert_eq!(c.get(Molecule::O2), 0.0);

        let back = serde_json::to_value(c).unwrap();
        assert_eq!(back["H2O"], 40.0);
        assert_eq!(back["HNO3"], 0.0);

        let bad = r#"{"H2O": -1.0}"#;
        assert!(serde_json::from_str::<ConcentrationVector>(bad).is_err());
    }

    #[test]
    fn test_rounded() {
        let c = ConcentrationVector::from_pairs([(Molecule::O2, 5.25), (Molecule::H2O, 32.4999)])
            .unwrap();
        let r = c.rounded(1);
        assert_eq!(r.get(Molecule::H2O), 32.5);
        assert!((r.get(Molecule::O2) - 5.3).abs() < 1e-12);
    }
}
