//! Stoichiometric reaction between tracked molecules.
//!
//! A reaction knows how far it can proceed on a given concentration vector (the
//! multiplier, bounded by the scarcest reactant) and how to apply itself. It
//! carries no rate law: the solver decides which reaction goes next.
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

use crate::Kinetics::molecules::{ConcentrationVector, Molecule, UnknownMolecule};
use crate::Kinetics::molmass::{FormulaError, molecule_composition};

/// errors of reaction definitions; all of them are fatal at configuration time
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReactionError {
    #[error("reaction {index} has no reactants")]
    EmptyLhs { index: usize },
    #[error("reaction {index} has a zero coefficient for {molecule}")]
    ZeroCoefficient { index: usize, molecule: Molecule },
    #[error("reaction {index}: cannot parse equation '{equation}': {reason}")]
    Parse {
        index: usize,
        equation: String,
        reason: String,
    },
    #[error("reaction {index}: {source}")]
    UnknownMolecule {
        index: usize,
        #[source]
        source: UnknownMolecule,
    },
    #[error("duplicate reaction index {0}")]
    DuplicateIndex(usize),
    #[error("reaction index {0} is not in the table")]
    UnknownIndex(usize),
    #[error("reaction table is empty")]
    EmptyTable,
    #[error("cannot analyse element balance: {0}")]
    Formula(#[from] FormulaError),
    #[error("cannot load reaction table: {0}")]
    Load(String),
}

/// one `coefficient * molecule` entry of an equation side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub coefficient: u32,
    pub molecule: Molecule,
}

impl Term {
    pub fn new(coefficient: u32, molecule: Molecule) -> Self {
        Self {
            coefficient,
            molecule,
        }
    }
}

static ARROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:->|=>|→|=)\s*").expect("arrow regex is valid"));
static TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(\d+)\s*\*?\s*)?([A-Za-z][A-Za-z0-9]*)\s*$").expect("term regex is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    index: usize,
    lhs: Vec<Term>,
    rhs: Vec<Term>,
    active: bool,
}

impl Reaction {
    /// `index` is the reaction number in the catalogue, used in traces and
    /// scan orders; it says nothing about priority
    pub fn new(
        index: usize,
        lhs: Vec<Term>,
        rhs: Vec<Term>,
        active: bool,
    ) -> Result<Self, ReactionError> {
        if lhs.is_empty() {
            return Err(ReactionError::EmptyLhs { index });
        }
        if let Some(term) = lhs.iter().chain(rhs.iter()).find(|t| t.coefficient == 0) {
            return Err(ReactionError::ZeroCoefficient {
                index,
                molecule: term.molecule,
            });
        }
        Ok(Self {
            index,
            lhs,
            rhs,
            active,
        })
    }

    /// Parses an equation like `"H2S + 3 NO2 -> SO2 + H2O + 3 NO"`.
    /// Accepted arrows: `->`, `=>`, `=`, `→`. The reaction is active.
    pub fn parse(index: usize, equation: &str) -> Result<Self, ReactionError> {
        let parse_error = |reason: &str| ReactionError::Parse {
            index,
            equation: equation.to_string(),
            reason: reason.to_string(),
        };
        let sides: Vec<&str> = ARROW.split(equation.trim()).collect();
        if sides.len() != 2 {
            return Err(parse_error("expected exactly one arrow"));
        }
        let mut parsed_sides = Vec::with_capacity(2);
        for side in sides {
            let mut terms = Vec::new();
            if side.trim().is_empty() {
                parsed_sides.push(terms);
                continue;
            }
            for raw_term in side.split('+') {
                let cap = TERM
                    .captures(raw_term)
                    .ok_or_else(|| parse_error(&format!("malformed term '{}'", raw_term.trim())))?;
                let coefficient: u32 = match cap.get(1) {
                    Some(digits) => digits
                        .as_str()
                        .parse()
                        .map_err(|_| parse_error("coefficient out of range"))?,
                    None => 1,
                };
                let name = cap.get(2).map(|m| m.as_str()).unwrap_or_default();
                let molecule = name
                    .parse::<Molecule>()
                    .map_err(|source| ReactionError::UnknownMolecule { index, source })?;
                terms.push(Term::new(coefficient, molecule));
            }
            parsed_sides.push(terms);
        }
        let rhs = parsed_sides.pop().unwrap_or_default();
        let lhs = parsed_sides.pop().unwrap_or_default();
        let reaction = Self::new(index, lhs, rhs, true)?;
        debug!("parsed reaction {}: {}", index, reaction.equation());
        Ok(reaction)
    }

    pub fn index(&self) -> usize {
        self.index
    }
    pub fn lhs(&self) -> &[Term] {
        &self.lhs
    }
    pub fn rhs(&self) -> &[Term] {
        &self.rhs
    }
    pub fn is_active(&self) -> bool {
        self.active
    }
    /// copy with a different active flag
    pub fn with_active(&self, active: bool) -> Self {
        Self {
            active,
            ..self.clone()
        }
    }

    /// Extent the reaction can proceed on `concentrations`: the minimum over
    /// reactants of concentration / coefficient.
    pub fn multiplier(&self, concentrations: &ConcentrationVector) -> f64 {
        self.lhs
            .iter()
            .map(|t| concentrations.get(t.molecule) / t.coefficient as f64)
            .fold(f64::INFINITY, f64::min)
    }

    /// Consumes `coefficient * multiplier` of every reactant and produces
    /// `coefficient * multiplier` of every product.
    pub fn apply(&self, concentrations: &mut ConcentrationVector, multiplier: f64) {
        for t in &self.lhs {
            concentrations.add(t.molecule, -(t.coefficient as f64) * multiplier);
        }
        for t in &self.rhs {
            concentrations.add(t.molecule, t.coefficient as f64 * multiplier);
        }
    }

    /// ASCII equation, parseable by [`Reaction::parse`]
    pub fn equation(&self) -> String {
        format!(
            "{} -> {}",
            side_to_string(&self.lhs, Molecule::formula),
            side_to_string(&self.rhs, Molecule::formula)
        )
    }

    /// net change of each element, products minus reactants; an empty map means
    /// the equation is balanced
    pub fn element_balance(&self) -> Result<BTreeMap<String, i64>, FormulaError> {
        let mut net: BTreeMap<String, i64> = BTreeMap::new();
        for (terms, sign) in [(&self.lhs, -1i64), (&self.rhs, 1i64)] {
            for t in terms {
                for (element, count) in molecule_composition(t.molecule)? {
                    *net.entry(element).or_insert(0) += sign * t.coefficient as i64 * count as i64;
                }
            }
        }
        net.retain(|_, n| *n != 0);
        Ok(net)
    }
}

fn side_to_string(terms: &[Term], name: fn(Molecule) -> &'static str) -> String {
    terms
        .iter()
        .map(|t| {
            if t.coefficient == 1 {
                name(t.molecule).to_string()
            } else {
                format!("{} {}", t.coefficient, name(t.molecule))
            }
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {}",
            side_to_string(&self.lhs, Molecule::display_text),
            side_to_string(&self.rhs, Molecule::display_text)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use Molecule::*;

    #[test]
    fn test_parse_equation() {
        let r = Reaction::parse(3, "H2S + 3 NO2 -> SO2 + H2O + 3 NO").unwrap();
        assert_eq!(r.index(), 3);
        assert_eq!(r.lhs(), &[Term::new(1, H2S), Term::new(3, NO2)]);
        assert_eq!(
            r.rhs(),
            &[Term::new(1, SO2), Term::new(1, H2O), Term::new(3, NO)]
        );
        assert!(r.is_active());
        assert_eq!(r.equation(), "H2S + 3 NO2 -> SO2 + H2O + 3 NO");
        assert_eq!(r.to_string(), "H₂S + 3 NO₂ → SO₂ + H₂O + 3 NO");
    }

    #[test]
    fn test_parse_arrows_and_spacing() {
        let a = Reaction::parse(5, "2 NO2 + H2O-> HNO3 + HNO2").unwrap();
        let b = Reaction::parse(5, "2NO2+H2O=>HNO3+HNO2").unwrap();
        let c = Reaction::parse(5, "2 NO2 + H2O → HNO3 + HNO2").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Reaction::parse(1, "NO2 + SO2"),
            Err(ReactionError::Parse { .. })
        ));
        assert!(matches!(
            Reaction::parse(1, "CO + O2 -> CO2"),
            Err(ReactionError::UnknownMolecule { .. })
        ));
        assert_eq!(
            Reaction::parse(7, " -> NO"),
            Err(ReactionError::EmptyLhs { index: 7 })
        );
        assert_eq!(
            Reaction::parse(8, "0 NO + O2 -> NO2"),
            Err(ReactionError::ZeroCoefficient {
                index: 8,
                molecule: NO
            })
        );
    }

    #[test]
    fn test_multiplier() {
        let reaction = Reaction::parse(0, "2 NO + O2 -> 2 NO2").unwrap();
        let c = ConcentrationVector::from_pairs([(NO, 4.0), (O2, 2.0)]).unwrap();
        assert_eq!(reaction.multiplier(&c), 2.0);
    }

    #[test]
    fn test_multiplier_limited_by_scarcest() {
        let c = ConcentrationVector::from_pairs([
            (H2O, 30.0),
            (O2, 10.0),
            (NO2, 1.5),
            (H2S, 3.0),
        ])
        .unwrap();
        let reaction = Reaction::parse(3, "H2S + 3 NO2 -> SO2 + H2O + 3 NO").unwrap();
        assert_relative_eq!(reaction.multiplier(&c), 0.5);
    }

    #[test]
    fn test_missing_reactant_gives_zero_multiplier() {
        let reaction = Reaction::parse(1, "NO2 + SO2 + H2O -> NO + H2SO4").unwrap();
        let c = ConcentrationVector::from_pairs([(NO2, 1.0), (H2O, 1.0)]).unwrap();
        assert_eq!(reaction.multiplier(&c), 0.0);
    }

    #[test]
    fn test_apply() {
        let reaction = Reaction::parse(2, "2 NO + O2 -> 2 NO2").unwrap();
        let mut c = ConcentrationVector::from_pairs([(NO, 4.0), (O2, 3.0)]).unwrap();
        let m = reaction.multiplier(&c);
        reaction.apply(&mut c, m);
        assert_relative_eq!(c.get(NO), 0.0);
        assert_relative_eq!(c.get(O2), 1.0);
        assert_relative_eq!(c.get(NO2), 4.0);
    }

    #[test]
    fn test_element_balance() {
        let balanced = Reaction::parse(6, "8 H2S + 4 O2 -> 8 H2O + S8").unwrap();
        assert!(balanced.element_balance().unwrap().is_empty());
        let unbalanced = Reaction::parse(9, "NO + O2 -> NO2").unwrap();
        let net = unbalanced.element_balance().unwrap();
        assert_eq!(net.get("O"), Some(&-1));
        assert_eq!(net.get("N"), None);
    }
}
