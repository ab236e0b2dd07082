use log::debug;
use nalgebra::DMatrix;
use regex::Regex;
/// Module to calculate the atomic composition and molar mass of a chemical formula
///
///
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use thiserror::Error;

use crate::Kinetics::molecules::Molecule;

// Define a struct to hold element data
pub struct Element {
    name: &'static str,
    atomic_mass: f64,
}

// elements that can show up in pipeline impurities, plus a few common ones
const ELEMENTS: &[Element] = &[
    Element {
        name: "H",
        atomic_mass: 1.008,
    },
    Element {
        name: "He",
        atomic_mass: 4.0026,
    },
    Element {
        name: "C",
        atomic_mass: 12.011,
    },
    Element {
        name: "N",
        atomic_mass: 14.007,
    },
    Element {
        name: "O",
        atomic_mass: 15.999,
    },
    Element {
        name: "F",
        atomic_mass: 18.998,
    },
    Element {
        name: "Na",
        atomic_mass: 22.99,
    },
    Element {
        name: "Mg",
        atomic_mass: 24.305,
    },
    Element {
        name: "Al",
        atomic_mass: 26.98,
    },
    Element {
        name: "Si",
        atomic_mass: 28.085,
    },
    Element {
        name: "P",
        atomic_mass: 30.974,
    },
    Element {
        name: "S",
        atomic_mass: 32.065,
    },
    Element {
        name: "Cl",
        atomic_mass: 35.45,
    },
    Element {
        name: "Ar",
        atomic_mass: 39.948,
    },
    Element {
        name: "K",
        atomic_mass: 39.102,
    },
    Element {
        name: "Ca",
        atomic_mass: 40.08,
    },
    Element {
        name: "Cr",
        atomic_mass: 51.9961,
    },
    Element {
        name: "Mn",
        atomic_mass: 54.938,
    },
    Element {
        name: "Fe",
        atomic_mass: 55.845,
    },
    Element {
        name: "Ni",
        atomic_mass: 58.69,
    },
    Element {
        name: "Cu",
        atomic_mass: 63.546,
    },
    Element {
        name: "Zn",
        atomic_mass: 65.38,
    },
];

static FORMULA_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z][a-z]?)(\d*)|(\()|(\))(\d*)").expect("formula token regex is valid")
});

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("empty formula")]
    Empty,
    #[error("unexpected character '{character}' at position {position} in formula '{formula}'")]
    UnexpectedCharacter {
        formula: String,
        character: char,
        position: usize,
    },
    #[error("unknown element '{element}' in formula '{formula}'")]
    UnknownElement { formula: String, element: String },
    #[error("unbalanced brackets in formula '{0}'")]
    UnbalancedBrackets(String),
}

fn filter_phases_marks(formula: &str) -> String {
    let mut formula = formula.to_string();
    let phases = ["(C)", "(c)", "(L)", "(l)", "(G)", "(g)", "(S)", "(s)"];
    for phase in phases {
        formula = formula.replace(phase, "");
    }
    formula
}

fn stoichio(digits: Option<regex::Match<'_>>) -> usize {
    digits
        .map(|d| d.as_str())
        .filter(|d| !d.is_empty())
        .and_then(|d| d.parse().ok())
        .unwrap_or(1)
}

/// Parses a chemical formula into element counts, e.g. "Ca(NO3)2" -> {Ca:1, N:2, O:6}.
/// Phase marks like "(g)" are ignored, brackets may be nested.
pub fn parse_formula(formula: &str) -> Result<BTreeMap<String, usize>, FormulaError> {
    let cleaned: String = filter_phases_marks(formula)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(FormulaError::Empty);
    }
    // one map per open bracket level
    let mut stack: Vec<BTreeMap<String, usize>> = vec![BTreeMap::new()];
    let mut expected_start = 0;
    for cap in FORMULA_TOKEN.captures_iter(&cleaned) {
        let whole = cap.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        if whole.0 != expected_start {
            let character = cleaned[expected_start..].chars().next().unwrap_or(' ');
            return Err(FormulaError::UnexpectedCharacter {
                formula: formula.to_string(),
                character,
                position: expected_start,
            });
        }
        expected_start = whole.1;

        if let Some(element) = cap.get(1) {
            let element = element.as_str();
            if !ELEMENTS.iter().any(|e| e.name == element) {
                return Err(FormulaError::UnknownElement {
                    formula: formula.to_string(),
                    element: element.to_string(),
                });
            }
            let count = stoichio(cap.get(2));
            if let Some(level) = stack.last_mut() {
                *level.entry(element.to_string()).or_insert(0) += count;
            }
        } else if cap.get(3).is_some() {
            stack.push(BTreeMap::new());
        } else if cap.get(4).is_some() {
            let multiplier = stoichio(cap.get(5));
            let group = stack
                .pop()
                .ok_or_else(|| FormulaError::UnbalancedBrackets(formula.to_string()))?;
            let outer = stack
                .last_mut()
                .ok_or_else(|| FormulaError::UnbalancedBrackets(formula.to_string()))?;
            for (element, count) in group {
                *outer.entry(element).or_insert(0) += count * multiplier;
            }
        }
    }
    if expected_start != cleaned.len() {
        let character = cleaned[expected_start..].chars().next().unwrap_or(' ');
        return Err(FormulaError::UnexpectedCharacter {
            formula: formula.to_string(),
            character,
            position: expected_start,
        });
    }
    if stack.len() != 1 {
        return Err(FormulaError::UnbalancedBrackets(formula.to_string()));
    }
    let counts = stack.pop().unwrap_or_default();
    debug!("parsed formula {} into {:?}", formula, counts);
    Ok(counts)
}

// Function to calculate the molar mass of a substance given its chemical formula
pub fn calculate_molar_mass(
    formula: &str,
) -> Result<(f64, BTreeMap<String, usize>), FormulaError> {
    let counts = parse_formula(formula)?;
    let mut molar_mass = 0.0;
    for (element, count) in counts.iter() {
        if let Some(e) = ELEMENTS.iter().find(|e| e.name == element) {
            molar_mass += e.atomic_mass * *count as f64;
        }
    }
    Ok((molar_mass, counts))
}

// Function to calculate the molar mass of a vector of chemical formulas
pub fn calculate_molar_mass_of_vector_of_subs(
    vec_of_formulae: &[&str],
) -> Result<Vec<f64>, FormulaError> {
    vec_of_formulae
        .iter()
        .map(|formula| calculate_molar_mass(formula).map(|(mass, _)| mass))
        .collect()
}

/// atomic composition of a tracked molecule
pub fn molecule_composition(molecule: Molecule) -> Result<BTreeMap<String, usize>, FormulaError> {
    parse_formula(molecule.formula())
}

/// molar mass of a tracked molecule, g/mol
pub fn molecule_molar_mass(molecule: Molecule) -> Result<f64, FormulaError> {
    calculate_molar_mass(molecule.formula()).map(|(mass, _)| mass)
}

/// Matrix of atomic composition: one row per formula, one column per element.
/// Elements are returned in alphabetical order.
pub fn create_elem_composition_matrix(
    vec_of_formulae: &[&str],
) -> Result<(DMatrix<f64>, Vec<String>), FormulaError> {
    let mut elements: BTreeSet<String> = BTreeSet::new();
    let mut vec_of_compositions = Vec::with_capacity(vec_of_formulae.len());
    for formula in vec_of_formulae.iter() {
        let counts = parse_formula(formula)?;
        elements.extend(counts.keys().cloned());
        vec_of_compositions.push(counts);
    }
    let elements: Vec<String> = elements.into_iter().collect();
    let mut matrix = DMatrix::zeros(vec_of_formulae.len(), elements.len());
    for (substance_i, composition) in vec_of_compositions.iter().enumerate() {
        for (j, element_j) in elements.iter().enumerate() {
            if let Some(count) = composition.get(element_j) {
                matrix[(substance_i, j)] = *count as f64;
            }
        }
    }
    Ok((matrix, elements))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(e, n)| (e.to_string(), *n)).collect()
    }

    #[test]
    fn test_parse_formula() {
        assert_eq!(
            parse_formula("C6H8O6").unwrap(),
            counts(&[("C", 6), ("H", 8), ("O", 6)])
        );
        assert_eq!(
            parse_formula("Na(NO3)2").unwrap(),
            counts(&[("Na", 1), ("N", 2), ("O", 6)])
        );
        assert_eq!(parse_formula("H2O").unwrap(), counts(&[("H", 2), ("O", 1)]));
        assert_eq!(
            parse_formula("C5H6OOH").unwrap(),
            counts(&[("C", 5), ("H", 7), ("O", 2)])
        );
        assert_eq!(parse_formula("S8").unwrap(), counts(&[("S", 8)]));
        assert_eq!(
            parse_formula("H2SO4(g)").unwrap(),
            counts(&[("H", 2), ("S", 1), ("O", 4)])
        );
    }

    #[test]
    fn test_parse_formula_errors() {
        assert_eq!(parse_formula(""), Err(FormulaError::Empty));
        assert!(matches!(
            parse_formula("Xx2"),
            Err(FormulaError::UnknownElement { .. })
        ));
        assert!(matches!(
            parse_formula("H2-O"),
            Err(FormulaError::UnexpectedCharacter { character: '-', .. })
        ));
        assert!(matches!(
            parse_formula("Ca(NO3"),
            Err(FormulaError::UnbalancedBrackets(_))
        ));
    }

    #[test]
    fn test_calculate_molar_mass() {
        let (molar_mass, _) = calculate_molar_mass("H2O(g)").unwrap();
        assert!((molar_mass - 18.01528).abs() < 1e-2);

        let (molar_mass, _) = calculate_molar_mass("Ca(NO3)2").unwrap();
        assert!((molar_mass - 164.093).abs() < 1e-2);
    }

    #[test]
    fn test_tracked_molecules_molar_masses() {
        // the corrosion model uses rounded conventional weights
        assert!((molecule_molar_mass(Molecule::H2SO4).unwrap() - 98.0).abs() < 0.2);
        assert!((molecule_molar_mass(Molecule::HNO3).unwrap() - 63.01).abs() < 0.05);
        for m in Molecule::ALL {
            assert!(molecule_molar_mass(m).unwrap() > 0.0);
        }
    }

    #[test]
    fn test_calculate_molar_mass_of_vector_of_substances() {
        let masses = calculate_molar_mass_of_vector_of_subs(&["H2O", "NaCl", "C6H8O6"]).unwrap();
        let expected = [18.01528, 58.44316, 176.12];
        for (m, e) in masses.iter().zip(expected.iter()) {
            assert!((m - e).abs() < 1e-2);
        }
    }

    #[test]
    fn test_element_matrix() {
        let (matrix, elements) =
            create_elem_composition_matrix(&["H2O", "NaCl", "C3H8", "CH4"]).unwrap();
        assert_eq!(elements, vec!["C", "Cl", "H", "Na", "O"]);
        assert_eq!(matrix.nrows(), 4);
        assert_eq!(matrix.ncols(), 5);
        assert_eq!(matrix[(2, 0)], 3.0);
        assert_eq!(matrix[(2, 2)], 8.0);
    }
}
