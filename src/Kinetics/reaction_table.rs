//! # Reaction table
//!
//! Ordered, immutable set of reactions the solver works with. Position in the
//! table is priority: when several reactions can proceed, the one closer to the
//! top wins. The table is built once (from code, from a [`ReactionTableConfig`]
//! or from the `REACTIONS` section of a task file) and only read afterwards, so
//! one instance can be shared by any number of concurrent solves.
//!
//! ## Default catalogue
//! | idx | equation | active |
//! |---|---|---|
//! | 1 | NO2 + SO2 + H2O -> NO + H2SO4 | yes |
//! | 2 | 2 NO + O2 -> 2 NO2 | yes |
//! | 3 | H2S + 3 NO2 -> SO2 + H2O + 3 NO | yes |
//! | 4 | 3 NO2 + H2O -> 2 HNO3 + NO | yes |
//! | 5 | 2 NO2 + H2O -> HNO3 + HNO2 | no |
//! | 6 | 8 H2S + 4 O2 -> 8 H2O + S8 | yes |
//!
//! scanned in the order [3, 2, 1, 4, 6]: H2S is consumed first, then NO is
//! recombined with O2, then the acids form.
use log::{info, warn};
use nalgebra::DMatrix;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::Kinetics::molecules::Molecule;
use crate::Kinetics::molmass::create_elem_composition_matrix;
use crate::Kinetics::reaction::{Reaction, ReactionError};
use crate::Utils::load_from_file::load_reaction_table_from_file;

/// catalogue of impurity reactions in CO2 streams: (index, equation, active)
pub const CO2_IMPURITY_REACTIONS: [(usize, &str, bool); 6] = [
    (1, "NO2 + SO2 + H2O -> NO + H2SO4", true),
    (2, "2 NO + O2 -> 2 NO2", true),
    (3, "H2S + 3 NO2 -> SO2 + H2O + 3 NO", true),
    (4, "3 NO2 + H2O -> 2 HNO3 + NO", true),
    (5, "2 NO2 + H2O -> HNO3 + HNO2", false),
    (6, "8 H2S + 4 O2 -> 8 H2O + S8", true),
];

/// priority order of the catalogue, by reaction index
pub const DEFAULT_SCAN_ORDER: [usize; 5] = [3, 2, 1, 4, 6];

fn default_active() -> bool {
    true
}

/// serialized form of one reaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionConfig {
    pub index: usize,
    pub eq: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Serialized form of a reaction table.
/// ```json
/// { "scan_order": [3, 2, 1, 4, 6],
///   "reactions": [ {"index": 1, "eq": "NO2 + SO2 + H2O -> NO + H2SO4"} ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionTableConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_order: Option<Vec<usize>>,
    pub reactions: Vec<ReactionConfig>,
}

/// reaction whose coefficients do not conserve an element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementImbalance {
    pub reaction_index: usize,
    pub element: String,
    /// atoms produced minus atoms consumed
    pub net_atoms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReactionTable {
    reactions: Vec<Reaction>,
}

impl ReactionTable {
    /// Table with the given priority order. Fails on an empty list or on
    /// duplicate reaction indices.
    pub fn new(reactions: Vec<Reaction>) -> Result<Self, ReactionError> {
        if reactions.is_empty() {
            return Err(ReactionError::EmptyTable);
        }
        let mut seen = HashSet::new();
        for r in &reactions {
            if !seen.insert(r.index()) {
                return Err(ReactionError::DuplicateIndex(r.index()));
            }
        }
        Ok(Self { reactions })
    }

    /// the default catalogue in [`DEFAULT_SCAN_ORDER`], reaction 5 inactive
    pub fn co2_impurities() -> Result<Self, ReactionError> {
        let reactions = CO2_IMPURITY_REACTIONS
            .iter()
            .map(|&(index, eq, active)| Reaction::parse(index, eq).map(|r| r.with_active(active)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(reactions)?.with_scan_order(&DEFAULT_SCAN_ORDER)
    }

    /// Reorders the table so the listed indices come first, in the given order.
    /// Reactions not listed keep their relative order behind them.
    pub fn with_scan_order(self, order: &[usize]) -> Result<Self, ReactionError> {
        let mut seen = HashSet::new();
        for &index in order {
            if !seen.insert(index) {
                return Err(ReactionError::DuplicateIndex(index));
            }
            if self.get(index).is_none() {
                return Err(ReactionError::UnknownIndex(index));
            }
        }
        let (mut listed, rest): (Vec<Reaction>, Vec<Reaction>) = self
            .reactions
            .into_iter()
            .partition(|r| seen.contains(&r.index()));
        listed.sort_by_key(|r| order.iter().position(|&i| i == r.index()));
        listed.extend(rest);
        Ok(Self { reactions: listed })
    }

    /// copy of the table with one reaction switched on or off
    pub fn with_active(self, index: usize, active: bool) -> Result<Self, ReactionError> {
        if self.get(index).is_none() {
            return Err(ReactionError::UnknownIndex(index));
        }
        let reactions = self
            .reactions
            .into_iter()
            .map(|r| if r.index() == index { r.with_active(active) } else { r })
            .collect();
        Ok(Self { reactions })
    }

    pub fn from_config(config: &ReactionTableConfig) -> Result<Self, ReactionError> {
        let reactions = config
            .reactions
            .iter()
            .map(|rc| Reaction::parse(rc.index, &rc.eq).map(|r| r.with_active(rc.active)))
            .collect::<Result<Vec<_>, _>>()?;
        let mut table = Self::new(reactions)?;
        if let Some(order) = &config.scan_order {
            table = table.with_scan_order(order)?;
        }
        for imbalance in table.element_imbalances()? {
            warn!(
                "reaction {} does not conserve {}: net {} atoms",
                imbalance.reaction_index, imbalance.element, imbalance.net_atoms
            );
        }
        info!(
            "reaction table loaded: {} reactions, {} active, scan order {:?}",
            table.len(),
            table.active().count(),
            table.scan_order()
        );
        Ok(table)
    }

    /// config in current priority order; reloading it gives an equal table
    pub fn to_config(&self) -> ReactionTableConfig {
        ReactionTableConfig {
            scan_order: None,
            reactions: self
                .reactions
                .iter()
                .map(|r| ReactionConfig {
                    index: r.index(),
                    eq: r.equation(),
                    active: r.is_active(),
                })
                .collect(),
        }
    }

    /// reads the `REACTIONS` section of a task file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReactionError> {
        let config = load_reaction_table_from_file(path.as_ref()).map_err(ReactionError::Load)?;
        Self::from_config(&config)
    }

    pub fn get(&self, index: usize) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.index() == index)
    }
    /// all reactions in priority order
    pub fn iter(&self) -> impl Iterator<Item = &Reaction> {
        self.reactions.iter()
    }
    /// active reactions in priority order
    pub fn active(&self) -> impl Iterator<Item = &Reaction> {
        self.reactions.iter().filter(|r| r.is_active())
    }
    pub fn len(&self) -> usize {
        self.reactions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }
    /// indices of active reactions in priority order
    pub fn scan_order(&self) -> Vec<usize> {
        self.active().map(|r| r.index()).collect()
    }

    /// net stoichiometric coefficients, one row per reaction (priority order),
    /// one column per molecule (order of [`Molecule::ALL`])
    pub fn stoichiometric_matrix(&self) -> DMatrix<f64> {
        let mut matrix = DMatrix::zeros(self.reactions.len(), Molecule::COUNT);
        for (i, r) in self.reactions.iter().enumerate() {
            for t in r.lhs() {
                matrix[(i, t.molecule.position())] -= t.coefficient as f64;
            }
            for t in r.rhs() {
                matrix[(i, t.molecule.position())] += t.coefficient as f64;
            }
        }
        matrix
    }

    /// Element conservation check: stoichiometric matrix times atomic composition
    /// matrix must vanish. Inactive reactions are checked too.
    pub fn element_imbalances(&self) -> Result<Vec<ElementImbalance>, ReactionError> {
        let formulae: Vec<&str> = Molecule::ALL.iter().map(|m| m.formula()).collect();
        let (composition, elements) = create_elem_composition_matrix(&formulae)?;
        let net = self.stoichiometric_matrix() * composition;
        let mut imbalances = Vec::new();
        for (i, r) in self.reactions.iter().enumerate() {
            for (j, element) in elements.iter().enumerate() {
                let atoms = net[(i, j)];
                if atoms.abs() > 1e-9 {
                    imbalances.push(ElementImbalance {
                        reaction_index: r.index(),
                        element: element.clone(),
                        net_atoms: atoms,
                    });
                }
            }
        }
        Ok(imbalances)
    }

    pub fn pretty_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("priority"),
            Cell::new("reaction"),
            Cell::new("equation"),
            Cell::new("active"),
        ]));
        for (priority, r) in self.reactions.iter().enumerate() {
            table.add_row(Row::new(vec![
                Cell::new(&(priority + 1).to_string()),
                Cell::new(&r.index().to_string()),
                Cell::new(&r.to_string()),
                Cell::new(if r.is_active() { "yes" } else { "no" }),
            ]));
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kinetics::molecules::Molecule::*;
    use crate::Kinetics::reaction::Term;

    #[test]
    fn test_default_table_order() {
        let table = ReactionTable::co2_impurities().unwrap();
        let order: Vec<usize> = table.iter().map(|r| r.index()).collect();
        assert_eq!(order, vec![3, 2, 1, 4, 6, 5]);
        assert_eq!(table.scan_order(), DEFAULT_SCAN_ORDER.to_vec());
        assert!(!table.get(5).unwrap().is_active());
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn test_default_table_conserves_elements() {
        let table = ReactionTable::co2_impurities().unwrap();
        assert!(table.element_imbalances().unwrap().is_empty());
        for r in table.iter() {
            assert!(r.element_balance().unwrap().is_empty(), "reaction {}", r.index());
        }
    }

    #[test]
    fn test_imbalance_is_reported() {
        let r = Reaction::new(7, vec![Term::new(1, NO), Term::new(1, O2)], vec![Term::new(1, NO2)], true)
            .unwrap();
        let table = ReactionTable::new(vec![r]).unwrap();
        let imbalances = table.element_imbalances().unwrap();
        assert_eq!(imbalances.len(), 1);
        assert_eq!(imbalances[0].reaction_index, 7);
        assert_eq!(imbalances[0].element, "O");
        assert_eq!(imbalances[0].net_atoms, -1.0);
    }

    #[test]
    fn test_validation() {
        assert_eq!(ReactionTable::new(vec![]), Err(ReactionError::EmptyTable));
        let a = Reaction::parse(1, "2 NO + O2 -> 2 NO2").unwrap();
        assert_eq!(
            ReactionTable::new(vec![a.clone(), a.clone()]),
            Err(ReactionError::DuplicateIndex(1))
        );
        let table = ReactionTable::new(vec![a]).unwrap();
        assert_eq!(
            table.clone().with_scan_order(&[2]),
            Err(ReactionError::UnknownIndex(2))
        );
        assert_eq!(table.with_active(9, true), Err(ReactionError::UnknownIndex(9)));
    }

    #[test]
    fn test_with_active_enables_reaction_5() {
        let table = ReactionTable::co2_impurities()
            .unwrap()
            .with_active(5, true)
            .unwrap();
        assert_eq!(table.scan_order(), vec![3, 2, 1, 4, 6, 5]);
    }

    #[test]
    fn test_config_roundtrip() {
        let table = ReactionTable::co2_impurities().unwrap();
        let json = serde_json::to_string(&table.to_config()).unwrap();
        let config: ReactionTableConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(ReactionTable::from_config(&config).unwrap(), table);
    }

    #[test]
    fn test_config_with_scan_order_and_default_active() {
        let json = r#"{
            "scan_order": [2, 1],
            "reactions": [
                {"index": 1, "eq": "NO2 + SO2 + H2O -> NO + H2SO4"},
                {"index": 2, "eq": "2 NO + O2 -> 2 NO2", "active": false}
            ]
        }"#;
        let config: ReactionTableConfig = serde_json::from_str(json).unwrap();
        let table = ReactionTable::from_config(&config).unwrap();
        let order: Vec<usize> = table.iter().map(|r| r.index()).collect();
        assert_eq!(order, vec![2, 1]);
        assert_eq!(table.scan_order(), vec![1]);
    }

    #[test]
    fn test_stoichiometric_matrix() {
        let table = ReactionTable::co2_impurities().unwrap();
        let s = table.stoichiometric_matrix();
        assert_eq!(s.nrows(), 6);
        assert_eq!(s.ncols(), Molecule::COUNT);
        // first row is reaction 3
        assert_eq!(s[(0, H2S.position())], -1.0);
        assert_eq!(s[(0, NO2.position())], -3.0);
        assert_eq!(s[(0, NO.position())], 3.0);
    }

    #[test]
    fn test_table_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReactionTable>();
    }
}
