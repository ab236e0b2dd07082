use log::error;

use crate::Corrosion::corrosion_calc::{PipeInputs, corrosion_rates_from_concentrations};
use crate::Kinetics::molecules::{ConcentrationVector, Molecule};
use crate::Kinetics::reaction_solver::{ReactionSolver, solve};
use crate::Kinetics::reaction_table::ReactionTable;
use crate::grid_sweep::{GridAxis, GridSelection, GridSweep};
use crate::settings::SolverSettings;

fn scenario(pairs: &[(Molecule, f64)]) -> Option<ConcentrationVector> {
    match ConcentrationVector::from_pairs(pairs.iter().copied()) {
        Ok(c) => Some(c),
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

fn solve_and_print(initial: &ConcentrationVector, pipe: &PipeInputs) {
    let table = match ReactionTable::co2_impurities() {
        Ok(table) => table,
        Err(e) => return error!("{}", e),
    };
    let result = match solve(initial, &table) {
        Ok(result) => result,
        Err(e) => return error!("{}", e),
    };
    result.pretty_print_trace();
    result.summary_table().printstd();
    match corrosion_rates_from_concentrations(&pipe.geometry(), pipe.flowrate, &result.final_) {
        Ok(rates) => println!(
            "corrosion rate: H2SO4 {:.3} mm/y, HNO3 {:.3} mm/y, total {:.3} mm/y",
            rates.h2so4_mm_yr, rates.hno3_mm_yr, rates.total_mm_yr
        ),
        Err(e) => error!("{}", e),
    }
}

pub fn reaction_examples(task: usize) {
    match task {
        0 => {
            // atomic composition, molar masses and element balance of the catalogue
            use crate::Kinetics::molmass::{calculate_molar_mass, create_elem_composition_matrix};
            for m in Molecule::ALL {
                match calculate_molar_mass(m.formula()) {
                    Ok((mass, composition)) => {
                        println!("{}: {:.3} g/mol, {:?}", m.display_text(), mass, composition)
                    }
                    Err(e) => error!("{}", e),
                }
            }
            let formulae: Vec<&str> = Molecule::ALL.iter().map(|m| m.formula()).collect();
            if let Ok((matrix, elements)) = create_elem_composition_matrix(&formulae) {
                println!("elements: {:?}", elements);
                println!("{}", matrix);
            }
            if let Ok(table) = ReactionTable::co2_impurities() {
                table.pretty_table().printstd();
                println!("stoichiometric matrix {}", table.stoichiometric_matrix());
                match table.element_imbalances() {
                    Ok(imbalances) if imbalances.is_empty() => println!("all reactions are balanced"),
                    Ok(imbalances) => println!("imbalances: {:?}", imbalances),
                    Err(e) => error!("{}", e),
                }
            }
        }
        1 => {
            // excess oxygen: all H2S ends up as sulphuric acid, all NO2 as nitric acid
            use Molecule::*;
            if let Some(initial) = scenario(&[(H2O, 40.0), (O2, 15.0), (NO2, 15.0), (H2S, 3.0)]) {
                solve_and_print(&initial, &PipeInputs::default());
            }
        }
        2 => {
            // H2S in excess of oxygen: SO2 and NO remain, no acids
            use Molecule::*;
            if let Some(initial) = scenario(&[(H2O, 20.0), (O2, 5.0), (NO2, 8.0), (H2S, 7.0)]) {
                solve_and_print(&initial, &PipeInputs::default());
            }
        }
        3 => {
            // custom priority and the optional second nitric acid route
            use Molecule::*;
            let table = ReactionTable::co2_impurities()
                .and_then(|t| t.with_scan_order(&[2, 1, 3, 5, 4, 6]))
                .and_then(|t| t.with_active(5, true));
            let table = match table {
                Ok(table) => table,
                Err(e) => return error!("{}", e),
            };
            table.pretty_table().printstd();
            let Some(initial) = scenario(&[(H2O, 30.0), (O2, 30.0), (SO2, 10.0), (NO2, 20.0)]) else {
                return;
            };
            let settings = SolverSettings {
                epsilon: 1e-4,
                ..SolverSettings::default()
            };
            match ReactionSolver::new(&table, settings).solve(&initial) {
                Ok(result) => {
                    println!("steps: {}", result.steps);
                    result.summary_table().printstd();
                }
                Err(e) => error!("{}", e),
            }
        }
        4 => {
            // H2SO4 formed as a function of NO2 (rows) and O2 (columns)
            use Molecule::*;
            let Some(base) = scenario(&[(H2O, 30.0), (SO2, 10.0)]) else {
                return;
            };
            let table = match ReactionTable::co2_impurities() {
                Ok(table) => table,
                Err(e) => return error!("{}", e),
            };
            let mut sweep = GridSweep::new(GridSelection::default(), base);
            sweep.rows = GridAxis::new(1.0, 10.0, 1.0);
            sweep.columns = GridAxis::new(1.0, 10.0, 1.0);
            match sweep.run(&table, SolverSettings::default()) {
                Ok(grid) => {
                    grid.pretty_table().printstd();
                    if let Ok(corrosion) = grid.corrosion_grid(&PipeInputs::default()) {
                        let worst = corrosion.iter().flatten().cloned().fold(0.0, f64::max);
                        println!("highest corrosion rate on the grid: {:.3} mm/y", worst);
                    }
                }
                Err(e) => error!("{}", e),
            }
        }
        _ => {
            println!("no example with number {}", task);
        }
    }
}
