use super::cli_examples::examples_menu;
use super::cli_task::print_corrosion;
use crate::Corrosion::corrosion_calc::corrosion_rates_from_concentrations;
use crate::Kinetics::reaction_solver::ReactionSolver;
use crate::Kinetics::reaction_table::ReactionTable;
use crate::grid_sweep::GridSweep;
use crate::settings::Settings;
use log::error;
use std::io::{self, Write};

pub fn run_interactive_menu(settings: &Settings) {
    let table = match ReactionTable::co2_impurities() {
        Ok(table) => table,
        Err(e) => return error!("{}", e),
    };
    loop {
        show_main_menu();
        let Some(choice) = get_user_input() else {
            break;
        };

        match choice.trim() {
            "1" => run_default_model(&table, settings),
            "2" => run_default_corrosion(&table, settings),
            "3" => run_default_grid(&table, settings),
            "4" => table.pretty_table().printstd(),
            "5" => examples_menu(),
            "0" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
/* colors
Blue (\x1b[34m) - Welcome header text

Yellow (\x1b[33m) - Menu options

Cyan (\x1b[36m) - "Enter your choice:" prompt

Reset (\x1b[0m) - Returns to normal color after each colored section
*/
fn show_main_menu() {
    println!(
        "\x1b[34m\n Welcome to CO2Spec: impurity reactions and acid corrosion\n
    in dense phase CO₂ pipelines \n \x1b[0m"
    );
    println!("\x1b[33m1. Run model with default inputs\x1b[0m");
    println!("\x1b[33m2. Corrosion rates for default pipe\x1b[0m");
    println!("\x1b[33m3. Grid sweep\x1b[0m");
    println!("\x1b[33m4. Show reaction table\x1b[0m");
    println!("\x1b[33m5. Examples\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
    print!("\x1b[36mEnter your choice: \x1b[0m");
    let _ = io::stdout().flush();
}

/// None on end of input or a read error
pub(crate) fn get_user_input() -> Option<String> {
    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) => None,
        Ok(_) => Some(input),
        Err(e) => {
            error!("Failed to read input: {}", e);
            None
        }
    }
}

fn run_default_model(table: &ReactionTable, settings: &Settings) {
    println!("initial state: {}", settings.default_inputs);
    match ReactionSolver::new(table, settings.solver).solve(&settings.default_inputs) {
        Ok(result) => {
            result.pretty_print_trace();
            result.summary_table().printstd();
        }
        Err(e) => error!("{}", e),
    }
}

fn run_default_corrosion(table: &ReactionTable, settings: &Settings) {
    let solver = ReactionSolver::new(table, settings.solver.without_trace());
    let result = match solver.solve(&settings.default_inputs) {
        Ok(result) => result,
        Err(e) => return error!("{}", e),
    };
    let pipe = &settings.pipe;
    match corrosion_rates_from_concentrations(&pipe.geometry(), pipe.flowrate, &result.final_) {
        Ok(rates) => print_corrosion(pipe, &rates),
        Err(e) => error!("{}", e),
    }
}

fn run_default_grid(table: &ReactionTable, settings: &Settings) {
    let sweep = GridSweep::new(settings.grid, settings.default_inputs);
    match sweep.run(table, settings.solver) {
        Ok(grid) => grid.pretty_table().printstd(),
        Err(e) => error!("{}", e),
    }
}
