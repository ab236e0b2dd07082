use super::cli_main::get_user_input;
use crate::Examples::reaction_examples::reaction_examples;
use std::io::{self, Write};

pub fn examples_menu() {
    loop {
        println!("\n=== Examples ===");
        println!("1. Molar masses and element balance");
        println!("2. Excess oxygen (all acids formed)");
        println!("3. Excess H2S (SO2 and NO left)");
        println!("4. Custom priority order");
        println!("5. Grid sweep NO2 x O2");
        println!("0. Back to main menu");
        print!("Enter your choice: ");
        let _ = io::stdout().flush();

        let Some(choice) = get_user_input() else {
            break;
        };
        match choice.trim() {
            "1" => reaction_examples(0),
            "2" => reaction_examples(1),
            "3" => reaction_examples(2),
            "4" => reaction_examples(3),
            "5" => reaction_examples(4),
            "0" => break,
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
