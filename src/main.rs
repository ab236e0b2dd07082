use CO2Spec::Utils::logger::{init_logger, level_from_str};
use CO2Spec::cli::cli_main::run_interactive_menu;
use CO2Spec::cli::cli_task::run_task_file;
use CO2Spec::settings::{DEFAULT_CONFIG_FILE, Settings};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "CO2Spec")]
#[command(about = "Impurity reactions and acid corrosion in dense phase CO2 pipelines", long_about = None)]
struct Cli {
    /// Task file with REACTIONS / CONCENTRATIONS / PIPE sections; interactive menu when omitted
    task: Option<PathBuf>,

    /// Write the task report as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Settings file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log: String,

    /// Also log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

pub fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logger(level_from_str(&cli.log), cli.log_file.as_deref()) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    let settings = Settings::load_or_default(&cli.config);

    match cli.task {
        Some(task) => match run_task_file(&task, &settings, cli.json.as_deref()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        },
        None => {
            run_interactive_menu(&settings);
            ExitCode::SUCCESS
        }
    }
}
