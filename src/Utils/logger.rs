use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;
use std::path::Path;

/// Terminal logger, plus a file logger when `log_file` is given.
/// Calling it a second time is harmless: the first installed logger stays.
pub fn init_logger(level: LevelFilter, log_file: Option<&Path>) -> Result<(), String> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        let file = File::create(path)
            .map_err(|e| format!("cannot create log file {}: {}", path.display(), e))?;
        let file_config = ConfigBuilder::new().set_time_format_rfc3339().build();
        loggers.push(WriteLogger::new(LevelFilter::Debug, file_config, file));
    }
    // already initialized
    let _ = CombinedLogger::init(loggers);
    Ok(())
}

/// level from the RUST_LOG-like strings "error", "warn", "info", "debug", "trace"
pub fn level_from_str(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_level_from_str() {
        assert_eq!(level_from_str("debug"), LevelFilter::Debug);
        assert_eq!(level_from_str(" WARN "), LevelFilter::Warn);
        assert_eq!(level_from_str("nonsense"), LevelFilter::Info);
    }

    #[test]
    fn test_init_twice() {
        let file = NamedTempFile::new().unwrap();
        assert!(init_logger(LevelFilter::Info, Some(file.path())).is_ok());
        assert!(init_logger(LevelFilter::Info, None).is_ok());
        assert!(init_logger(LevelFilter::Info, Some(Path::new("/no/such/dir/x.log"))).is_err());
    }
}
