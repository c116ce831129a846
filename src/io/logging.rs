use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter (`debug`, `tend=trace`, ...)
pub const LOG_ENV: &str = "TEND_LOG";

/// Where log lines go. The TUI owns the terminal, so it logs to a file.
pub enum LogTarget<'a> {
    File(&'a Path),
    Stderr,
}

/// Install the global subscriber. Logging is opt-in: with `TEND_LOG` unset
/// or invalid nothing is installed.
pub fn init(target: LogTarget<'_>) -> std::io::Result<()> {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return Ok(());
    };

    match target {
        LogTarget::File(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .try_init();
        }
        LogTarget::Stderr => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init();
        }
    }
    Ok(())
}
