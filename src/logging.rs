use anyhow::{Context, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

//file name of the execution log inside a run directory
pub const LOG_FILE_NAME: &str = "script_execution.log";

//timestamp naming a run directory and its report ("2024-09-25_14-03-59")
pub fn execution_timestamp() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

//logging context of one orchestration run
//owns the run directory, the execution log inside it is mirrored to stdout
#[derive(Debug, Clone)]
pub struct RunLog {
    pub execution_time: String,
    pub directory: PathBuf,
    pub log_file: PathBuf,
}

impl RunLog {
    //creates <root>/<execution_time>/
    pub fn create(root: &Path, execution_time: &str) -> Result<Self> {
        let directory = root.join(execution_time);
        std::fs::create_dir_all(&directory)
            .with_context(|| format!("Failed to create log directory {:?}", directory))?;

        Ok(RunLog {
            execution_time: execution_time.to_string(),
            log_file: directory.join(LOG_FILE_NAME),
            directory,
        })
    }

    //installs a subscriber for the current thread until the guard is dropped
    pub fn install(&self, level: &str) -> Result<DefaultGuard> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .with_context(|| format!("Failed to open log file {:?}", self.log_file))?;

        let subscriber = tracing_subscriber::registry()
            .with(filter(level))
            .with(fmt::layer().with_target(false).with_writer(std::io::stdout))
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            );

        Ok(tracing::subscriber::set_default(subscriber))
    }

    //path of a file inside the run directory
    pub fn file(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }
}

//console-only logging for commands that do not own a run directory
//returns false when a global subscriber was already installed, which then keeps logging
pub fn init_console(level: &str) -> bool {
    match tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter(level))
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("console logging not installed: {}", e);
            false
        }
    }
}
