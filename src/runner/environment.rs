use crate::config::EngineSettings;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("Backtest engine '{0}' not found. Activate the engine's environment or set engine.program")]
    EngineNotFound(String),
}

//finds an executable the way the shell would: explicit paths are checked as-is,
//bare names are searched for on PATH
pub fn locate_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|path| path.is_file())
}

//checked once at startup, a missing engine is the only fatal condition
pub fn check_environment(settings: &EngineSettings) -> Result<PathBuf, EnvironmentError> {
    match std::env::var_os("VIRTUAL_ENV") {
        Some(venv) => info!("Virtual environment is activated: {}", venv.to_string_lossy()),
        None => warn!("No virtual environment is activated"),
    }

    let program = locate_program(&settings.program)
        .ok_or_else(|| EnvironmentError::EngineNotFound(settings.program.clone()))?;
    info!("Using backtest engine at {}", program.display());

    Ok(program)
}
