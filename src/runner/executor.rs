use crate::config::EngineSettings;
use crate::window::DateWindow;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info, warn};

//one backtest to run, created per window by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub strategy_id: String,
    pub config_ref: String,
    pub window: DateWindow,
}

impl RunRequest {
    pub fn new(strategy_id: &str, config_ref: &str, window: DateWindow) -> Self {
        RunRequest {
            strategy_id: strategy_id.to_string(),
            config_ref: config_ref.to_string(),
            window,
        }
    }
}

//what a single engine run left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    //captured standard output of the engine
    pub raw_output: String,

    //structured result written by the run, if one could be located
    pub result_artifact: Option<PathBuf>,
}

impl RunOutcome {
    //empty output means the engine produced nothing usable
    pub fn is_failed(&self) -> bool {
        self.raw_output.is_empty()
    }
}

//runs one backtest per request
//implementations block until the run is complete
pub trait Executor {
    fn execute(&self, request: &RunRequest) -> Result<RunOutcome>;
}

#[derive(Error, Debug)]
pub enum PointerError {
    #[error("Pointer file not found at {0:?}")]
    Missing(PathBuf),
    #[error("Failed to read pointer file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse pointer file {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct LastResult {
    latest_backtest: String,
}

//resolves the newest result artifact through the engine's pointer file
pub fn read_pointer(results_dir: &Path, pointer_file: &str) -> Result<PathBuf, PointerError> {
    let path = results_dir.join(pointer_file);

    let contents = std::fs::read_to_string(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            PointerError::Missing(path.clone())
        } else {
            PointerError::Io {
                path: path.clone(),
                source,
            }
        }
    })?;

    let last: LastResult =
        serde_json::from_str(&contents).map_err(|source| PointerError::Malformed {
            path: path.clone(),
            source,
        })?;

    Ok(results_dir.join(last.latest_backtest))
}

//artifact the pointer names after a run, as long as the run actually moved it
//an unchanged pointer still names the previous run's result
pub fn fresh_artifact(
    previous: Option<&Path>,
    current: Result<PathBuf, PointerError>,
) -> Option<PathBuf> {
    match current {
        Ok(path) if previous == Some(path.as_path()) => {
            warn!(
                "pointer file still names {}, the run wrote no new result",
                path.display()
            );
            None
        }
        Ok(path) => {
            info!("latest_backtest_path: {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

//executes the engine as a child process, one run per call
pub struct EngineExecutor {
    settings: EngineSettings,
}

impl EngineExecutor {
    pub fn new(settings: EngineSettings) -> Self {
        EngineExecutor { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    //full argument list handed to the engine program
    pub fn command_args(&self, request: &RunRequest) -> Vec<String> {
        let settings = &self.settings;
        let mut args = settings.prefix_args.clone();

        args.push(settings.subcommand.clone());
        args.push("--timerange".to_string());
        args.push(request.window.timerange());
        args.push("--timeframe".to_string());
        args.push(settings.timeframe.clone());
        if let Some(detail) = &settings.timeframe_detail {
            args.push("--timeframe-detail".to_string());
            args.push(detail.clone());
        }
        args.push("--strategy".to_string());
        args.push(request.strategy_id.clone());
        args.push("-c".to_string());
        args.push(request.config_ref.clone());
        args.push("--cache".to_string());
        args.push(settings.cache.clone());

        args
    }
}

impl Executor for EngineExecutor {
    fn execute(&self, request: &RunRequest) -> Result<RunOutcome> {
        info!(
            "Running backtest for period {} to {}...",
            request.window.start.format(crate::window::DATE_FORMAT),
            request.window.end.format(crate::window::DATE_FORMAT)
        );

        let previous = read_pointer(&self.settings.results_dir, &self.settings.pointer_file).ok();

        let output = Command::new(&self.settings.program)
            .args(self.command_args(request))
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to launch {}", self.settings.program))?;

        let raw_output = String::from_utf8_lossy(&output.stdout).into_owned();

        //the engine writes diagnostics to stderr on success too, never a failure on its own
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!("engine stderr for {}:\n{}", request.window, stderr.trim_end());
        }
        if !output.status.success() {
            warn!("engine exited with {} for {}", output.status, request.window);
        }

        let result_artifact = fresh_artifact(
            previous.as_deref(),
            read_pointer(&self.settings.results_dir, &self.settings.pointer_file),
        );

        std::thread::sleep(self.settings.pause());

        Ok(RunOutcome {
            raw_output,
            result_artifact,
        })
    }
}
