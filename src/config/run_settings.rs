use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

//how the external backtest engine is invoked and where it leaves its results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    //engine executable, looked up on PATH when not a path
    pub program: String,

    //arguments placed before the engine subcommand (eg a script path for an interpreter)
    pub prefix_args: Vec<String>,

    pub subcommand: String,
    pub timeframe: String,
    pub timeframe_detail: Option<String>,
    pub cache: String,

    //directory holding the pointer file and the result artifacts
    pub results_dir: PathBuf,

    //name of the pointer file inside results_dir
    pub pointer_file: String,

    //pause after every run so the engine can finish its own bookkeeping
    pub pause_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            program: "freqtrade".to_string(),
            prefix_args: Vec::new(),
            subcommand: "backtesting".to_string(),
            timeframe: "5m".to_string(),
            timeframe_detail: Some("1m".to_string()),
            cache: "none".to_string(),
            results_dir: PathBuf::from("user_data/backtest_results"),
            pointer_file: ".last_result.json".to_string(),
            pause_ms: 1000,
        }
    }
}

impl EngineSettings {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn pointer_path(&self) -> PathBuf {
        self.results_dir.join(&self.pointer_file)
    }
}

//settings for one windowed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub engine: EngineSettings,

    //root under which a timestamped directory is created per invocation
    pub output_root: PathBuf,

    //default window length when neither --period nor --split is given
    pub period_days: u32,

    //log filter used when RUST_LOG is not set
    pub log_level: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            engine: EngineSettings::default(),
            output_root: PathBuf::from("bktest_script_files"),
            period_days: 30,
            log_level: "info".to_string(),
        }
    }
}

impl RunSettings {
    //load settings from a JSON file, missing keys fall back to defaults
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let settings: RunSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file {:?}", path))?;
        Ok(settings)
    }

    //save settings to a JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
