use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

//wallet size the engine assumes when the config does not set one
pub const DEFAULT_DRY_RUN_WALLET: f64 = 1000.0;

//the parts of the engine's own configuration file the scorer cares about
//everything else in that file is ignored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_wallet")]
    pub dry_run_wallet: f64,

    #[serde(default)]
    pub stake_currency: Option<String>,
}

fn default_wallet() -> f64 {
    DEFAULT_DRY_RUN_WALLET
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            dry_run_wallet: DEFAULT_DRY_RUN_WALLET,
            stake_currency: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config {:?}", path))?;
        let config: EngineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse engine config {:?}", path))?;
        Ok(config)
    }

    //starting balance used for drawdown calculations
    pub fn starting_balance(&self) -> f64 {
        self.dry_run_wallet
    }

    //an amount in the stake currency, bare when the config names none
    pub fn format_amount(&self, amount: f64) -> String {
        match &self.stake_currency {
            Some(currency) => format!("{} {}", amount, currency),
            None => amount.to_string(),
        }
    }
}

//config stem used in report file names ("config_main.json" -> "config_main")
pub fn config_stem(config_ref: &str) -> String {
    Path::new(config_ref)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| config_ref.to_string())
}
