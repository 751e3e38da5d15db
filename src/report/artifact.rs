use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Backtest result file not found at path: {0:?}")]
    NotFound(PathBuf),
    #[error("Failed to read backtest result file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Error decoding JSON in file {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Key 'strategy' not found in backtest data")]
    MissingStrategySection,
    #[error("Strategy '{strategy}' not found in backtest data (available: {available:?})")]
    StrategyNotFound {
        strategy: String,
        available: Vec<String>,
    },
    #[error("Incomplete metrics for strategy '{strategy}': {source}")]
    InvalidMetrics {
        strategy: String,
        source: serde_json::Error,
    },
}

//performance figures of one strategy over one window, as reported by the engine
//every field is required so report rows stay rectangular
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub total_trades: u64,
    pub profit_mean: f64,
    pub profit_median: f64,
    pub profit_total: f64,
    pub profit_total_long: f64,
    pub profit_total_short: f64,
    pub profit_factor: f64,
    pub cagr: f64,
    pub sortino: f64,
    pub sharpe: f64,
    pub calmar: f64,
    pub wins: u64,
    pub losses: u64,
    pub winrate: f64,
    pub holding_avg: String,
    pub max_drawdown_account: f64,
    pub max_relative_drawdown: f64,
}

impl MetricRow {
    //cell values in report column order
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.total_trades.to_string(),
            self.profit_mean.to_string(),
            self.profit_median.to_string(),
            self.profit_total.to_string(),
            self.profit_total_long.to_string(),
            self.profit_total_short.to_string(),
            self.profit_factor.to_string(),
            self.cagr.to_string(),
            self.sortino.to_string(),
            self.sharpe.to_string(),
            self.calmar.to_string(),
            self.wins.to_string(),
            self.losses.to_string(),
            self.winrate.to_string(),
            self.holding_avg.clone(),
            self.max_drawdown_account.to_string(),
            self.max_relative_drawdown.to_string(),
        ]
    }

    //numeric fields by name, for console summaries
    pub fn numeric_fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("Total Trades", self.total_trades as f64),
            ("Profit Mean", self.profit_mean),
            ("Profit Median", self.profit_median),
            ("Profit Total", self.profit_total),
            ("Profit Total Long", self.profit_total_long),
            ("Profit Total Short", self.profit_total_short),
            ("Profit Factor", self.profit_factor),
            ("CAGR", self.cagr),
            ("Sortino", self.sortino),
            ("Sharpe", self.sharpe),
            ("Calmar", self.calmar),
            ("Wins", self.wins as f64),
            ("Losses", self.losses as f64),
            ("Winrate", self.winrate),
            ("Max Drawdown Account", self.max_drawdown_account),
            ("Max Relative Drawdown", self.max_relative_drawdown),
        ]
    }
}

//top level of a result artifact, strategies keep their file order
#[derive(Debug, Deserialize)]
struct RawArtifact {
    #[serde(default)]
    strategy: Option<IndexMap<String, Value>>,
}

//reads a result artifact and returns the section for one strategy
pub fn load_strategy_section(path: &Path, strategy: &str) -> Result<Value, ArtifactError> {
    let contents = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::NotFound(path.to_path_buf())
        } else {
            ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let artifact: RawArtifact =
        serde_json::from_str(&contents).map_err(|source| ArtifactError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    let mut section = artifact
        .strategy
        .ok_or(ArtifactError::MissingStrategySection)?;

    let available: Vec<String> = section.keys().cloned().collect();
    section
        .swap_remove(strategy)
        .ok_or_else(|| ArtifactError::StrategyNotFound {
            strategy: strategy.to_string(),
            available,
        })
}

//extracts the fixed metric set for one strategy from a result artifact
pub fn load_metrics(path: &Path, strategy: &str) -> Result<MetricRow, ArtifactError> {
    let section = load_strategy_section(path, strategy)?;

    serde_json::from_value(section).map_err(|source| ArtifactError::InvalidMetrics {
        strategy: strategy.to_string(),
        source,
    })
}
