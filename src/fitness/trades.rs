use crate::report::{load_strategy_section, ArtifactError};
use chrono::{DateTime, TimeZone, Utc};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradeLoadError {
    #[error("Failed to open trades file {path:?}: {source}")]
    Open { path: PathBuf, source: csv::Error },
    #[error("Failed to parse trade record at line {line}: {source}")]
    Record { line: usize, source: csv::Error },
    #[error("Failed to parse close_date '{value}' at line {line}")]
    Timestamp { line: usize, value: String },
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Invalid trade list in backtest result: {0}")]
    InvalidTrades(serde_json::Error),
    #[error("Invalid close_timestamp {0}")]
    InvalidCloseTimestamp(i64),
}

//a closed trade, reduced to what the scorers need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    pub close_date: DateTime<Utc>,
    pub profit_abs: f64,
}

impl TradeResult {
    pub fn new(close_date: DateTime<Utc>, profit_abs: f64) -> Self {
        TradeResult {
            close_date,
            profit_abs,
        }
    }
}

//full-period trade results handed to a loss function
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessInput {
    pub trades: Vec<TradeResult>,
    pub starting_balance: f64,
}

impl FitnessInput {
    pub fn new(trades: Vec<TradeResult>, starting_balance: f64) -> Self {
        FitnessInput {
            trades,
            starting_balance,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvTrade {
    close_date: String,
    profit_abs: f64,
}

//loads trades from a csv file with close_date (rfc3339) and profit_abs columns
//extra columns are ignored
pub fn load_trades_csv<P: AsRef<Path>>(path: P) -> Result<Vec<TradeResult>, TradeLoadError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|source| TradeLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut trades = Vec::new();

    for (index, result) in reader.deserialize().enumerate() {
        let line = index + 2;
        let record: CsvTrade = result.map_err(|source| TradeLoadError::Record { line, source })?;

        let close_date = DateTime::parse_from_rfc3339(&record.close_date)
            .map_err(|_| TradeLoadError::Timestamp {
                line,
                value: record.close_date.clone(),
            })?
            .with_timezone(&Utc);

        trades.push(TradeResult::new(close_date, record.profit_abs));
    }

    Ok(trades)
}

#[derive(Debug, Deserialize)]
struct ArtifactTrade {
    close_timestamp: i64,
    profit_abs: f64,
}

#[derive(Debug, Deserialize)]
struct ArtifactTrades {
    trades: Vec<ArtifactTrade>,
}

//loads the trade list of one strategy from a backtest result artifact
pub fn load_trades_from_artifact(
    path: &Path,
    strategy: &str,
) -> Result<Vec<TradeResult>, TradeLoadError> {
    let section = load_strategy_section(path, strategy)?;
    let parsed: ArtifactTrades =
        serde_json::from_value(section).map_err(TradeLoadError::InvalidTrades)?;

    parsed
        .trades
        .into_iter()
        .map(|trade| {
            let close_date = Utc
                .timestamp_millis_opt(trade.close_timestamp)
                .single()
                .ok_or(TradeLoadError::InvalidCloseTimestamp(trade.close_timestamp))?;
            Ok(TradeResult::new(close_date, trade.profit_abs))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        std::fs::write(
            &path,
            "pair,close_date,profit_abs\n\
             BTC/USDT,2024-01-02T10:00:00Z,10.5\n\
             ETH/USDT,2024-01-03T11:30:00+00:00,-2.25\n",
        )
        .unwrap();

        let trades = load_trades_csv(&path).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].profit_abs, 10.5);
        assert_eq!(trades[1].profit_abs, -2.25);
        assert!(trades[0].close_date < trades[1].close_date);
    }

    #[test]
    fn test_bad_timestamp_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        std::fs::write(&path, "close_date,profit_abs\n2024-01-02,1.0\n").unwrap();

        match load_trades_csv(&path) {
            Err(TradeLoadError::Timestamp { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_load_from_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backtest-result.json");
        let body = json!({
            "strategy": {
                "SampleStrategy": {
                    "trades": [
                        {"pair": "BTC/USDT", "close_timestamp": 1704189600000_i64, "profit_abs": 10.0},
                        {"pair": "ETH/USDT", "close_timestamp": 1704279600000_i64, "profit_abs": -2.0}
                    ]
                }
            }
        });
        std::fs::write(&path, body.to_string()).unwrap();

        let trades = load_trades_from_artifact(&path, "SampleStrategy").unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].close_date.to_rfc3339(), "2024-01-02T10:00:00+00:00");
        assert_eq!(trades[1].profit_abs, -2.0);

        assert!(matches!(
            load_trades_from_artifact(&path, "Missing"),
            Err(TradeLoadError::Artifact(ArtifactError::StrategyNotFound { .. }))
        ));
    }
}
