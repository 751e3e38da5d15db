use crate::fitness::trades::TradeResult;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DrawdownError {
    #[error("Trade list is empty")]
    EmptyTrades,
    #[error("No losing trade, therefore no drawdown")]
    NoLosingTrade,
}

//deepest peak-to-trough decline of cumulative profit over a trade sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Drawdown {
    pub drawdown_abs: f64,
    pub high_date: DateTime<Utc>,
    pub low_date: DateTime<Utc>,
    pub high_value: f64,
    pub low_value: f64,
    pub relative_account_drawdown: f64,
}

//max drawdown over the equity curve of closed trades
//
//trades are ordered by close date (ties keep input order). the running high
//starts at the first trade's cumulative profit, so a trade sequence whose
//deepest point is its first trade has no drawdown. the relative drawdown is
//measured against starting_balance + running high when a balance is given.
pub fn calculate_max_drawdown(
    trades: &[TradeResult],
    starting_balance: f64,
) -> Result<Drawdown, DrawdownError> {
    if trades.is_empty() {
        return Err(DrawdownError::EmptyTrades);
    }

    let mut ordered: Vec<&TradeResult> = trades.iter().collect();
    ordered.sort_by_key(|t| t.close_date);

    let mut cumulative = Vec::with_capacity(ordered.len());
    let mut high = Vec::with_capacity(ordered.len());
    let mut running = 0.0;
    let mut peak = f64::NEG_INFINITY;

    for trade in &ordered {
        running += trade.profit_abs;
        peak = peak.max(running);
        cumulative.push(running);
        high.push(peak);
    }

    //first index of the deepest absolute drawdown
    let mut low_index = 0;
    let mut deepest = cumulative[0] - high[0];
    for i in 1..cumulative.len() {
        let drawdown = cumulative[i] - high[i];
        if drawdown < deepest {
            deepest = drawdown;
            low_index = i;
        }
    }

    if low_index == 0 {
        return Err(DrawdownError::NoLosingTrade);
    }

    //first index holding the highest peak before the trough
    let mut high_index = 0;
    for i in 1..low_index {
        if high[i] > high[high_index] {
            high_index = i;
        }
    }

    let relative_account_drawdown = if starting_balance != 0.0 {
        let max_balance = starting_balance + high[low_index];
        let balance = starting_balance + cumulative[low_index];
        (max_balance - balance) / max_balance
    } else {
        (high[low_index] - cumulative[low_index]) / high[low_index]
    };

    Ok(Drawdown {
        drawdown_abs: deepest.abs(),
        high_date: ordered[high_index].close_date,
        low_date: ordered[low_index].close_date,
        high_value: cumulative[high_index],
        low_value: cumulative[low_index],
        relative_account_drawdown,
    })
}

//relative drawdown, 0 whenever it is undefined for the trade set
pub fn relative_account_drawdown(trades: &[TradeResult], starting_balance: f64) -> f64 {
    calculate_max_drawdown(trades, starting_balance)
        .map(|d| d.relative_account_drawdown)
        .ok()
        .filter(|r| r.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    pub(crate) fn trades(profits: &[f64]) -> Vec<TradeResult> {
        let base = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        profits
            .iter()
            .enumerate()
            .map(|(i, &p)| TradeResult::new(base + Duration::hours(i as i64), p))
            .collect()
    }

    #[test]
    fn test_simple_drawdown() {
        let dd = calculate_max_drawdown(&trades(&[10.0, -2.0]), 100.0).unwrap();
        assert_eq!(dd.drawdown_abs, 2.0);
        assert_eq!(dd.high_value, 10.0);
        assert_eq!(dd.low_value, 8.0);
        assert_eq!(dd.relative_account_drawdown, (110.0 - 108.0) / 110.0);
    }

    #[test]
    fn test_deepest_trough_wins() {
        let t = trades(&[5.0, -3.0, 10.0, -8.0, 2.0, -1.0]);
        let dd = calculate_max_drawdown(&t, 1000.0).unwrap();
        //cumulative 5 2 12 4 6 5, high 5 5 12 12 12 12
        assert_eq!(dd.drawdown_abs, 8.0);
        assert_eq!(dd.high_value, 12.0);
        assert_eq!(dd.low_value, 4.0);
        assert_eq!(dd.high_date, t[2].close_date);
        assert_eq!(dd.low_date, t[3].close_date);
        assert_eq!(dd.relative_account_drawdown, (1012.0 - 1004.0) / 1012.0);
    }

    #[test]
    fn test_trades_are_ordered_by_close_date() {
        let mut t = trades(&[10.0, -4.0, 3.0]);
        t.swap(0, 2);
        let dd = calculate_max_drawdown(&t, 100.0).unwrap();
        assert_eq!(dd.drawdown_abs, 4.0);
        assert_eq!(dd.low_value, 6.0);
    }

    #[test]
    fn test_undefined_drawdowns() {
        assert_eq!(
            calculate_max_drawdown(&[], 100.0),
            Err(DrawdownError::EmptyTrades)
        );
        assert_eq!(
            calculate_max_drawdown(&trades(&[10.0]), 100.0),
            Err(DrawdownError::NoLosingTrade)
        );
        assert_eq!(
            calculate_max_drawdown(&trades(&[1.0, 2.0, 3.0]), 100.0),
            Err(DrawdownError::NoLosingTrade)
        );
        //a loss on the first trade is not measured against anything
        assert_eq!(
            calculate_max_drawdown(&trades(&[-5.0, 1.0]), 100.0),
            Err(DrawdownError::NoLosingTrade)
        );
    }

    #[test]
    fn test_without_starting_balance() {
        let dd = calculate_max_drawdown(&trades(&[10.0, -5.0]), 0.0).unwrap();
        assert_eq!(dd.relative_account_drawdown, 0.5);
    }

    #[test]
    fn test_relative_substitutes_zero() {
        assert_eq!(relative_account_drawdown(&trades(&[10.0]), 100.0), 0.0);
        assert_eq!(relative_account_drawdown(&[], 100.0), 0.0);
        //zero high without a balance divides by zero
        assert_eq!(relative_account_drawdown(&trades(&[0.0, -1.0]), 0.0), 0.0);
        assert!(relative_account_drawdown(&trades(&[10.0, -2.0]), 100.0) > 0.0);
    }
}
