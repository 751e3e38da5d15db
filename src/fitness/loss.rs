use crate::fitness::drawdown::relative_account_drawdown;
use crate::fitness::trades::{FitnessInput, TradeResult};

//smaller numbers penalize drawdowns more severely
pub const DRAWDOWN_MULT: f64 = 0.055;

//stands in for an unbounded profit factor
pub const LARGE_NUMBER: f64 = 1e6;

//keeps ln(profit_factor + PF_CONST) non-negative
pub const PF_CONST: f64 = 1.0;

//below this many trades the complex loss scales the score down
pub const TARGET_TRADE_AMOUNT: usize = 50;

//trade count at or below which the complex loss applies its low-trade penalty
pub const LOW_TRADE_COUNT: usize = 20;
pub const LOW_TRADE_PENALTY: f64 = 0.6;

pub const EXPECTANCY_CONST: f64 = 2.0;
pub const WINRATE_CONST: f64 = 1.2;

//objective handed to a parameter search; lower values rank better
//implementations are pure and may be called from several threads at once
pub trait LossFunction: Send + Sync {
    fn name(&self) -> &'static str;

    fn loss(&self, input: &FitnessInput) -> f64;
}

struct ProfitSplit {
    total: f64,
    winning: f64,
    losing: f64,
    wins: usize,
    losses: usize,
}

fn split_profits(trades: &[TradeResult]) -> ProfitSplit {
    let mut split = ProfitSplit {
        total: 0.0,
        winning: 0.0,
        losing: 0.0,
        wins: 0,
        losses: 0,
    };

    for trade in trades {
        split.total += trade.profit_abs;
        if trade.profit_abs > 0.0 {
            split.winning += trade.profit_abs;
            split.wins += 1;
        } else if trade.profit_abs < 0.0 {
            split.losing += trade.profit_abs;
            split.losses += 1;
        }
    }

    split
}

//profit minus the drawdown-weighted share of it
fn profit_draw(total_profit: f64, relative_drawdown: f64) -> f64 {
    total_profit - (relative_drawdown * total_profit) * (1.0 - DRAWDOWN_MULT)
}

//profit, drawdown and profit factor combined into one value
//
//score = -(profit - rdd * profit * (1 - DRAWDOWN_MULT)) * ln(pf + 1)
//a trade set without losses uses LARGE_NUMBER as its profit factor and an
//undefined drawdown counts as 0, so every input yields a finite score
pub fn pflog_profit_drawdown_loss(trades: &[TradeResult], starting_balance: f64) -> f64 {
    let split = split_profits(trades);

    let profit_factor = if split.losing != 0.0 {
        split.winning / split.losing.abs()
    } else {
        LARGE_NUMBER
    };

    let drawdown = relative_account_drawdown(trades, starting_balance);
    let log_profit_factor = (profit_factor + PF_CONST).ln();

    -1.0 * profit_draw(split.total, drawdown) * log_profit_factor
}

//average outcome per trade and the reward-to-risk adjusted win expectancy
//the ratio stays at 100 when there are no losing trades
pub fn calculate_expectancy(trades: &[TradeResult]) -> (f64, f64) {
    let mut expectancy = 0.0;
    let mut expectancy_ratio = 100.0;

    if !trades.is_empty() {
        let split = split_profits(trades);
        let count = trades.len() as f64;

        let average_win = if split.wins > 0 {
            split.winning / split.wins as f64
        } else {
            0.0
        };
        let average_loss = if split.losses > 0 {
            split.losing.abs() / split.losses as f64
        } else {
            0.0
        };

        let winrate = split.wins as f64 / count;
        let loserate = split.losses as f64 / count;

        expectancy = winrate * average_win - loserate * average_loss;

        if average_loss > 0.0 {
            let risk_reward_ratio = average_win / average_loss;
            expectancy_ratio = (1.0 + risk_reward_ratio) * winrate - 1.0;
        }
    }

    (expectancy, expectancy_ratio)
}

//scales sets with fewer than TARGET_TRADE_AMOUNT trades down linearly, floor 0.1
pub fn trade_count_penalty(trade_count: usize) -> f64 {
    if trade_count >= TARGET_TRADE_AMOUNT {
        return 1.0;
    }
    let shortfall = TARGET_TRADE_AMOUNT.abs_diff(trade_count) as f64;
    (1.0 - shortfall / TARGET_TRADE_AMOUNT as f64).max(0.1)
}

pub fn low_trade_count_penalty(trade_count: usize) -> f64 {
    if trade_count <= LOW_TRADE_COUNT {
        LOW_TRADE_PENALTY
    } else {
        1.0
    }
}

//profit/drawdown objective extended with expectancy, winrate and trade count terms
pub fn complex_loss(trades: &[TradeResult], starting_balance: f64) -> f64 {
    let split = split_profits(trades);
    let trade_count = trades.len();

    let profit_factor = split.winning / (split.losing.abs() + 1e-6);
    let log_profit_factor = (profit_factor + PF_CONST).ln();

    let (_, expectancy_ratio) = calculate_expectancy(trades);
    let log_expectancy_ratio = if expectancy_ratio > 10.0 {
        1.01_f64.ln()
    } else {
        (expectancy_ratio + EXPECTANCY_CONST).ln()
    };

    let winrate = if trade_count > 0 {
        split.wins as f64 / trade_count as f64
    } else {
        0.0
    };
    let log_winrate_coef = (WINRATE_CONST + winrate).ln();

    let drawdown = relative_account_drawdown(trades, starting_balance);

    -1.0 * (profit_draw(split.total, drawdown)
        * log_profit_factor
        * log_expectancy_ratio
        * log_winrate_coef
        * trade_count_penalty(trade_count)
        * low_trade_count_penalty(trade_count))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PfLogProfitDrawdownLoss;

impl LossFunction for PfLogProfitDrawdownLoss {
    fn name(&self) -> &'static str {
        "PFlogProfitDrawDownHyperOptLoss"
    }

    fn loss(&self, input: &FitnessInput) -> f64 {
        pflog_profit_drawdown_loss(&input.trades, input.starting_balance)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexLoss;

impl LossFunction for ComplexLoss {
    fn name(&self) -> &'static str {
        "ComplexHyperOptLoss"
    }

    fn loss(&self, input: &FitnessInput) -> f64 {
        complex_loss(&input.trades, input.starting_balance)
    }
}

//resolves a loss function by its full name or a short alias
pub fn loss_by_name(name: &str) -> Option<Box<dyn LossFunction>> {
    match name.to_lowercase().as_str() {
        "pflogprofitdrawdownhyperoptloss" | "pflog" | "profit_drawdown" => {
            Some(Box::new(PfLogProfitDrawdownLoss))
        }
        "complexhyperoptloss" | "complex" => Some(Box::new(ComplexLoss)),
        _ => None,
    }
}
