pub mod drawdown;
pub mod loss;
pub mod trades;

pub use drawdown::{calculate_max_drawdown, relative_account_drawdown, Drawdown, DrawdownError};
pub use loss::{
    calculate_expectancy, complex_loss, loss_by_name, pflog_profit_drawdown_loss, ComplexLoss,
    LossFunction, PfLogProfitDrawdownLoss, DRAWDOWN_MULT, LARGE_NUMBER,
};
pub use trades::{
    load_trades_csv, load_trades_from_artifact, FitnessInput, TradeLoadError, TradeResult,
};
