//windowed strategy backtest runner with a composite fitness scorer

pub mod config;
pub mod fitness;
pub mod logging;
pub mod report;
pub mod runner;
pub mod window;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{config_stem, EngineConfig, EngineSettings, RunSettings};
    pub use crate::fitness::{
        calculate_max_drawdown, complex_loss, load_trades_csv, load_trades_from_artifact,
        loss_by_name, pflog_profit_drawdown_loss, FitnessInput, LossFunction, TradeResult,
    };
    pub use crate::logging::{execution_timestamp, init_console, RunLog};
    pub use crate::report::{
        load_metrics, pretty_print_summary, summarize, ArtifactError, MetricRow, ResultsTable,
    };
    pub use crate::runner::{
        check_environment, report_file_name, run_windows, EngineExecutor, Executor, RunOutcome,
        RunReport, RunRequest, WindowFailure,
    };
    pub use crate::window::{parse_date, partition, DateWindow, PartitionError};
}
