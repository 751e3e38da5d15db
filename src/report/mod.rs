pub mod artifact;
pub mod summary;
pub mod table;

pub use artifact::{load_metrics, load_strategy_section, ArtifactError, MetricRow};
pub use summary::{pretty_print_summary, summarize, ColumnSummary};
pub use table::ResultsTable;
