pub mod environment;
pub mod executor;
pub mod pipeline;

pub use environment::{check_environment, locate_program, EnvironmentError};
pub use executor::{
    fresh_artifact, read_pointer, EngineExecutor, Executor, PointerError, RunOutcome, RunRequest,
};
pub use pipeline::{report_file_name, run_windows, RunReport, WindowFailure};
