pub mod engine_config;
pub mod run_settings;

pub use engine_config::{config_stem, EngineConfig, DEFAULT_DRY_RUN_WALLET};
pub use run_settings::{EngineSettings, RunSettings};
