use crate::config::config_stem;
use crate::report::{load_metrics, ResultsTable};
use crate::runner::executor::{Executor, RunRequest};
use crate::window::DateWindow;
use tracing::{error, info};

//why a window produced no row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowFailure {
    //the engine could not be launched
    Launch(String),
    //the engine printed nothing
    EmptyOutput,
    //no result artifact could be located
    NoArtifact,
    //the artifact was unreadable or incomplete
    Artifact(String),
    //the row could not be written
    Write(String),
}

//what happened across all windows of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub succeeded: Vec<DateWindow>,
    pub failed: Vec<(DateWindow, WindowFailure)>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

//report file name: results_<strategy>_<config stem>_<timestamp>.csv
pub fn report_file_name(strategy: &str, config_ref: &str, execution_time: &str) -> String {
    format!(
        "results_{}_{}_{}.csv",
        strategy,
        config_stem(config_ref),
        execution_time
    )
}

//runs the engine once per window, strictly in order, and appends a row for
//every window whose artifact yields a complete metric set
//failures are logged and skipped, the run always goes through every window
pub fn run_windows<E: Executor>(
    executor: &E,
    strategy: &str,
    config_ref: &str,
    windows: &[DateWindow],
    table: &mut ResultsTable,
) -> RunReport {
    let mut report = RunReport::default();

    for (index, window) in windows.iter().enumerate() {
        info!("Window {}/{}: {}", index + 1, windows.len(), window);

        match process_window(executor, strategy, config_ref, window, table) {
            Ok(()) => report.succeeded.push(*window),
            Err(failure) => report.failed.push((*window, failure)),
        }
    }

    info!(
        "Processed {} windows: {} rows written, {} skipped",
        report.total(),
        report.succeeded.len(),
        report.failed.len()
    );

    report
}

fn process_window<E: Executor>(
    executor: &E,
    strategy: &str,
    config_ref: &str,
    window: &DateWindow,
    table: &mut ResultsTable,
) -> Result<(), WindowFailure> {
    let request = RunRequest::new(strategy, config_ref, *window);

    let outcome = executor.execute(&request).map_err(|e| {
        error!("Backtest could not be started for {}: {:#}", window, e);
        WindowFailure::Launch(format!("{:#}", e))
    })?;
    info!("backtest_result: {}", outcome.raw_output);

    if outcome.is_failed() {
        error!("Backtest failed.");
        return Err(WindowFailure::EmptyOutput);
    }

    let artifact = outcome.result_artifact.ok_or_else(|| {
        error!("No backtest result located for {}", window);
        WindowFailure::NoArtifact
    })?;

    let metrics = load_metrics(&artifact, strategy).map_err(|e| {
        error!("{}", e);
        WindowFailure::Artifact(e.to_string())
    })?;

    table.append(window, &metrics).map_err(|e| {
        error!("{:#}", e);
        WindowFailure::Write(format!("{:#}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::artifact::tests::sample_metrics;
    use crate::runner::executor::RunOutcome;
    use crate::window::{parse_date, partition};
    use anyhow::anyhow;
    use serde_json::json;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    //replays a scripted outcome per call and records the requests it saw
    struct ScriptedExecutor {
        outcomes: RefCell<Vec<anyhow::Result<RunOutcome>>>,
        seen: RefCell<Vec<RunRequest>>,
    }

    impl ScriptedExecutor {
        fn new(mut outcomes: Vec<anyhow::Result<RunOutcome>>) -> Self {
            outcomes.reverse();
            ScriptedExecutor {
                outcomes: RefCell::new(outcomes),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Executor for ScriptedExecutor {
        fn execute(&self, request: &RunRequest) -> anyhow::Result<RunOutcome> {
            self.seen.borrow_mut().push(request.clone());
            self.outcomes
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Ok(RunOutcome::default()))
        }
    }

    fn artifact(dir: &Path, name: &str, body: serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body.to_string()).unwrap();
        path
    }

    fn ok(path: &Path) -> anyhow::Result<RunOutcome> {
        Ok(RunOutcome {
            raw_output: "Result for strategy SampleStrategy".to_string(),
            result_artifact: Some(path.to_path_buf()),
        })
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(
            report_file_name("SampleStrategy", "config.json", "2024-09-25_14-03-59"),
            "results_SampleStrategy_config_2024-09-25_14-03-59.csv"
        );
    }

    #[test]
    fn test_failures_are_skipped_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let good = artifact(
            dir.path(),
            "good.json",
            json!({"strategy": {"SampleStrategy": sample_metrics()}}),
        );
        let no_section = artifact(dir.path(), "bad.json", json!({"other": {}}));

        let windows = partition(
            parse_date("20200101").unwrap(),
            parse_date("20200601").unwrap(),
            30,
            None,
        )
        .unwrap();
        assert_eq!(windows.len(), 6);

        let executor = ScriptedExecutor::new(vec![
            ok(&good),
            Ok(RunOutcome {
                raw_output: String::new(),
                result_artifact: Some(good.clone()),
            }),
            Err(anyhow!("spawn failed")),
            ok(&no_section),
            Ok(RunOutcome {
                raw_output: "done".to_string(),
                result_artifact: None,
            }),
            ok(&good),
        ]);

        let mut table = ResultsTable::create(&dir.path().join("results.csv")).unwrap();
        let report = run_windows(
            &executor,
            "SampleStrategy",
            "config.json",
            &windows,
            &mut table,
        );

        assert_eq!(executor.seen.borrow().len(), 6);
        assert_eq!(report.succeeded, vec![windows[0], windows[5]]);
        assert_eq!(report.failed[0], (windows[1], WindowFailure::EmptyOutput));
        assert!(matches!(report.failed[1].1, WindowFailure::Launch(_)));
        assert!(matches!(report.failed[2].1, WindowFailure::Artifact(_)));
        assert_eq!(report.failed[3].1, WindowFailure::NoArtifact);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].0, windows[5]);
    }

    #[test]
    fn test_requests_follow_window_order() {
        let dir = tempfile::tempdir().unwrap();
        let windows = partition(
            parse_date("20200101").unwrap(),
            parse_date("20200401").unwrap(),
            30,
            Some(3),
        )
        .unwrap();

        let executor = ScriptedExecutor::new(Vec::new());
        let mut table = ResultsTable::create(&dir.path().join("results.csv")).unwrap();
        let report = run_windows(&executor, "S", "cfg.json", &windows, &mut table);

        let seen = executor.seen.borrow();
        let seen_windows: Vec<DateWindow> = seen.iter().map(|r| r.window).collect();
        assert_eq!(seen_windows, windows);
        assert!(seen.iter().all(|r| r.strategy_id == "S" && r.config_ref == "cfg.json"));
        assert_eq!(report.failed.len(), 3);
        assert!(table.is_empty());
    }
}
