use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use slicer::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "slicer")]
#[command(about = "Backtest a strategy window by window and score candidate results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

//options shared by commands that cut the period into windows
#[derive(clap::Args)]
struct WindowArgs {
    //start date (yyyymmdd)
    #[arg(long)]
    start_date: String,

    //end date (yyyymmdd)
    #[arg(long)]
    end_date: String,

    //period in days for each backtest (default: 30, or the settings file)
    #[arg(long)]
    period: Option<u32>,

    //split the whole period into N windows, overrides --period
    #[arg(long)]
    split: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    //backtest a strategy over every window and collect a results table
    Run {
        //strategy name
        #[arg(long)]
        strategy: String,

        //engine config filename
        #[arg(long)]
        config: String,

        #[command(flatten)]
        windows: WindowArgs,

        //settings file (json), defaults are used for anything it leaves out
        #[arg(long)]
        settings: Option<PathBuf>,

        //engine executable
        #[arg(long)]
        engine: Option<String>,

        //directory the engine writes its results to
        #[arg(long)]
        results_dir: Option<PathBuf>,

        //root directory for run logs and reports
        #[arg(long)]
        output_root: Option<PathBuf>,

        //pause after each run in milliseconds
        #[arg(long)]
        pause_ms: Option<u64>,
    },

    //print the windows a run would use
    Windows {
        #[command(flatten)]
        windows: WindowArgs,
    },

    //score trade results with a loss function, lower is better
    Score {
        //trade files: csv (close_date, profit_abs) or backtest results with --strategy
        #[arg(long = "trades", required = true, num_args = 1..)]
        trades: Vec<PathBuf>,

        //read trades of this strategy from backtest result files
        #[arg(long)]
        strategy: Option<String>,

        //engine config to take dry_run_wallet from
        #[arg(long)]
        config: Option<PathBuf>,

        //starting balance, overrides the config
        #[arg(long)]
        starting_balance: Option<f64>,

        //loss function name
        #[arg(long, default_value = "PFlogProfitDrawDownHyperOptLoss")]
        loss: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            strategy,
            config,
            windows,
            settings,
            engine,
            results_dir,
            output_root,
            pause_ms,
        } => {
            let mut run_settings = match settings {
                Some(path) => RunSettings::from_json_file(&path)?,
                None => RunSettings::default(),
            };
            if let Some(engine) = engine {
                run_settings.engine.program = engine;
            }
            if let Some(results_dir) = results_dir {
                run_settings.engine.results_dir = results_dir;
            }
            if let Some(output_root) = output_root {
                run_settings.output_root = output_root;
            }
            if let Some(pause_ms) = pause_ms {
                run_settings.engine.pause_ms = pause_ms;
            }

            run(&strategy, &config, &windows, run_settings)?;
        }
        Commands::Windows { windows } => {
            let defaults = RunSettings::default();
            for window in build_windows(&windows, defaults.period_days)? {
                println!("{}  ({} days)", window, window.days());
            }
        }
        Commands::Score {
            trades,
            strategy,
            config,
            starting_balance,
            loss,
        } => {
            init_console("info");
            score(&trades, strategy.as_deref(), config, starting_balance, &loss)?;
        }
    }

    Ok(())
}

fn build_windows(args: &WindowArgs, default_period: u32) -> Result<Vec<DateWindow>> {
    let start = parse_date(&args.start_date)?;
    let end = parse_date(&args.end_date)?;
    let period = args.period.unwrap_or(default_period);

    let windows = partition(start, end, period, args.split)?;
    Ok(windows)
}

fn run(strategy: &str, config: &str, args: &WindowArgs, settings: RunSettings) -> Result<()> {
    let execution_time = execution_timestamp();
    let run_log = RunLog::create(&settings.output_root, &execution_time)?;
    let _guard = run_log.install(&settings.log_level)?;
    info!("log_file: {}", run_log.log_file.display());

    if let Err(e) = check_environment(&settings.engine) {
        error!("{}", e);
        return Err(e.into());
    }

    let windows = build_windows(args, settings.period_days)?;
    if windows.is_empty() {
        warn!(
            "No windows between {} and {}, nothing to run",
            args.start_date, args.end_date
        );
    }

    let report_path = run_log.file(&report_file_name(strategy, config, &execution_time));
    let mut table = ResultsTable::create(&report_path)?;
    info!("Writing results to {}", report_path.display());

    let executor = EngineExecutor::new(settings.engine.clone());
    let report = run_windows(&executor, strategy, config, &windows, &mut table);

    if !table.is_empty() {
        println!("\nWindow Summary");
        println!("==============\n");
        pretty_print_summary(table.len(), &summarize(table.rows()));
    }
    info!(
        "Finished: {}/{} windows in {}",
        report.succeeded.len(),
        report.total(),
        table.path().display()
    );

    Ok(())
}

fn load_trades(path: &Path, strategy: Option<&str>) -> Result<Vec<TradeResult>> {
    let trades = match strategy {
        Some(strategy) => load_trades_from_artifact(path, strategy)?,
        None => load_trades_csv(path)?,
    };
    Ok(trades)
}

fn score(
    paths: &[PathBuf],
    strategy: Option<&str>,
    config: Option<PathBuf>,
    starting_balance: Option<f64>,
    loss_name: &str,
) -> Result<()> {
    let loss = loss_by_name(loss_name)
        .ok_or_else(|| anyhow::anyhow!("Unknown loss function: {}", loss_name))?;

    let engine_config = match config {
        Some(path) => EngineConfig::from_json_file(&path)?,
        None => EngineConfig::default(),
    };
    let starting_balance = starting_balance.unwrap_or_else(|| engine_config.starting_balance());
    info!(
        "Scoring {} candidate(s) with {} (starting balance {})",
        paths.len(),
        loss.name(),
        engine_config.format_amount(starting_balance)
    );

    let results: Vec<(PathBuf, Result<(usize, f64)>)> = paths
        .par_iter()
        .map(|path| {
            let scored = load_trades(path, strategy)
                .with_context(|| format!("Failed to load trades from {:?}", path))
                .map(|trades| {
                    let count = trades.len();
                    let input = FitnessInput::new(trades, starting_balance);
                    (count, loss.loss(&input))
                });
            (path.clone(), scored)
        })
        .collect();

    let mut ranked = Vec::new();
    for (path, scored) in results {
        match scored {
            Ok((count, value)) => ranked.push((path, count, value)),
            Err(e) => error!("{:#}", e),
        }
    }
    ranked.sort_by(|a, b| a.2.total_cmp(&b.2));

    let mut table = prettytable::Table::new();
    table.add_row(prettytable::row!["Rank", "Candidate", "Trades", "Loss"]);
    for (rank, (path, count, value)) in ranked.iter().enumerate() {
        table.add_row(prettytable::row![
            rank + 1,
            path.display(),
            count,
            format!("{:.6}", value)
        ]);
    }
    table.printstd();

    Ok(())
}
