use crate::report::artifact::MetricRow;
use crate::window::DateWindow;
use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};

//column titles, first column holds the window label
pub const HEADER: [&str; 20] = [
    "Strategy",
    "Total Trades",
    "Profit Mean",
    "Profit Median",
    "Profit Total",
    "Profit Total Long",
    "Profit Total Short",
    "Profit Factor",
    "CAGR",
    "Sortino",
    "Sharpe",
    "Calmar",
    "Wins",
    "Losses",
    "Winrate",
    "Holding Avg",
    "Max Drawdown Account",
    "Max Relative Drawdown",
    "Max Drawdown",
    "Med_Profit/Med_Draw",
];

//spreadsheet row of the first data row (header is 1, median 2, average 3)
pub const FIRST_DATA_ROW: usize = 4;

//last spreadsheet row covered by the summary formulas
pub const LAST_SUMMARY_ROW: usize = 100;

//metric columns B..R carry a median and an average formula
const METRIC_COLUMNS: std::ops::RangeInclusive<u8> = b'B'..=b'R';

fn column_range(column: char) -> String {
    format!("{column}{FIRST_DATA_ROW}:{column}{LAST_SUMMARY_ROW}")
}

//"Median" row: per-column medians, the worse of the two drawdown columns,
//and median profit over median relative drawdown
pub fn median_row() -> Vec<String> {
    let mut row = vec!["Median".to_string()];
    row.extend(
        METRIC_COLUMNS.map(|c| format!("=MEDIAN({})", column_range(c as char))),
    );
    row.push(format!("=MAX(Q{FIRST_DATA_ROW}:R{LAST_SUMMARY_ROW})"));
    row.push("=E2/R2".to_string());
    row
}

//"Average" row: per-column averages
pub fn average_row() -> Vec<String> {
    let mut row = vec!["Average".to_string()];
    row.extend(
        METRIC_COLUMNS.map(|c| format!("=AVERAGE({})", column_range(c as char))),
    );
    row
}

//append-only csv report, one row per processed window
//rows are of unequal width, the summary formulas are written verbatim
pub struct ResultsTable {
    path: PathBuf,
    writer: Writer<File>,
    rows: Vec<(DateWindow, MetricRow)>,
}

impl ResultsTable {
    //creates the file and seeds header, median and average rows
    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to create results table {:?}", path))?;

        writer.write_record(HEADER)?;
        writer.write_record(median_row())?;
        writer.write_record(average_row())?;
        writer.flush()?;

        Ok(ResultsTable {
            path: path.to_path_buf(),
            writer,
            rows: Vec::new(),
        })
    }

    //appends one window's metrics, flushed immediately so partial tables survive
    pub fn append(&mut self, window: &DateWindow, metrics: &MetricRow) -> Result<()> {
        let mut record = vec![window.label()];
        record.extend(metrics.to_cells());

        self.writer
            .write_record(&record)
            .with_context(|| format!("Failed to write row for {}", window))?;
        self.writer.flush()?;

        self.rows.push((*window, metrics.clone()));
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    //rows appended so far, in insertion order
    pub fn rows(&self) -> &[(DateWindow, MetricRow)] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
