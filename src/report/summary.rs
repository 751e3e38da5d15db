use crate::report::artifact::MetricRow;
use crate::window::DateWindow;
use prettytable::{Cell, Row, Table};
use statrs::statistics::{Data, Median, Statistics};

//median and mean of one metric across all processed windows
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: &'static str,
    pub median: f64,
    pub mean: f64,
}

//console counterpart of the spreadsheet formula rows
pub fn summarize(rows: &[(DateWindow, MetricRow)]) -> Vec<ColumnSummary> {
    let Some((_, first)) = rows.first() else {
        return Vec::new();
    };

    first
        .numeric_fields()
        .iter()
        .enumerate()
        .map(|(index, (name, _))| {
            let values: Vec<f64> = rows
                .iter()
                .map(|(_, row)| row.numeric_fields()[index].1)
                .collect();

            ColumnSummary {
                name: *name,
                median: Data::new(values.clone()).median(),
                mean: values.mean(),
            }
        })
        .collect()
}

//prints the summaries in a formatted table
pub fn pretty_print_summary(windows: usize, summaries: &[ColumnSummary]) {
    let mut table = Table::new();

    table.add_row(Row::new(vec![
        Cell::new(&format!("Metric ({} windows)", windows)),
        Cell::new("Median"),
        Cell::new("Average"),
    ]));

    for summary in summaries {
        table.add_row(Row::new(vec![
            Cell::new(summary.name),
            Cell::new(&format!("{:.4}", summary.median)),
            Cell::new(&format!("{:.4}", summary.mean)),
        ]));
    }

    table.printstd();
}
