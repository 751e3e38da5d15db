use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//date format used on the command line, in window labels and in engine timeranges
pub const DATE_FORMAT: &str = "%Y%m%d";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PartitionError {
    #[error("Invalid date '{0}', expected YYYYMMDD")]
    InvalidDate(String),
    #[error("Split count must be greater than zero")]
    ZeroSplit,
    #[error("Period must be at least one day")]
    ZeroPeriod,
    #[error("Window starting {0} runs past the last representable date")]
    OutOfRange(NaiveDate),
}

//a contiguous calendar sub-range of the overall backtest period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateWindow { start, end }
    }

    //label used as the first column of a report row ("20200101-20200131")
    pub fn label(&self) -> String {
        format!(
            "{}-{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }

    //timerange expression passed to the backtest engine, same shape as the label
    pub fn timerange(&self) -> String {
        self.label()
    }

    //number of calendar days covered
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

//parses a YYYYMMDD date
pub fn parse_date(s: &str) -> Result<NaiveDate, PartitionError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| PartitionError::InvalidDate(s.to_string()))
}

//splits [start, end] into an ordered sequence of windows
//
//with a split count the range is cut into `split` windows of floor(total / split)
//days and the last window is stretched (or shrunk) to end exactly at `end`.
//without one, windows of `period_days` are emitted until the cursor reaches `end`;
//the last of those is not clamped and may run past `end`.
pub fn partition(
    start: NaiveDate,
    end: NaiveDate,
    period_days: u32,
    split: Option<u32>,
) -> Result<Vec<DateWindow>, PartitionError> {
    match split {
        Some(0) => return Err(PartitionError::ZeroSplit),
        None if period_days == 0 => return Err(PartitionError::ZeroPeriod),
        _ => {}
    }

    if end <= start {
        return Ok(Vec::new());
    }

    let windows = match split {
        Some(count) => split_windows(start, end, count),
        None => period_windows(start, end, period_days)?,
    };

    Ok(windows)
}

fn split_windows(start: NaiveDate, end: NaiveDate, count: u32) -> Vec<DateWindow> {
    let total_days = (end - start).num_days();
    let sub_length = total_days / count as i64;

    let mut windows: Vec<DateWindow> = (0..count as i64)
        .map(|i| {
            let sub_start = start + Duration::days(i * sub_length);
            DateWindow::new(sub_start, sub_start + Duration::days(sub_length))
        })
        .collect();

    //remainder days land in the last window
    if let Some(last) = windows.last_mut() {
        last.end = end;
    }

    windows
}

fn period_windows(
    start: NaiveDate,
    end: NaiveDate,
    period_days: u32,
) -> Result<Vec<DateWindow>, PartitionError> {
    let step = Duration::days(period_days as i64);
    let mut windows = Vec::new();
    let mut current = start;

    while current < end {
        let window_end = current
            .checked_add_signed(step)
            .ok_or(PartitionError::OutOfRange(current))?;
        windows.push(DateWindow::new(current, window_end));
        current = window_end;
    }

    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn labels(windows: &[DateWindow]) -> Vec<String> {
        windows.iter().map(|w| w.label()).collect()
    }

    #[test]
    fn test_period_windows_overrun_end() {
        let windows = partition(d("20200101"), d("20200401"), 30, None).unwrap();

        assert_eq!(
            labels(&windows),
            vec![
                "20200101-20200131",
                "20200131-20200301",
                "20200301-20200331",
                "20200331-20200430",
            ]
        );
    }

    #[test]
    fn test_period_windows_are_contiguous() {
        let windows = partition(d("20210305"), d("20220117"), 17, None).unwrap();

        assert!(!windows.is_empty());
        assert_eq!(windows[0].start, d("20210305"));
        for pair in windows.windows(2) {
            assert_eq!(pair[1].start, pair[0].end);
        }
        let last = windows.last().unwrap();
        assert!(last.start < d("20220117"));
        assert!(last.end >= d("20220117"));
    }

    #[test]
    fn test_period_divides_evenly() {
        let windows = partition(d("20200101"), d("20200111"), 5, None).unwrap();
        assert_eq!(labels(&windows), vec!["20200101-20200106", "20200106-20200111"]);
    }

    #[test]
    fn test_split_forces_last_end() {
        let windows = partition(d("20200101"), d("20200401"), 30, Some(3)).unwrap();

        //91 days / 3 = 30 days per window, one remainder day absorbed by the last
        assert_eq!(
            labels(&windows),
            vec![
                "20200101-20200131",
                "20200131-20200301",
                "20200301-20200401",
            ]
        );
    }

    #[test]
    fn test_split_count_and_coverage() {
        for count in 1..=12 {
            let windows = partition(d("20190110"), d("20200613"), 30, Some(count)).unwrap();
            assert_eq!(windows.len(), count as usize);
            assert_eq!(windows.last().unwrap().end, d("20200613"));
            assert_eq!(windows[0].start, d("20190110"));
        }
    }

    #[test]
    fn test_split_overrides_period() {
        let with_period = partition(d("20200101"), d("20200401"), 7, Some(2)).unwrap();
        let without = partition(d("20200101"), d("20200401"), 90, Some(2)).unwrap();
        assert_eq!(with_period, without);
    }

    #[test]
    fn test_split_larger_than_range() {
        //zero-length sub windows, last one still reaches the global end
        let windows = partition(d("20200101"), d("20200103"), 30, Some(4)).unwrap();
        assert_eq!(windows.len(), 4);
        assert_eq!(windows[0], DateWindow::new(d("20200101"), d("20200101")));
        assert_eq!(windows[3].end, d("20200103"));
    }

    #[test]
    fn test_degenerate_range_is_empty() {
        assert!(partition(d("20200101"), d("20200101"), 30, None).unwrap().is_empty());
        assert!(partition(d("20200201"), d("20200101"), 30, None).unwrap().is_empty());
        assert!(partition(d("20200201"), d("20200101"), 30, Some(2)).unwrap().is_empty());
    }

    #[test]
    fn test_zero_split_is_rejected() {
        //a zero split used to fall back to period mode, now it is a validation error
        assert_eq!(
            partition(d("20200101"), d("20200401"), 30, Some(0)),
            Err(PartitionError::ZeroSplit)
        );
    }

    #[test]
    fn test_zero_period_is_rejected() {
        assert_eq!(
            partition(d("20200101"), d("20200401"), 0, None),
            Err(PartitionError::ZeroPeriod)
        );
        //split mode ignores the period
        assert!(partition(d("20200101"), d("20200401"), 0, Some(2)).is_ok());
    }

    #[test]
    fn test_huge_period_is_out_of_range() {
        assert_eq!(
            partition(d("20200101"), d("20200401"), 100_000_000, None),
            Err(PartitionError::OutOfRange(d("20200101")))
        );
    }

    #[test]
    fn test_period_past_range_end_is_one_window() {
        //a period far longer than the range still fits the calendar
        let windows = partition(d("20200101"), d("20200401"), 36_500, None).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, d("20200101"));
        assert!(windows[0].end > d("21190101"));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(d("20240925"), NaiveDate::from_ymd_opt(2024, 9, 25).unwrap());
        assert!(matches!(
            parse_date("2024-09-25"),
            Err(PartitionError::InvalidDate(_))
        ));
        assert!(parse_date("20240231").is_err());
    }

    #[test]
    fn test_window_display() {
        let window = DateWindow::new(d("20200302"), d("20200401"));
        assert_eq!(window.to_string(), "20200302-20200401");
        assert_eq!(window.timerange(), "20200302-20200401");
        assert_eq!(window.days(), 30);
    }
}
