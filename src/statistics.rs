//! Completion statistics, and the bar chart computed from them

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Statistics over a number of past days, as returned by the server
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default)]
    pub completed_count: u64,
    /// Number of completed todos per day. Days with no completion may be missing
    #[serde(default)]
    pub daily_stats: BTreeMap<NaiveDate, u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartBar {
    pub date: NaiveDate,
    pub count: u64,
    /// Bar height, between 0 and 100
    pub height_percent: f64,
}

impl ChartBar {
    /// The label shown under the bar (the day of month)
    pub fn label(&self) -> String {
        self.date.day().to_string()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatisticsChart {
    pub completed_count: u64,
    pub bars: Vec<ChartBar>,
}

impl StatisticsChart {
    /// Chart the `max_bars` most recent days of `stats`.
    ///
    /// Heights are relative to the highest daily count of the whole statistics (not only of the
    /// displayed days), with a floor of 1. A period without any activity thus renders flat bars
    /// rather than nothing.
    pub fn new(stats: &Statistics, max_bars: usize) -> Self {
        let max_count = stats.daily_stats.values().copied().max().unwrap_or(0).max(1);

        let skip = stats.daily_stats.len().saturating_sub(max_bars);
        let bars = stats.daily_stats.iter()
            .skip(skip)
            .map(|(date, count)| ChartBar {
                date: *date,
                count: *count,
                height_percent: *count as f64 / max_count as f64 * 100.0,
            })
            .collect();

        Self {
            completed_count: stats.completed_count,
            bars,
        }
    }
}
