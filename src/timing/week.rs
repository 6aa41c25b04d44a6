use chrono::{DateTime, Datelike};
use chrono_tz::Tz;

use super::interval::Interval;
use super::weekday::{WeekdayExt, WEEK};

/// A bar's full weekly schedule, ordered by day and opening time.
#[derive(Clone, Debug, Default)]
pub struct WeekSchedule {
    intervals: Vec<Interval>,
}

impl WeekSchedule {
    pub fn new(mut intervals: Vec<Interval>) -> Self {
        intervals.sort_by_key(|interval| (interval.day.index(), interval.opens));
        Self { intervals }
    }

    /// Text version of the weekly schedule, one line per day.
    ///
    /// Days without any interval read "closed".
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(WEEK.len());
        for day in WEEK {
            let hours: Vec<String> = self
                .intervals
                .iter()
                .filter(|interval| interval.day == day)
                .map(Interval::from_to_str)
                .collect();
            let hours = if hours.is_empty() {
                "closed".to_string()
            } else {
                hours.join(", ")
            };
            lines.push(format!("{}: {}", day.label(), hours));
        }
        lines.join("\n")
    }

    /// Whether the bar is open at the given instant.
    ///
    /// An interval from the previous day may spill past midnight into the
    /// current one, so both days are checked.
    pub fn is_open(&self, at: DateTime<Tz>) -> bool {
        let day = at.weekday();
        let time = at.time();

        let open_today = self
            .intervals
            .iter()
            .filter(|interval| interval.day == day)
            .any(|interval| interval.contains(time));
        if open_today {
            return true;
        }

        self.intervals
            .iter()
            .filter(|interval| interval.day == day.yesterday())
            .any(|interval| interval.crosses_midnight() && time < interval.closes)
    }
}
