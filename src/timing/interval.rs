use chrono::{NaiveTime, Weekday};

use crate::TIME_FORMAT;

/// A single day's opening period for a bar.
///
/// Opening hours past midnight are allowed: when `opens >= closes`, the bar
/// closes on the following day. An interval where both times are equal is
/// invalid and rejected by the validator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    /// Row id of a stored interval. `None` until the row is written.
    pub id: Option<i64>,
    pub day: Weekday,
    pub opens: NaiveTime,
    pub closes: NaiveTime,
}

impl Interval {
    pub fn new(day: Weekday, opens: NaiveTime, closes: NaiveTime) -> Self {
        Self {
            id: None,
            day,
            opens,
            closes,
        }
    }

    pub fn with_id(id: i64, day: Weekday, opens: NaiveTime, closes: NaiveTime) -> Self {
        Self {
            id: Some(id),
            day,
            opens,
            closes,
        }
    }

    /// Whether the closing time falls past midnight, on the next day.
    pub fn crosses_midnight(&self) -> bool {
        self.opens >= self.closes
    }

    /// Whether `time` falls within the interval on its own day.
    ///
    /// The part spilling past midnight belongs to the next day and is not
    /// covered here.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.crosses_midnight() {
            time >= self.opens
        } else {
            self.opens <= time && time < self.closes
        }
    }

    pub fn from_to_str(&self) -> String {
        format!(
            "{} - {}",
            self.opens.format(TIME_FORMAT),
            self.closes.format(TIME_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn detects_intervals_past_midnight() {
        assert!(Interval::new(Weekday::Mon, hm(19, 0), hm(3, 0)).crosses_midnight());
        assert!(!Interval::new(Weekday::Mon, hm(9, 0), hm(12, 30)).crosses_midnight());
    }

    #[test]
    fn contains_is_half_open() {
        let interval = Interval::new(Weekday::Mon, hm(9, 0), hm(12, 30));
        assert!(interval.contains(hm(9, 0)));
        assert!(interval.contains(hm(12, 29)));
        assert!(!interval.contains(hm(12, 30)));
        assert!(!interval.contains(hm(8, 59)));
    }

    #[test]
    fn contains_covers_the_evening_side_of_a_midnight_interval() {
        let interval = Interval::new(Weekday::Mon, hm(19, 0), hm(3, 0));
        assert!(interval.contains(hm(23, 59)));
        assert!(interval.contains(hm(19, 0)));
        // 02:00 belongs to tuesday, not to this monday interval
        assert!(!interval.contains(hm(2, 0)));
    }

    #[test]
    fn formats_with_minute_precision() {
        let interval = Interval::new(Weekday::Mon, hm(9, 0), hm(12, 30));
        assert_eq!(interval.from_to_str(), "09:00 - 12:30");
    }
}
