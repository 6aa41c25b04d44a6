use chrono::Weekday;

/// The week in display order, Monday first.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Schedule helpers on top of chrono's weekday.
///
/// The database and the API exchange days as integers, Monday being 0 and
/// Sunday being 6. Day arithmetic wraps around the week in both directions.
pub trait WeekdayExt {
    fn label(&self) -> &'static str;
    fn yesterday(&self) -> Weekday;
    fn tomorrow(&self) -> Weekday;
    fn index(&self) -> u8;
    fn from_index(index: u8) -> Option<Weekday>;
}

impl WeekdayExt for Weekday {
    /// Full english day name, the way schedules are displayed.
    fn label(&self) -> &'static str {
        match self {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }

    fn yesterday(&self) -> Weekday {
        self.pred()
    }

    fn tomorrow(&self) -> Weekday {
        self.succ()
    }

    fn index(&self) -> u8 {
        self.num_days_from_monday() as u8
    }

    fn from_index(index: u8) -> Option<Weekday> {
        match index {
            0 => Some(Weekday::Mon),
            1 => Some(Weekday::Tue),
            2 => Some(Weekday::Wed),
            3 => Some(Weekday::Thu),
            4 => Some(Weekday::Fri),
            5 => Some(Weekday::Sat),
            6 => Some(Weekday::Sun),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_arithmetic_wraps_around_the_week() {
        assert_eq!(Weekday::Mon.yesterday(), Weekday::Sun);
        assert_eq!(Weekday::Sun.tomorrow(), Weekday::Mon);
        assert_eq!(Weekday::Wed.yesterday(), Weekday::Tue);
        assert_eq!(Weekday::Wed.tomorrow(), Weekday::Thu);
    }

    #[test]
    fn index_round_trips() {
        for (index, day) in WEEK.iter().enumerate() {
            assert_eq!(day.index(), index as u8);
            assert_eq!(Weekday::from_index(index as u8), Some(*day));
        }
        assert_eq!(Weekday::from_index(7), None);
    }

    #[test]
    fn labels_are_full_names() {
        assert_eq!(Weekday::Mon.label(), "Monday");
        assert_eq!(Weekday::Sun.label(), "Sunday");
    }
}
