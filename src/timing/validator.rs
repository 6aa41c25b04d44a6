use chrono::Weekday;
use thiserror::Error;

use super::interval::Interval;
use super::weekday::WeekdayExt;

/// Why a schedule row was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Cannot open and close at the same time")]
    SameTimeOpenClose,
    #[error("Overlapping opening hours")]
    OverlappingHours,
}

/// Check a new or edited opening interval against the rest of the bar's
/// weekly schedule.
///
/// Opening hours past midnight are allowed, so the candidate is compared
/// against the previous and the next weekday as well as its own. When the
/// candidate carries the id of a stored row, it is an edit and the stored
/// version is left out of the comparison, whatever day it was on.
///
/// Nothing is written here. Callers fetch the bar's current rows, run this,
/// and only persist the candidate on `Ok`.
pub fn validate(candidate: &Interval, existing: &[Interval]) -> Result<(), ScheduleError> {
    if candidate.opens == candidate.closes {
        return Err(ScheduleError::SameTimeOpenClose);
    }

    let mut yesterday = day_intervals(candidate, existing, candidate.day.yesterday());
    let mut today = day_intervals(candidate, existing, candidate.day);
    let mut tomorrow = day_intervals(candidate, existing, candidate.day.tomorrow());

    today.push(*candidate);

    yesterday.sort_by_key(|interval| interval.opens);
    today.sort_by_key(|interval| interval.opens);
    tomorrow.sort_by_key(|interval| interval.opens);

    // Yesterday's last interval may end after midnight, running into today
    if let (Some(last), Some(first)) = (yesterday.last(), today.first()) {
        if last.crosses_midnight() && last.closes > first.opens {
            return Err(ScheduleError::OverlappingHours);
        }
    }

    for pair in today.windows(2) {
        if overlaps(&pair[0], &pair[1]) {
            return Err(ScheduleError::OverlappingHours);
        }
    }

    // Today's last interval may end after midnight, running into tomorrow
    if let (Some(last), Some(first)) = (today.last(), tomorrow.first()) {
        if last.crosses_midnight() && last.closes > first.opens {
            return Err(ScheduleError::OverlappingHours);
        }
    }

    Ok(())
}

/// The stored intervals for `day`, minus the old version of an edited row.
fn day_intervals(candidate: &Interval, existing: &[Interval], day: Weekday) -> Vec<Interval> {
    existing
        .iter()
        .filter(|interval| interval.day == day)
        .filter(|interval| candidate.id.is_none() || interval.id != candidate.id)
        .copied()
        .collect()
}

/// Whether two same-day intervals, sorted by opening time, overlap.
///
/// Two intervals opening at the same minute always clash. An interval that
/// runs past midnight covers the rest of its day, so anything opening later
/// that day clashes with it as well.
fn overlaps(earlier: &Interval, later: &Interval) -> bool {
    earlier.opens == later.opens || earlier.crosses_midnight() || earlier.closes > later.opens
}
