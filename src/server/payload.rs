use serde::{Deserialize, Serialize};

use crate::models::address::Address;
use crate::models::bar::{Bar, Game};
use crate::models::event::Event;
use crate::timing::interval::Interval;
use crate::timing::weekday::WeekdayExt;
use crate::TIME_FORMAT;

/// One entry of the bar listing.
#[derive(Serialize)]
pub struct BarSummary {
    #[serde(flatten)]
    pub bar: Bar,
    pub schedule: String,
    pub published_recently: bool,
}

/// Everything the bar detail endpoint returns.
#[derive(Serialize)]
pub struct BarDetail {
    #[serde(flatten)]
    pub bar: Bar,
    pub address: Option<Address>,
    pub games: Vec<Game>,
    pub events: Vec<Event>,
    pub schedule: String,
    pub open_now: bool,
    pub published_recently: bool,
}

/// Body of POST /api/bar.
#[derive(Deserialize)]
pub struct NewBar {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub email: Option<String>,
    pub has_table_games: bool,
    pub has_video_games: bool,
    pub address_line_1: String,
    #[serde(default)]
    pub address_line_2: Option<String>,
    pub zip_code: u16,
    pub city: String,
    /// Names of the games on offer. Created on the fly when unknown.
    #[serde(default)]
    pub games: Vec<String>,
}

/// Body of POST /api/event.
#[derive(Deserialize)]
pub struct NewEvent {
    pub bar: i64,
    pub name: String,
    pub description: String,
    /// ISO 8601, local Belgian time.
    pub date: String,
    #[serde(default)]
    pub article: String,
}

/// Body of POST /api/schedule. A set `id` means editing a stored row.
#[derive(Deserialize)]
pub struct SchedulePayload {
    pub bar: i64,
    #[serde(default)]
    pub id: Option<i64>,
    pub day: u8,
    pub opens: String,
    pub closes: String,
}

/// Row shape of GET /api/schedule and the POST /api/schedule echo.
#[derive(Serialize)]
pub struct ScheduleRow {
    pub id: i64,
    pub day: u8,
    pub opens: String,
    pub closes: String,
}

impl ScheduleRow {
    pub fn new(id: i64, interval: &Interval) -> Self {
        Self {
            id,
            day: interval.day.index(),
            opens: interval.opens.format(TIME_FORMAT).to_string(),
            closes: interval.closes.format(TIME_FORMAT).to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct Created {
    pub id: i64,
}
