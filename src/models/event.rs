use chrono::NaiveDateTime;
use serde::Serialize;

/// A game night or tournament hosted by a bar.
#[derive(Clone, Debug, Serialize)]
pub struct Event {
    pub id: Option<i64>,
    pub bar_id: i64,
    pub name: String,
    pub description: String,
    pub date: NaiveDateTime,
    /// Free-form article body, rendered by the frontend.
    pub article: String,
}
