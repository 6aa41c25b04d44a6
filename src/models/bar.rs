use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use super::ValidationError;
use crate::timing::belgium::belgium_datetime_now;

/// A bar listed in the directory.
#[derive(Clone, Debug, Serialize)]
pub struct Bar {
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub email: Option<String>,
    pub has_table_games: bool,
    pub has_video_games: bool,
    pub date_added: NaiveDateTime,
}

impl Bar {
    /// A bar with nothing to play has no place in the directory.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.has_table_games || self.has_video_games) {
            return Err(ValidationError::BarWithoutGames);
        }
        Ok(())
    }

    pub fn published_recently(&self) -> bool {
        self.date_added >= belgium_datetime_now().naive_local() - Duration::days(1)
    }
}

/// A game a bar can offer. Shared between bars.
#[derive(Clone, Debug, Serialize)]
pub struct Game {
    pub id: Option<i64>,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(has_table_games: bool, has_video_games: bool) -> Bar {
        Bar {
            id: None,
            name: "Le Dragon Barbu".to_string(),
            description: "Board games and belgian beers".to_string(),
            email: None,
            has_table_games,
            has_video_games,
            date_added: belgium_datetime_now().naive_local(),
        }
    }

    #[test]
    fn a_bar_needs_at_least_one_kind_of_games() {
        assert_eq!(
            bar(false, false).validate(),
            Err(ValidationError::BarWithoutGames)
        );
        assert_eq!(bar(true, false).validate(), Ok(()));
        assert_eq!(bar(false, true).validate(), Ok(()));
        assert_eq!(bar(true, true).validate(), Ok(()));
    }

    #[test]
    fn freshly_added_bars_are_recent() {
        let mut fresh = bar(true, false);
        assert!(fresh.published_recently());

        fresh.date_added = fresh.date_added - Duration::days(2);
        assert!(!fresh.published_recently());
    }
}
