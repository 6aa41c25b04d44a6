use chrono::{NaiveDateTime, NaiveTime, Weekday};
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;

use crate::models::address::Address;
use crate::models::bar::{Bar, Game};
use crate::models::event::Event;
use crate::timing::interval::Interval;
use crate::timing::weekday::WeekdayExt;
use crate::{ISO_FORMAT, TIME_FORMAT};

type Connection = PooledConnection<SqliteConnectionManager>;

pub struct SqliteDatabase {}

impl SqliteDatabase {
    /**
    Create every table the directory needs. Idempotent.
    */
    pub fn create_tables(connection: &Connection) -> rusqlite::Result<()> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS bars (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL,
                email TEXT,
                has_table_games INTEGER NOT NULL,
                has_video_games INTEGER NOT NULL,
                date_added TEXT NOT NULL
            )",
            (),
        )?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS addresses (
                id INTEGER PRIMARY KEY,
                bar_id INTEGER NOT NULL UNIQUE REFERENCES bars(id),
                address_line_1 TEXT NOT NULL,
                address_line_2 TEXT,
                zip_code INTEGER NOT NULL,
                city TEXT NOT NULL
            )",
            (),
        )?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            )",
            (),
        )?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS bar_games (
                bar_id INTEGER NOT NULL REFERENCES bars(id),
                game_id INTEGER NOT NULL REFERENCES games(id),
                UNIQUE(bar_id, game_id)
            )",
            (),
        )?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS schedules (
                id INTEGER PRIMARY KEY,
                bar_id INTEGER NOT NULL REFERENCES bars(id),
                day INTEGER NOT NULL,
                opens TEXT NOT NULL,
                closes TEXT NOT NULL
            )",
            (),
        )?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY,
                bar_id INTEGER NOT NULL REFERENCES bars(id),
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                article TEXT NOT NULL
            )",
            (),
        )?;
        Ok(())
    }

    /**
    Insert a bar together with its address.

    Callers are expected to have run the model validations first.
    Returns the new bar's row id.
    */
    pub fn insert_bar(
        connection: &Connection,
        bar: &Bar,
        address: &Address,
    ) -> rusqlite::Result<i64> {
        connection.execute(
            "INSERT INTO bars (name, description, email, has_table_games, has_video_games, date_added)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                bar.name,
                bar.description,
                bar.email,
                bar.has_table_games,
                bar.has_video_games,
                bar.date_added.format(ISO_FORMAT).to_string(),
            ],
        )?;
        let bar_id = connection.last_insert_rowid();
        connection.execute(
            "INSERT INTO addresses (bar_id, address_line_1, address_line_2, zip_code, city)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                bar_id,
                address.address_line_1,
                address.address_line_2,
                address.zip_code,
                address.city,
            ],
        )?;
        Ok(bar_id)
    }

    /**
    Get every bar in the directory, ordered by name.
    */
    pub fn query_bars(connection: &Connection) -> rusqlite::Result<Vec<Bar>> {
        let mut statement = connection.prepare(
            "SELECT id, name, description, email, has_table_games, has_video_games, date_added
             FROM bars ORDER BY name",
        )?;
        let rows = statement.query_map((), Self::map_bar_row)?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row?);
        }
        Ok(bars)
    }

    /**
    Get a single bar by its exact name.

    Returns an `Ok(None)` if no bar carries that name.
    */
    pub fn query_bar_by_name(
        connection: &Connection,
        name: &str,
    ) -> rusqlite::Result<Option<Bar>> {
        let mut statement = connection.prepare(
            "SELECT id, name, description, email, has_table_games, has_video_games, date_added
             FROM bars WHERE name = ?1",
        )?;
        let mut rows = statement.query(rusqlite::params![name])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::map_bar_row(row)?)),
            None => Ok(None),
        }
    }

    /**
    Get a single bar by its row id.

    Returns an `Ok(None)` if the id is unknown.
    */
    pub fn query_bar(connection: &Connection, bar_id: i64) -> rusqlite::Result<Option<Bar>> {
        let mut statement = connection.prepare(
            "SELECT id, name, description, email, has_table_games, has_video_games, date_added
             FROM bars WHERE id = ?1",
        )?;
        let mut rows = statement.query(rusqlite::params![bar_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::map_bar_row(row)?)),
            None => Ok(None),
        }
    }

    fn map_bar_row(row: &rusqlite::Row) -> rusqlite::Result<Bar> {
        let date_added: String = row.get(6)?;
        Ok(Bar {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            email: row.get(3)?,
            has_table_games: row.get(4)?,
            has_video_games: row.get(5)?,
            // We wrote this column ourselves, it is always ISO formatted
            date_added: NaiveDateTime::parse_from_str(&date_added, ISO_FORMAT).unwrap(),
        })
    }

    /**
    Get the address of a bar.

    Returns an `Ok(None)` if the bar has no address yet.
    */
    pub fn query_address(
        connection: &Connection,
        bar_id: i64,
    ) -> rusqlite::Result<Option<Address>> {
        let mut statement = connection.prepare(
            "SELECT id, address_line_1, address_line_2, zip_code, city
             FROM addresses WHERE bar_id = ?1",
        )?;
        let mut rows = statement.query(rusqlite::params![bar_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(Address {
                id: Some(row.get(0)?),
                address_line_1: row.get(1)?,
                address_line_2: row.get(2)?,
                zip_code: row.get(3)?,
                city: row.get(4)?,
            })),
            None => Ok(None),
        }
    }

    /**
    Get every opening interval of a bar, across the whole week.

    This is the snapshot the schedule validator runs against before any
    schedule row is written.
    */
    pub fn query_schedule(connection: &Connection, bar_id: i64) -> rusqlite::Result<Vec<Interval>> {
        let mut statement = connection.prepare(
            "SELECT id, day, opens, closes FROM schedules WHERE bar_id = ?1 ORDER BY day, opens",
        )?;
        let rows = statement.query_map(rusqlite::params![bar_id], |row| {
            let day: u8 = row.get(1)?;
            let opens: String = row.get(2)?;
            let closes: String = row.get(3)?;
            Ok(Interval::with_id(
                row.get(0)?,
                // Columns written by us are always well formed
                Weekday::from_index(day).unwrap(),
                NaiveTime::parse_from_str(&opens, TIME_FORMAT).unwrap(),
                NaiveTime::parse_from_str(&closes, TIME_FORMAT).unwrap(),
            ))
        })?;

        let mut intervals = Vec::new();
        for row in rows {
            intervals.push(row?);
        }
        Ok(intervals)
    }

    /**
    Insert one opening interval for a bar. Returns the new row id.
    */
    pub fn insert_schedule(
        connection: &Connection,
        bar_id: i64,
        interval: &Interval,
    ) -> rusqlite::Result<i64> {
        connection.execute(
            "INSERT INTO schedules (bar_id, day, opens, closes) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                bar_id,
                interval.day.index(),
                interval.opens.format(TIME_FORMAT).to_string(),
                interval.closes.format(TIME_FORMAT).to_string(),
            ],
        )?;
        Ok(connection.last_insert_rowid())
    }

    /**
    Overwrite a stored opening interval.
    */
    pub fn update_schedule(
        connection: &Connection,
        id: i64,
        interval: &Interval,
    ) -> rusqlite::Result<()> {
        connection.execute(
            "UPDATE schedules SET day = ?1, opens = ?2, closes = ?3 WHERE id = ?4",
            rusqlite::params![
                interval.day.index(),
                interval.opens.format(TIME_FORMAT).to_string(),
                interval.closes.format(TIME_FORMAT).to_string(),
                id,
            ],
        )?;
        Ok(())
    }

    /**
    Insert a game, or fetch its id when the name is already known.
    */
    pub fn insert_game(connection: &Connection, name: &str) -> rusqlite::Result<i64> {
        connection.execute(
            "INSERT OR IGNORE INTO games (name) VALUES (?1)",
            rusqlite::params![name],
        )?;
        let mut statement = connection.prepare("SELECT id FROM games WHERE name = ?1")?;
        statement.query_row(rusqlite::params![name], |row| row.get(0))
    }

    /**
    Mark a game as offered by a bar.
    */
    pub fn link_game(connection: &Connection, bar_id: i64, game_id: i64) -> rusqlite::Result<()> {
        connection.execute(
            "INSERT OR IGNORE INTO bar_games (bar_id, game_id) VALUES (?1, ?2)",
            rusqlite::params![bar_id, game_id],
        )?;
        Ok(())
    }

    /**
    Get the games a bar offers, ordered by name.
    */
    pub fn query_games(connection: &Connection, bar_id: i64) -> rusqlite::Result<Vec<Game>> {
        let mut statement = connection.prepare(
            "SELECT games.id, games.name FROM games
             JOIN bar_games ON bar_games.game_id = games.id
             WHERE bar_games.bar_id = ?1 ORDER BY games.name",
        )?;
        let rows = statement.query_map(rusqlite::params![bar_id], |row| {
            Ok(Game {
                id: Some(row.get(0)?),
                name: row.get(1)?,
            })
        })?;

        let mut games = Vec::new();
        for row in rows {
            games.push(row?);
        }
        Ok(games)
    }

    /**
    Insert an event hosted by a bar. Returns the new row id.
    */
    pub fn insert_event(connection: &Connection, event: &Event) -> rusqlite::Result<i64> {
        connection.execute(
            "INSERT INTO events (bar_id, name, description, date, article)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                event.bar_id,
                event.name,
                event.description,
                event.date.format(ISO_FORMAT).to_string(),
                event.article,
            ],
        )?;
        Ok(connection.last_insert_rowid())
    }

    /**
    Get the events of a bar, soonest first.
    */
    pub fn query_events(connection: &Connection, bar_id: i64) -> rusqlite::Result<Vec<Event>> {
        let mut statement = connection.prepare(
            "SELECT id, bar_id, name, description, date, article
             FROM events WHERE bar_id = ?1 ORDER BY date",
        )?;
        let rows = statement.query_map(rusqlite::params![bar_id], |row| {
            let date: String = row.get(4)?;
            Ok(Event {
                id: Some(row.get(0)?),
                bar_id: row.get(1)?,
                name: row.get(2)?,
                description: row.get(3)?,
                date: NaiveDateTime::parse_from_str(&date, ISO_FORMAT).unwrap(),
                article: row.get(5)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::timing::belgium::belgium_datetime_now;

    fn test_connection() -> Connection {
        let manager = SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder().max_size(1).build(manager).unwrap();
        let connection = pool.get().unwrap();
        SqliteDatabase::create_tables(&connection).unwrap();
        connection
    }

    fn sample_bar() -> (Bar, Address) {
        let bar = Bar {
            id: None,
            name: "Outpost Gent".to_string(),
            description: "Tabletop nights every week".to_string(),
            email: Some("info@outpost.example".to_string()),
            has_table_games: true,
            has_video_games: false,
            date_added: belgium_datetime_now().naive_local(),
        };
        let address = Address {
            id: None,
            address_line_1: "Koning Albertlaan 5".to_string(),
            address_line_2: None,
            zip_code: 9000,
            city: "Gent".to_string(),
        };
        (bar, address)
    }

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn bars_round_trip_with_their_address() {
        let connection = test_connection();
        let (bar, address) = sample_bar();
        let bar_id = SqliteDatabase::insert_bar(&connection, &bar, &address).unwrap();

        let stored = SqliteDatabase::query_bar_by_name(&connection, "Outpost Gent")
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, Some(bar_id));
        assert_eq!(stored.email, bar.email);
        assert!(stored.has_table_games);
        assert!(!stored.has_video_games);

        let stored_address = SqliteDatabase::query_address(&connection, bar_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored_address.zip_code, 9000);
        assert_eq!(stored_address.city, "Gent");

        assert!(SqliteDatabase::query_bar_by_name(&connection, "Nope")
            .unwrap()
            .is_none());
    }

    #[test]
    fn schedules_round_trip_and_update() {
        let connection = test_connection();
        let (bar, address) = sample_bar();
        let bar_id = SqliteDatabase::insert_bar(&connection, &bar, &address).unwrap();

        let monday = Interval::new(Weekday::Mon, hm(19, 0), hm(3, 0));
        let id = SqliteDatabase::insert_schedule(&connection, bar_id, &monday).unwrap();

        let stored = SqliteDatabase::query_schedule(&connection, bar_id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, Some(id));
        assert_eq!(stored[0].day, Weekday::Mon);
        assert_eq!(stored[0].opens, hm(19, 0));
        assert_eq!(stored[0].closes, hm(3, 0));

        let moved = Interval::with_id(id, Weekday::Tue, hm(18, 0), hm(23, 30));
        SqliteDatabase::update_schedule(&connection, id, &moved).unwrap();
        let stored = SqliteDatabase::query_schedule(&connection, bar_id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].day, Weekday::Tue);
        assert_eq!(stored[0].closes, hm(23, 30));
    }

    #[test]
    fn games_are_shared_and_linked_once() {
        let connection = test_connection();
        let (bar, address) = sample_bar();
        let bar_id = SqliteDatabase::insert_bar(&connection, &bar, &address).unwrap();

        let chess = SqliteDatabase::insert_game(&connection, "Chess").unwrap();
        let again = SqliteDatabase::insert_game(&connection, "Chess").unwrap();
        assert_eq!(chess, again);

        SqliteDatabase::link_game(&connection, bar_id, chess).unwrap();
        SqliteDatabase::link_game(&connection, bar_id, chess).unwrap();

        let games = SqliteDatabase::query_games(&connection, bar_id).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].name, "Chess");
    }

    #[test]
    fn events_round_trip() {
        let connection = test_connection();
        let (bar, address) = sample_bar();
        let bar_id = SqliteDatabase::insert_bar(&connection, &bar, &address).unwrap();

        let event = Event {
            id: None,
            bar_id,
            name: "Catan tournament".to_string(),
            description: "Monthly tournament, bring your own dice".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 14)
                .unwrap()
                .and_hms_opt(19, 30, 0)
                .unwrap(),
            article: "<p>Sign up at the counter.</p>".to_string(),
        };
        SqliteDatabase::insert_event(&connection, &event).unwrap();

        let events = SqliteDatabase::query_events(&connection, bar_id).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Catan tournament");
        assert_eq!(events[0].date, event.date);
    }
}
