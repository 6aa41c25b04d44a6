use bytes::Bytes;
use chrono::{NaiveDateTime, NaiveTime, Weekday};
use http_body_util::{BodyExt, Full};
use hyper::{body::Incoming, service::Service, Method, Request, Response, StatusCode};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use regex::Regex;
use serde::Serialize;
use url_escape::decode;

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use crate::database::sqlite::SqliteDatabase;
use crate::models::address::Address;
use crate::models::bar::Bar;
use crate::models::event::Event;
use crate::timing::belgium::belgium_datetime_now;
use crate::timing::interval::Interval;
use crate::timing::validator::validate;
use crate::timing::week::WeekSchedule;
use crate::timing::weekday::WeekdayExt;
use crate::{ISO_FORMAT, TIME_FORMAT};

use super::payload::{
    BarDetail, BarSummary, Created, NewBar, NewEvent, SchedulePayload, ScheduleRow,
};

/// The Server
///
/// This is THE struct that handles all API endpoints and the business logic.
/// The actual querying part is handled by functions from `SqliteDatabase`.
///
/// This struct implements the `Service` trait from `hyper` which allows it to
/// be used as a hyper service. For each TCP connection or Client, a new task
/// handles that request, so the struct is cloned per connection.
///
/// Schedule writes go through the overlap validator first. The row is only
/// written when validation passes, on the same pooled connection that read
/// the snapshot.
#[derive(Clone)]
pub struct Server {
    connection_pool: Arc<Pool<SqliteConnectionManager>>,
    name_sanitizer: Regex,
}

impl Server {
    pub fn setup(connection_pool: Arc<Pool<SqliteConnectionManager>>) -> Self {
        Self {
            connection_pool,
            // Bar names: letters, digits, spaces and a few punctuation marks
            name_sanitizer: Regex::new(r"^[\w&' \-]+$").unwrap(),
        }
    }

    /// Parses the query parameters and returns a `hashmap` of key pair values
    /// Returns `None` if the parameters are malformed
    fn parse_params(text: &str) -> Option<HashMap<String, String>> {
        let mut map: HashMap<String, String> = HashMap::new();
        for pairs in text.split('&') {
            let mut iterator = pairs.split('=');
            map.insert(
                iterator.next()?.to_string(),
                decode(iterator.next()?).to_string(),
            );
        }
        Some(map)
    }

    /// Obtain a connection from the connection pool.
    fn get_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, String> {
        match self.connection_pool.get() {
            Err(err) => Err(format!("Could not get connection - Server.\n{}", err)),
            Ok(conn) => Ok(conn),
        }
    }

    /// The /api/bars API endpoint.
    ///
    /// Lists every bar in the directory with its rendered weekly schedule.
    fn list_bars(&self) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let connection = match self.get_connection() {
            Ok(conn) => conn,
            Err(err) => return Self::server_error(&err),
        };

        let bars = match SqliteDatabase::query_bars(&connection) {
            Ok(bars) => bars,
            Err(err) => return Self::server_error(&err.to_string()),
        };
        if bars.is_empty() {
            return Self::no_data();
        }

        let mut summaries = Vec::with_capacity(bars.len());
        for bar in bars {
            let Some(bar_id) = bar.id else { continue };
            let intervals = match SqliteDatabase::query_schedule(&connection, bar_id) {
                Ok(intervals) => intervals,
                Err(err) => return Self::server_error(&err.to_string()),
            };
            summaries.push(BarSummary {
                schedule: WeekSchedule::new(intervals).render(),
                published_recently: bar.published_recently(),
                bar,
            });
        }
        Self::ok_data(summaries)
    }

    /// The /api/bar API endpoint.
    ///
    /// Takes a `name` query parameter and returns the bar's full page data:
    /// address, games, events, rendered schedule and whether it is open
    /// right now (Brussels time).
    fn bar_detail(&self, req: Request<Incoming>) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let connection = match self.get_connection() {
            Ok(conn) => conn,
            Err(err) => return Self::server_error(&err),
        };

        let Some(params) = req.uri().query() else {
            return Self::bad_request("Parameters not provided. Required name.");
        };
        let Some(map) = Self::parse_params(params) else {
            return Self::bad_request("Malformed Parameters.");
        };
        let Some(name) = map.get("name") else {
            return Self::bad_request("name not provided.");
        };
        if !self.name_sanitizer.is_match(name) {
            return Self::bad_request("Malformed Name");
        }

        let bar = match SqliteDatabase::query_bar_by_name(&connection, name) {
            Ok(Some(bar)) => bar,
            Ok(None) => return Self::not_found("No bar with that name."),
            Err(err) => return Self::server_error(&err.to_string()),
        };
        let Some(bar_id) = bar.id else {
            return Self::server_error("Bar row without an id");
        };

        let intervals = match SqliteDatabase::query_schedule(&connection, bar_id) {
            Ok(intervals) => intervals,
            Err(err) => return Self::server_error(&err.to_string()),
        };
        let address = match SqliteDatabase::query_address(&connection, bar_id) {
            Ok(address) => address,
            Err(err) => return Self::server_error(&err.to_string()),
        };
        let games = match SqliteDatabase::query_games(&connection, bar_id) {
            Ok(games) => games,
            Err(err) => return Self::server_error(&err.to_string()),
        };
        let events = match SqliteDatabase::query_events(&connection, bar_id) {
            Ok(events) => events,
            Err(err) => return Self::server_error(&err.to_string()),
        };

        let week = WeekSchedule::new(intervals);
        let detail = BarDetail {
            schedule: week.render(),
            open_now: week.is_open(belgium_datetime_now()),
            published_recently: bar.published_recently(),
            address,
            games,
            events,
            bar,
        };
        Self::ok_data(detail)
    }

    /// The GET /api/schedule API endpoint.
    ///
    /// Takes a `bar` query parameter (row id) and returns the bar's raw
    /// schedule rows.
    fn schedule_rows(&self, req: Request<Incoming>) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let connection = match self.get_connection() {
            Ok(conn) => conn,
            Err(err) => return Self::server_error(&err),
        };

        let Some(params) = req.uri().query() else {
            return Self::bad_request("Parameters not provided. Required bar.");
        };
        let Some(map) = Self::parse_params(params) else {
            return Self::bad_request("Malformed Parameters.");
        };
        let Some(bar_id) = map.get("bar") else {
            return Self::bad_request("bar not provided.");
        };
        let Ok(bar_id) = bar_id.parse::<i64>() else {
            return Self::bad_request("bar must be a row id.");
        };

        match SqliteDatabase::query_bar(&connection, bar_id) {
            Ok(Some(_)) => (),
            Ok(None) => return Self::not_found("No bar with that id."),
            Err(err) => return Self::server_error(&err.to_string()),
        }

        let intervals = match SqliteDatabase::query_schedule(&connection, bar_id) {
            Ok(intervals) => intervals,
            Err(err) => return Self::server_error(&err.to_string()),
        };
        let rows: Vec<ScheduleRow> = intervals
            .iter()
            .filter_map(|interval| interval.id.map(|id| ScheduleRow::new(id, interval)))
            .collect();
        Self::ok_data(rows)
    }

    /// The POST /api/schedule API endpoint.
    ///
    /// Creates or edits one opening interval. The bar's current schedule is
    /// read first and the candidate validated against it; overlapping or
    /// degenerate hours come back as a 400 with the reason.
    async fn upsert_schedule(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let connection = match self.get_connection() {
            Ok(conn) => conn,
            Err(err) => return Self::server_error(&err),
        };

        let body = req.into_body().collect().await?.to_bytes();
        let payload: SchedulePayload = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(err) => return Self::bad_request(&format!("Malformed body. {}", err)),
        };

        let Some(day) = Weekday::from_index(payload.day) else {
            return Self::bad_request("day must be 0 (Monday) through 6 (Sunday).");
        };
        let Ok(opens) = NaiveTime::parse_from_str(&payload.opens, TIME_FORMAT) else {
            return Self::bad_request("Malformed opens time. Expected HH:MM.");
        };
        let Ok(closes) = NaiveTime::parse_from_str(&payload.closes, TIME_FORMAT) else {
            return Self::bad_request("Malformed closes time. Expected HH:MM.");
        };

        match SqliteDatabase::query_bar(&connection, payload.bar) {
            Ok(Some(_)) => (),
            Ok(None) => return Self::not_found("No bar with that id."),
            Err(err) => return Self::server_error(&err.to_string()),
        }

        let candidate = match payload.id {
            Some(id) => Interval::with_id(id, day, opens, closes),
            None => Interval::new(day, opens, closes),
        };
        let existing = match SqliteDatabase::query_schedule(&connection, payload.bar) {
            Ok(intervals) => intervals,
            Err(err) => return Self::server_error(&err.to_string()),
        };
        if let Err(err) = validate(&candidate, &existing) {
            return Self::bad_request(&err.to_string());
        }

        let id = match candidate.id {
            Some(id) => match SqliteDatabase::update_schedule(&connection, id, &candidate) {
                Ok(()) => id,
                Err(err) => return Self::server_error(&err.to_string()),
            },
            None => match SqliteDatabase::insert_schedule(&connection, payload.bar, &candidate) {
                Ok(id) => id,
                Err(err) => return Self::server_error(&err.to_string()),
            },
        };
        Self::ok_data(ScheduleRow::new(id, &candidate))
    }

    /// The POST /api/bar API endpoint.
    ///
    /// Creates a bar together with its address. Model validation failures
    /// (no games at all, zip code out of the Belgian range) come back as a
    /// 400 with the reason.
    async fn create_bar(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let connection = match self.get_connection() {
            Ok(conn) => conn,
            Err(err) => return Self::server_error(&err),
        };

        let body = req.into_body().collect().await?.to_bytes();
        let payload: NewBar = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(err) => return Self::bad_request(&format!("Malformed body. {}", err)),
        };
        if !self.name_sanitizer.is_match(&payload.name) {
            return Self::bad_request("Malformed Name");
        }

        let bar = Bar {
            id: None,
            name: payload.name,
            description: payload.description,
            email: payload.email,
            has_table_games: payload.has_table_games,
            has_video_games: payload.has_video_games,
            date_added: belgium_datetime_now().naive_local(),
        };
        let address = Address {
            id: None,
            address_line_1: payload.address_line_1,
            address_line_2: payload.address_line_2,
            zip_code: payload.zip_code,
            city: payload.city,
        };
        if let Err(err) = bar.validate() {
            return Self::bad_request(&err.to_string());
        }
        if let Err(err) = address.validate() {
            return Self::bad_request(&err.to_string());
        }

        let bar_id = match SqliteDatabase::insert_bar(&connection, &bar, &address) {
            Ok(id) => id,
            Err(err) => return Self::server_error(&err.to_string()),
        };
        for game in &payload.games {
            let game_id = match SqliteDatabase::insert_game(&connection, game) {
                Ok(id) => id,
                Err(err) => return Self::server_error(&err.to_string()),
            };
            if let Err(err) = SqliteDatabase::link_game(&connection, bar_id, game_id) {
                return Self::server_error(&err.to_string());
            }
        }
        Self::ok_data(Created { id: bar_id })
    }

    /// The POST /api/event API endpoint.
    ///
    /// Registers a game night or tournament for an existing bar.
    async fn create_event(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let connection = match self.get_connection() {
            Ok(conn) => conn,
            Err(err) => return Self::server_error(&err),
        };

        let body = req.into_body().collect().await?.to_bytes();
        let payload: NewEvent = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(err) => return Self::bad_request(&format!("Malformed body. {}", err)),
        };
        let Ok(date) = NaiveDateTime::parse_from_str(&payload.date, ISO_FORMAT) else {
            return Self::bad_request("Malformed date. Expected ISO 8601.");
        };

        match SqliteDatabase::query_bar(&connection, payload.bar) {
            Ok(Some(_)) => (),
            Ok(None) => return Self::not_found("No bar with that id."),
            Err(err) => return Self::server_error(&err.to_string()),
        }

        let event = Event {
            id: None,
            bar_id: payload.bar,
            name: payload.name,
            description: payload.description,
            date,
            article: payload.article,
        };
        match SqliteDatabase::insert_event(&connection, &event) {
            Ok(id) => Self::ok_data(Created { id }),
            Err(err) => Self::server_error(&err.to_string()),
        }
    }

    /// Return a 200 OK response with the data provided.
    fn ok_data<T: Serialize>(body: T) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let data = serde_json::to_string(&body).unwrap();
        let res = Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from(data)))
            .unwrap();
        Ok(res)
    }

    /// Return a 500 Internal Server Error response with the message provided.
    fn server_error(message: &str) -> Result<Response<Full<Bytes>>, hyper::Error> {
        log::error!("{}", message);
        let res = Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Full::new(Bytes::from(format!(
                "{{\"error\": \"{}\" }}",
                message
            ))))
            .unwrap();
        Ok(res)
    }

    /// Return a 404 Not Found response with the message provided. The message
    /// here is optional. Leave it empty for no message.
    fn not_found(message: &str) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let res = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(if message.is_empty() {
                Bytes::new()
            } else {
                Bytes::from(format!("{{\"error\": \"{}\" }}", message))
            }))
            .unwrap();
        Ok(res)
    }

    /// Return a 400 Bad Request response with the message provided.
    fn bad_request(message: &str) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let res = Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body(Full::new(Bytes::from(format!(
                "{{\"error\": \"{}\" }}",
                message
            ))))
            .unwrap();
        Ok(res)
    }

    /// Return a 204 No Content response.
    fn no_data() -> Result<Response<Full<Bytes>>, hyper::Error> {
        let res = Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Full::new(Bytes::new()))
            .unwrap();
        Ok(res)
    }
}

impl Service<Request<Incoming>> for Server {
    type Response = Response<Full<Bytes>>;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let server = self.clone();
        Box::pin(async move {
            match req.method() {
                &Method::GET => match req.uri().path() {
                    "/api/bars" => server.list_bars(),
                    "/api/bar" => server.bar_detail(req),
                    "/api/schedule" => server.schedule_rows(req),
                    _ => Server::not_found(""),
                },
                &Method::POST => match req.uri().path() {
                    "/api/bar" => server.create_bar(req).await,
                    "/api/schedule" => server.upsert_schedule(req).await,
                    "/api/event" => server.create_event(req).await,
                    _ => Server::not_found(""),
                },
                _ => Server::not_found(""),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_parameters() {
        let map = Server::parse_params("name=Le%20Dragon&bar=3").unwrap();
        assert_eq!(map.get("name").map(String::as_str), Some("Le Dragon"));
        assert_eq!(map.get("bar").map(String::as_str), Some("3"));
    }

    #[test]
    fn rejects_malformed_parameters() {
        assert!(Server::parse_params("name").is_none());
    }

    #[test]
    fn name_sanitizer_accepts_real_bar_names() {
        let pool = Arc::new(
            r2d2::Pool::builder()
                .max_size(1)
                .build(SqliteConnectionManager::memory())
                .unwrap(),
        );
        let server = Server::setup(pool);
        assert!(server.name_sanitizer.is_match("Le Dragon Barbu"));
        assert!(server.name_sanitizer.is_match("D&D Corner - Liège"));
        assert!(!server.name_sanitizer.is_match("a;DROP TABLE bars"));
        assert!(!server.name_sanitizer.is_match(""));
    }
}
