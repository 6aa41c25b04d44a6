use chrono::{DateTime, Local};
use chrono_tz::Tz;

pub fn belgium_datetime_now() -> DateTime<Tz> {
    let local_datetime = Local::now();
    let belgium_timezone: Tz = "Europe/Brussels".parse().unwrap();
    local_datetime.with_timezone(&belgium_timezone)
}
