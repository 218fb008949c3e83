//! Filter builders for historical queries.
//!
//! Historical endpoints take a `filter` query parameter holding a JSON
//! object; the exchange matches its keys against record fields, with
//! dotted `timestamp.*` keys selecting calendar granularities.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

/// Match records from one calendar day.
pub fn daily_filter(year: i32, month: u32, day: u32) -> Value {
    json!({ "timestamp.date": format!("{year:04}-{month:02}-{day:02}") })
}

/// Match records from one hour of a day.
pub fn hourly_filter(year: i32, month: u32, day: u32, hour: u32) -> Value {
    let mut filter = daily_filter(year, month, day);
    filter["timestamp.hh"] = json!(format!("{hour:02}"));
    filter
}

/// Match records from one minute of an hour.
pub fn minutely_filter(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Value {
    let mut filter = hourly_filter(year, month, day, hour);
    filter["timestamp.uu"] = json!(format!("{minute:02}"));
    filter
}

/// Match records inside a start/end window; absent bounds are omitted.
pub fn time_range_filter(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Value {
    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
    let mut filter = Map::new();
    if let Some(start) = start {
        filter.insert("startTime".to_string(), json!(start.format(FORMAT).to_string()));
    }
    if let Some(end) = end {
        filter.insert("endTime".to_string(), json!(end.format(FORMAT).to_string()));
    }
    Value::Object(filter)
}
