//! Timestamp helpers: the API's `created_at` format, RFC 3339, and file-name dates.

use anyhow::{anyhow, Result};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// Parse the API form, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
pub fn parse_api_timestamp(s: &str) -> Result<OffsetDateTime> {
    let fmt = format_description!(
        "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]"
    );
    OffsetDateTime::parse(s.trim(), &fmt).map_err(|e| anyhow!("invalid timestamp '{s}': {e}"))
}

/// Parse either the API form or RFC 3339 (what normalized rows are written as).
pub fn parse_timestamp(s: &str) -> Result<OffsetDateTime> {
    let s = s.trim();
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(dt);
    }
    parse_api_timestamp(s)
}

pub fn format_rfc3339(dt: OffsetDateTime) -> String {
    // Rfc3339 formatting only fails for years outside 0..=9999.
    dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string())
}

/// Today's date in the local offset, or UTC when the offset can't be determined.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// `YYYY-MM-DD`
pub fn date_stamp(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

pub fn parse_date_stamp(s: &str) -> Option<Date> {
    let fmt = format_description!("[year]-[month]-[day]");
    Date::parse(s, &fmt).ok()
}
