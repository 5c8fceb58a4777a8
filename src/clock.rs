use std::time::{SystemTime, UNIX_EPOCH};

use time::{OffsetDateTime, UtcOffset};

/// Milliseconds since the Unix epoch; the id space for categories and notes.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Fixed-width UTC stamp used for `createdAt`/`updatedAt`. Lexical ordering of
/// these strings is the recency ordering, so the format never varies.
pub fn note_timestamp(now: OffsetDateTime) -> String {
    let utc = now.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        utc.year(),
        u8::from(utc.month()),
        utc.day(),
        utc.hour(),
        utc.minute(),
        utc.second()
    )
}

/// Stamp appended to backup filenames, rendered in the configured offset.
pub fn backup_stamp(now: OffsetDateTime, offset: UtcOffset) -> String {
    let local = now.to_offset(offset);
    format!(
        "{:04}{:02}{:02}-{:02}{:02}{:02}",
        local.year(),
        u8::from(local.month()),
        local.day(),
        local.hour(),
        local.minute(),
        local.second()
    )
}

/// Human-readable local stamp, the default title for notes created without one.
pub fn title_stamp(now: OffsetDateTime, offset: UtcOffset) -> String {
    let local = now.to_offset(offset);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        local.year(),
        u8::from(local.month()),
        local.day(),
        local.hour(),
        local.minute(),
        local.second()
    )
}

/// Parses an offset of the form `+13:00` / `-05:30`, or `Z` for UTC.
pub fn parse_offset(raw: &str) -> Option<UtcOffset> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("z") {
        return Some(UtcOffset::UTC);
    }

    let (sign, rest) = match trimmed.as_bytes()[0] {
        b'+' => (1i8, &trimmed[1..]),
        b'-' => (-1i8, &trimmed[1..]),
        _ => (1i8, trimmed),
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i8 = hours.parse().ok()?;
    let minutes: i8 = minutes.parse().ok()?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}
