//! ISO-8601 rendering and parsing for temporal values.
//!
//! Rendering is canonical: seconds are always present, the fraction only when it is
//! non-zero (six digits for whole microseconds, nine otherwise), and the offset only
//! for offset-aware values. Parsing also accepts a space separator, fractions of any
//! length and a `Z` suffix.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

const DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DATETIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const DATETIME_MICROS: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]"
);
const DATETIME_NANOS: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]"
);
const OFFSET: &[BorrowedFormatItem<'static>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]");
const OFFSET_SECONDS: &[BorrowedFormatItem<'static>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]:[offset_second]");

fn year_in_range(date: Date) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

/// Returns `None` when the year falls outside `1..=9999`.
pub fn format_date(date: Date) -> Option<String> {
    if !year_in_range(date) {
        return None;
    }
    date.format(DATE).ok()
}

pub fn format_datetime(value: PrimitiveDateTime) -> Option<String> {
    if !year_in_range(value.date()) {
        return None;
    }
    let nanos = value.nanosecond();
    let description = if nanos == 0 {
        DATETIME
    } else if nanos % 1_000 == 0 {
        DATETIME_MICROS
    } else {
        DATETIME_NANOS
    };
    value.format(description).ok()
}

pub fn format_offset_datetime(value: OffsetDateTime) -> Option<String> {
    let local = format_datetime(PrimitiveDateTime::new(value.date(), value.time()))?;
    Some(local + &format_offset(value.offset())?)
}

fn format_offset(offset: UtcOffset) -> Option<String> {
    let description = if offset.seconds_past_minute() == 0 {
        OFFSET
    } else {
        OFFSET_SECONDS
    };
    offset.format(description).ok()
}

pub fn parse_date(input: &str) -> Result<Date, time::error::Parse> {
    Date::parse(input, DATE)
}

pub fn parse_datetime(input: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(
        &normalize(input),
        format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
        ),
    )
}

pub fn parse_offset_datetime(input: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(
        &normalize(input),
        format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory]:[offset_minute][optional [:[offset_second]]]"
        ),
    )
}

fn normalize(input: &str) -> String {
    let mut normalized = input.to_string();
    if normalized.as_bytes().get(10) == Some(&b' ') {
        normalized.replace_range(10..11, "T");
    }
    if let Some(stripped) = normalized.strip_suffix('Z') {
        normalized = format!("{stripped}+00:00");
    }
    normalized
}
