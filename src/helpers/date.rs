//! Date helper functions
//!
//! The site renders dates in Brazilian Portuguese, matching the language
//! of the content.

use chrono::{DateTime, Datelike, TimeZone, Timelike};

const MONTHS_PTBR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Format a date as `15 mar 2021`
pub fn format_date_ptbr<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        MONTHS_PTBR[date.month0() as usize],
        date.year()
    )
}

/// Format an edit timestamp as `* editado em 16 mar 2021, às 10:02`
pub fn format_edited_ptbr<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    format!(
        "* editado em {}, às {:02}:{:02}",
        format_date_ptbr(date),
        date.hour(),
        date.minute()
    )
}

/// Format a date for XML/Atom documents
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}
