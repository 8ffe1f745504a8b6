//! CSV crash reports, one per team.

use std::io::Write;

use chrono::{DateTime, Utc};
use csv::{QuoteStyle, WriterBuilder};

use crate::{CrashError, CrashEvent};

pub const REPORT_HEADER: [&str; 8] = [
    "Cyclist",
    "Team",
    "HIC",
    "BRIC",
    "Acceleration",
    "Location",
    "KM",
    "Date",
];

/// Write the header plus one row per crash. Text columns are always quoted,
/// numeric columns are bare, acceleration and km carry one decimal.
pub fn write_team_report<'a, W, I>(writer: W, crashes: I) -> Result<(), CrashError>
where
    W: Write,
    I: IntoIterator<Item = &'a CrashEvent>,
{
    // Quoting is applied per column below, so the writer must never add its own.
    let mut rows = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);
    rows.write_record(REPORT_HEADER)?;
    for crash in crashes {
        rows.write_record([
            quoted(&crash.rider.name),
            quoted(&crash.team),
            crash.hic.to_string(),
            crash.bric.to_string(),
            one_decimal(crash.acceleration),
            quoted(&crash.location),
            one_decimal(crash.km),
            quoted(&report_date(&crash.date)),
        ])?;
    }
    rows.flush()?;
    Ok(())
}

pub fn team_report_csv<'a, I>(crashes: I) -> Result<String, CrashError>
where
    I: IntoIterator<Item = &'a CrashEvent>,
{
    let mut buf = Vec::new();
    write_team_report(&mut buf, crashes)?;
    String::from_utf8(buf).map_err(|_| CrashError::ReportEncoding)
}

pub fn report_file_name(team_name: &str) -> String {
    format!("{}_crash_report.csv", team_name)
}

/// Text field wrapped in double quotes, embedded quotes doubled.
fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// One decimal place, rounded from the exact stored value (12.35 is stored
/// below the half and prints "12.3"). Exact halves such as 55.25 round away
/// from zero.
fn one_decimal(value: f64) -> String {
    let exact_half = (value * 4.0).fract() == 0.0 && (value * 2.0).fract() != 0.0;
    if exact_half {
        return format!("{:.1}", value + value.signum() * 0.05);
    }
    format!("{:.1}", value)
}

/// US-style calendar date, e.g. "3/7/2024".
pub fn report_date(date: &DateTime<Utc>) -> String {
    date.format("%-m/%-d/%Y").to_string()
}
