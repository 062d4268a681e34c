use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Parse a date/time typed by the user. Anything without an explicit offset
/// is read in the local time zone.
pub fn parse_when(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = match NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
    {
        Some(naive) => naive,
        None => fuzzydate::parse(&expand_abbreviations(input))
            .map_err(|_| anyhow!("Could not parse date/time: \"{}\"", input))?,
    };

    local_to_utc(naive)
}

/// Parse the date a view is positioned on, defaulting to today.
pub fn parse_day(input: Option<&str>) -> Result<NaiveDate> {
    let Some(input) = input else {
        return Ok(Local::now().date_naive());
    };

    if let Ok(date) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        return Ok(date);
    }

    fuzzydate::parse(&expand_abbreviations(input))
        .map(|dt| dt.date())
        .map_err(|_| anyhow!("Invalid date '{}'. Expected YYYY-MM-DD", input))
}

/// Parse a duration like "30m", "1h 30m" or "2 hours".
pub fn parse_duration(input: &str) -> Result<chrono::Duration> {
    let std = humantime::parse_duration(input.trim())
        .map_err(|_| anyhow!("Could not parse duration: \"{}\"", input))?;
    Ok(chrono::Duration::from_std(std)?)
}

fn local_to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("{} does not exist in the local time zone", naive))
}

/// Expand common abbreviations that fuzzydate doesn't handle.
fn expand_abbreviations(input: &str) -> String {
    let abbrevs = [
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("tmrw", "tomorrow"),
    ];

    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            abbrevs
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map(|(_, full)| *full)
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
