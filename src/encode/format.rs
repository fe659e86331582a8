//! Value cleaning and parsing shared by the typed [`super::JsonWrapper`] puts.

use chrono::NaiveDate;

/// Normalise a raw field before typed parsing: trim, lower-case, drop thousands separators.
pub fn clean_string(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parse a report date.
///
/// Accepts `YYYYMMDD` or `YYYY-MM-DD`, optionally followed by a time of day
/// (`T`/space separator optional, `:` optional, fractional seconds and a zone
/// offset allowed). The time is checked for shape and then discarded.
pub fn formatted_date_parse(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let (date, rest) = split_date(value)?;
    if is_time_of_day(rest) {
        Some(date)
    } else {
        None
    }
}

fn split_date(value: &str) -> Option<(NaiveDate, &str)> {
    let b = value.as_bytes();
    let digits = |range: std::ops::Range<usize>| b[range].iter().all(u8::is_ascii_digit);

    let (year, month, day, used) =
        if b.len() >= 10 && b[4] == b'-' && b[7] == b'-' && digits(0..4) && digits(5..7) && digits(8..10) {
            (&value[0..4], &value[5..7], &value[8..10], 10)
        } else if b.len() >= 8 && digits(0..8) {
            (&value[0..4], &value[4..6], &value[6..8], 8)
        } else {
            return None;
        };

    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
    Some((date, &value[used..]))
}

fn is_time_of_day(rest: &str) -> bool {
    if rest.is_empty() {
        return true;
    }
    let rest = rest.strip_prefix(|c: char| c == 'T' || c == 't' || c == ' ').unwrap_or(rest);

    let zone_start = rest
        .find(|c: char| c == 'Z' || c == 'z' || c == '+' || c == '-')
        .unwrap_or(rest.len());
    let (clock, zone) = rest.split_at(zone_start);

    let clock_ok = clock.starts_with(|c: char| c.is_ascii_digit())
        && clock.chars().all(|c| c.is_ascii_digit() || c == ':' || c == '.');
    let zone_ok = match zone.chars().next() {
        None => true,
        Some('Z') | Some('z') => zone.len() == 1,
        Some(_) => {
            let offset = &zone[1..];
            !offset.is_empty() && offset.chars().all(|c| c.is_ascii_digit() || c == ':')
        }
    };
    clock_ok && zone_ok
}
