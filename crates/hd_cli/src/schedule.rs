use std::str::FromStr;
use std::time::Duration;
use chrono::{DateTime, Days, Utc};
use hd_core::config::parse_daily_time;
use hd_core::Result;

/// `1h30m`, `45m`, `1d` and friends. A bare number means seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_value = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
                continue;
            }
            if c.is_whitespace() {
                continue;
            }
            let num: u64 = current_number
                .parse()
                .map_err(|_| format!("Unit '{}' must follow a number", c))?;
            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 3600,
                'd' => 86400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_seconds = num
                .checked_mul(unit)
                .and_then(|seconds| total_seconds.checked_add(seconds))
                .ok_or_else(|| format!("Duration '{}' is too large", s))?;
            current_number.clear();
            has_value = true;
        }

        if !current_number.is_empty() {
            let seconds = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_seconds = total_seconds
                .checked_add(seconds)
                .ok_or_else(|| format!("Duration '{}' is too large", s))?;
            has_value = true;
        }

        if !has_value || total_seconds == 0 {
            return Err("Duration must be a positive amount of time".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

/// Next instant strictly after `now` at `HH:MM` UTC.
pub fn next_daily_run(now: DateTime<Utc>, time_of_day: &str) -> Result<DateTime<Utc>> {
    let time = parse_daily_time(time_of_day)?;
    let today = now.date_naive().and_time(time).and_utc();
    if today > now {
        return Ok(today);
    }
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .ok_or_else(|| hd_core::Error::Config("Date out of range".to_string()))?;
    Ok(tomorrow.and_time(time).and_utc())
}
