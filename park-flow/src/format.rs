//! Display helpers shared by the steps and views.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::models::ParkingLocation;

fn plural(n: u32, unit: &str) -> String {
    if n > 1 {
        format!("{n} {unit}s")
    } else {
        format!("{n} {unit}")
    }
}

/// `0 -> "0 mins"`, `45 -> "45 mins"`, `90 -> "1 hour 30 mins"`, `120 -> "2 hours"`.
pub fn format_duration(minutes: u32) -> String {
    if minutes == 0 {
        return "0 mins".to_string();
    }

    let hours = minutes / 60;
    let mins = minutes % 60;

    if hours > 0 {
        let mut text = plural(hours, "hour");
        if mins > 0 {
            text.push(' ');
            text.push_str(&plural(mins, "min"));
        }
        return text;
    }

    plural(mins, "min")
}

/// "Today", "Yesterday", or e.g. "Mar 1, 2025", comparing calendar days in `now`'s zone.
pub fn format_relative_date<Tz: TimeZone>(date: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let day = date.date_naive();
    let today = now.date_naive();

    match (today - day).num_days() {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        _ => date.format("%b %-d, %Y").to_string(),
    }
}

/// [`format_relative_date`] against the local clock.
pub fn format_relative_date_local(date: &DateTime<Utc>) -> String {
    let local = date.with_timezone(&Local);
    format_relative_date(&local, &Local::now())
}

/// Wall-clock time like `14:05` in the local zone.
pub fn format_clock_time(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%H:%M").to_string()
}

/// One-line description of a location: distance, stay policy, visibility.
pub fn location_summary(location: &ParkingLocation) -> String {
    let mut parts = Vec::new();
    if let Some(distance) = location.distance.filter(|d| *d > 0.0) {
        parts.push(format!("{}m", distance.trunc() as u64));
    }
    parts.push(format!(
        "Max: {}",
        format_duration(location.max_stay.unwrap_or(0))
    ));
    if let Some(no_return) = location.no_return_time.filter(|m| *m > 0) {
        parts.push(format!("No return: {}", format_duration(no_return)));
    }
    if location.is_public {
        parts.push("Public".to_string());
    }
    parts.join(" · ")
}
