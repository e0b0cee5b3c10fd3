//! Live countdown for an active session.
//!
//! Every tick recomputes from the end time and a fresh clock read, so the
//! display cannot drift no matter how late ticks arrive.

use chrono::{DateTime, Utc};
use std::fmt;
use std::ops::ControlFlow;
use std::time::Duration;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Left {
        days: i64,
        hours: i64,
        minutes: i64,
        seconds: i64,
    },
    Overdue {
        hours: i64,
        minutes: i64,
    },
}

impl Remaining {
    pub fn is_overdue(&self) -> bool {
        matches!(self, Remaining::Overdue { .. })
    }

    pub fn label(&self) -> &'static str {
        if self.is_overdue() {
            "Expired: "
        } else {
            "Remaining: "
        }
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Left {
                days,
                hours,
                minutes,
                seconds,
            } => {
                if *days > 0 {
                    write!(f, "{days}d ")?;
                }
                write!(f, "{hours}h {minutes}m {seconds}s")
            }
            Remaining::Overdue { hours, minutes } => write!(f, "Overdue by {hours}h {minutes}m"),
        }
    }
}

/// Time left until `end` as seen at `now`. Reaching `end` exactly counts as overdue.
pub fn remaining(end: DateTime<Utc>, now: DateTime<Utc>) -> Remaining {
    let diff = (end - now).num_milliseconds();

    if diff <= 0 {
        let overdue = diff.abs();
        return Remaining::Overdue {
            hours: overdue / MS_PER_HOUR,
            minutes: (overdue % MS_PER_HOUR) / MS_PER_MINUTE,
        };
    }

    Remaining::Left {
        days: diff / MS_PER_DAY,
        hours: (diff % MS_PER_DAY) / MS_PER_HOUR,
        minutes: (diff % MS_PER_HOUR) / MS_PER_MINUTE,
        seconds: (diff % MS_PER_MINUTE) / MS_PER_SECOND,
    }
}

/// Once-a-second countdown to a session's end time.
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    end: DateTime<Utc>,
    period: Duration,
}

impl Countdown {
    pub fn new(end: DateTime<Utc>) -> Self {
        Self {
            end,
            period: Duration::from_secs(1),
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn now(&self) -> Remaining {
        remaining(self.end, Utc::now())
    }

    /// Call `on_tick` right away and then every period until it breaks.
    pub async fn run<F>(&self, mut on_tick: F)
    where
        F: FnMut(Remaining) -> ControlFlow<()>,
    {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if on_tick(self.now()).is_break() {
                return;
            }
        }
    }
}
