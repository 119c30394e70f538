use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use owo_colors::{OwoColorize, Style};

use crate::db::{HistoryEntry, Show};

const HISTORY_NAME_WIDTH: usize = 20;
const SHOW_NAME_WIDTH: usize = 30;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 12 * MONTH;
const LONG_TIME: i64 = 37 * YEAR;

/// Renders store rows as terminal lines.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Printer {
    pub(crate) colored: bool,
    pub(crate) exact_times: bool,
}

impl Printer {
    pub(crate) fn history_line(&self, entry: &HistoryEntry, now: DateTime<Utc>) -> String {
        format!(
            "saw {} {}S{}E{}{} at {}",
            self.paint(
                &format!("{:<width$}", entry.name, width = HISTORY_NAME_WIDTH),
                Style::new().magenta()
            ),
            self.paint("(", Style::new().blue()),
            self.paint(&format!("{:02}", entry.season), Style::new().cyan()),
            self.paint(&format!("{:02}", entry.episode), Style::new().green()),
            self.paint(")", Style::new().blue()),
            self.time_string(entry.added, now)
        )
    }

    pub(crate) fn show_line(&self, show: &Show, now: DateTime<Utc>) -> String {
        format!(
            "{} added {}",
            self.paint(
                &format!("{:<width$}", show.name, width = SHOW_NAME_WIDTH),
                Style::new().magenta()
            ),
            self.time_string(show.added, now)
        )
    }

    pub(crate) fn next_line(&self, name: &str, season: u32, episode: u32) -> String {
        format!(
            "{} {}",
            self.paint(name, Style::new().magenta()),
            self.paint(&episode_code(season, episode), Style::new().cyan())
        )
    }

    pub(crate) fn time_string(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        if self.exact_times {
            rfc1123z(&at.with_timezone(&Local))
        } else {
            humanize_since(at, now)
        }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.colored {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }
}

pub(crate) fn episode_code(season: u32, episode: u32) -> String {
    format!("S{season:02}E{episode:02}")
}

pub(crate) fn rfc1123z<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

pub(crate) fn humanize_since(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds();
    let (span, suffix) = if secs >= 0 {
        (secs, "ago")
    } else {
        (-secs, "from now")
    };

    let amount = match span {
        0 => return "now".to_string(),
        1 => "1 second".to_string(),
        s if s < MINUTE => format!("{s} seconds"),
        s if s < 2 * MINUTE => "1 minute".to_string(),
        s if s < HOUR => format!("{} minutes", s / MINUTE),
        s if s < 2 * HOUR => "1 hour".to_string(),
        s if s < DAY => format!("{} hours", s / HOUR),
        s if s < 2 * DAY => "1 day".to_string(),
        s if s < WEEK => format!("{} days", s / DAY),
        s if s < 2 * WEEK => "1 week".to_string(),
        s if s < MONTH => format!("{} weeks", s / WEEK),
        s if s < 2 * MONTH => "1 month".to_string(),
        s if s < YEAR => format!("{} months", s / MONTH),
        s if s < 18 * MONTH => "1 year".to_string(),
        s if s < 2 * YEAR => "2 years".to_string(),
        s if s < LONG_TIME => format!("{} years", s / YEAR),
        _ => "a long while".to_string(),
    };
    format!("{amount} {suffix}")
}
