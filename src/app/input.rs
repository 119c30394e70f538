use chrono::TimeDelta;

use crate::db::HistoryFilter;
use crate::error::InputError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordItem {
    pub(crate) name: String,
    pub(crate) season: u32,
    pub(crate) episode: u32,
}

#[derive(Debug, Default)]
pub(crate) struct RecordBatch {
    pub(crate) items: Vec<Result<RecordItem, InputError>>,
    pub(crate) orphaned: Option<InputError>,
}

/// Splits `record` arguments into name/season/episode triples.
///
/// Trailing arguments that do not form a full triple are reported through
/// `orphaned`; each triple with a bad number becomes an `Err` item so the
/// rest of the batch can still be recorded.
pub(crate) fn parse_record_args(args: &[String]) -> RecordBatch {
    let orphaned = (args.len() % 3 != 0).then_some(InputError::OrphanArguments {
        supplied: args.len(),
    });

    let items = args
        .chunks_exact(3)
        .map(|triple| parse_triple(&triple[0], &triple[1], &triple[2]))
        .collect();

    RecordBatch { items, orphaned }
}

fn parse_triple(name: &str, season: &str, episode: &str) -> Result<RecordItem, InputError> {
    match (parse_number(season), parse_number(episode)) {
        (Some(season), Some(episode)) => Ok(RecordItem {
            name: name.to_string(),
            season,
            episode,
        }),
        _ => Err(InputError::BadEpisode {
            name: name.to_string(),
            season: season.to_string(),
            episode: episode.to_string(),
        }),
    }
}

pub(crate) fn parse_number(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

pub(crate) fn history_filter(
    name: Option<String>,
    season: Option<u32>,
    episode: Option<u32>,
) -> HistoryFilter {
    match (name, season, episode) {
        (Some(name), Some(season), Some(episode)) => HistoryFilter::Episode(name, season, episode),
        (Some(name), Some(season), None) => HistoryFilter::Season(name, season),
        (Some(name), None, _) => HistoryFilter::Show(name),
        (None, _, _) => HistoryFilter::All,
    }
}

/// Parses durations such as `0s`, `90m`, `1h30m`, `-2.5h` or `3d`.
pub(crate) fn parse_delay(raw: &str) -> Result<TimeDelta, InputError> {
    let bad = || InputError::BadDuration(raw.to_string());

    let trimmed = raw.trim();
    let (negative, mut rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err(bad());
    }

    let mut total_nanos = 0.0_f64;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(bad)?;
        let (number, tail) = rest.split_at(number_end);
        let value = number.parse::<f64>().map_err(|_| bad())?;

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);
        total_nanos += value * unit_nanos(unit).ok_or_else(bad)?;
        rest = next;
    }

    if !total_nanos.is_finite() || total_nanos >= i64::MAX as f64 {
        return Err(bad());
    }
    let delta = TimeDelta::nanoseconds(total_nanos.round() as i64);
    Ok(if negative { -delta } else { delta })
}

fn unit_nanos(unit: &str) -> Option<f64> {
    let nanos = match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60.0 * 1e9,
        "h" => 3600.0 * 1e9,
        "d" => 86_400.0 * 1e9,
        _ => return None,
    };
    Some(nanos)
}
