//! Compact interval notation used by configuration and reminder keys:
//! `<n><unit>` where unit is one of `s`, `m`, `h`, `d` (e.g. `365d`, `5m`).

use chrono::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalParseError {
    #[error("empty interval")]
    Empty,
    #[error("invalid interval amount in '{0}'")]
    InvalidAmount(String),
    #[error("unknown interval unit in '{0}' (expected s, m, h or d)")]
    UnknownUnit(String),
    #[error("interval '{0}' is out of range")]
    OutOfRange(String),
}

pub fn parse_interval(raw: &str) -> Result<Duration, IntervalParseError> {
    let value = raw.trim();
    let Some((split, _)) = value.char_indices().last() else {
        return Err(IntervalParseError::Empty);
    };

    let (amount, unit) = value.split_at(split);
    let amount: i64 = amount
        .trim()
        .parse()
        .map_err(|_| IntervalParseError::InvalidAmount(value.to_string()))?;
    if amount < 0 {
        return Err(IntervalParseError::InvalidAmount(value.to_string()));
    }

    let seconds_per_unit = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        _ => return Err(IntervalParseError::UnknownUnit(value.to_string())),
    };

    amount
        .checked_mul(seconds_per_unit)
        .and_then(Duration::try_seconds)
        .ok_or_else(|| IntervalParseError::OutOfRange(value.to_string()))
}

/// Inverse of [`parse_interval`], picking the largest unit that divides evenly.
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.num_seconds();
    if secs != 0 && secs % 86_400 == 0 {
        format!("{}d", secs / 86_400)
    } else if secs != 0 && secs % 3_600 == 0 {
        format!("{}h", secs / 3_600)
    } else if secs != 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
