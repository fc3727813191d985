/// Workflow period durations
///
/// Periods travel as `[d.]hh:mm[:ss[.fffffff]]` text (or a bare day count) and
/// are always written back zero-padded as `dd.hh:mm:ss`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
/// Whole seconds of the longest accepted period, `10675199.02:48:05`
const MAX_SECONDS: u64 = 922_337_203_685;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid period")]
pub struct PeriodError(pub String);

/// Interval between two launches of a periodic workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(Duration);

impl Period {
    pub const ZERO: Period = Period(Duration::ZERO);

    pub fn from_secs(seconds: u64) -> Self {
        Period(Duration::from_secs(seconds))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Parse optional input where empty or missing text means zero
    pub fn parse_or_zero(text: Option<&str>) -> Result<Self, PeriodError> {
        match text.map(str::trim) {
            None | Some("") => Ok(Period::ZERO),
            Some(text) => text.parse(),
        }
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PeriodError(s.to_string());
        let text = s.trim();
        if text.is_empty() {
            return Err(invalid());
        }

        // A bare number is a day count
        if !text.contains(':') {
            let days = parse_digits(text).ok_or_else(invalid)?;
            let total = total_seconds(days, 0, 0, 0).ok_or_else(invalid)?;
            return Ok(Period(Duration::from_secs(total)));
        }

        // `d.` prefix: the first '.' before the first ':' separates days
        let colon = text.find(':').ok_or_else(invalid)?;
        let (days, clock) = match text[..colon].find('.') {
            Some(dot) => (parse_digits(&text[..dot]).ok_or_else(invalid)?, &text[dot + 1..]),
            None => (0, text),
        };

        let mut parts = clock.split(':');
        let hours = parts.next().and_then(parse_digits).ok_or_else(invalid)?;
        let minutes = parts.next().and_then(parse_digits).ok_or_else(invalid)?;
        let (seconds, nanos) = match parts.next() {
            Some(seconds) => parse_seconds(seconds).ok_or_else(invalid)?,
            None => (0, 0),
        };
        if parts.next().is_some() || hours >= 24 || minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }

        let total = total_seconds(days, hours, minutes, seconds).ok_or_else(invalid)?;
        Ok(Period(Duration::new(total, nanos)))
    }
}

impl fmt::Display for Period {
    /// Zero-padded `dd.hh:mm:ss`; fractional seconds are not written
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.as_secs();
        write!(
            f,
            "{:02}.{:02}:{:02}:{:02}",
            total / SECONDS_PER_DAY,
            (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
            (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            total % SECONDS_PER_MINUTE
        )
    }
}

/// Sum of the components, `None` past `MAX_SECONDS`
fn total_seconds(days: u64, hours: u64, minutes: u64, seconds: u64) -> Option<u64> {
    days.checked_mul(SECONDS_PER_DAY)?
        .checked_add(hours * SECONDS_PER_HOUR)?
        .checked_add(minutes * SECONDS_PER_MINUTE)?
        .checked_add(seconds)
        .filter(|total| *total <= MAX_SECONDS)
}

fn parse_digits(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// `ss` or `ss.fffffff` (up to seven fraction digits)
fn parse_seconds(text: &str) -> Option<(u64, u32)> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };
    let seconds = parse_digits(whole)?;
    let nanos = match fraction {
        Some(fraction) if fraction.len() <= 7 => {
            let digits = parse_digits(fraction)?;
            let scale = 10u64.pow(9 - fraction.len() as u32);
            (digits * scale) as u32
        }
        Some(_) => return None,
        None => 0,
    };
    Some((seconds, nanos))
}
