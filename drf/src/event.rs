use std::fmt;

use crate::error::DrfParseError;

/// Continuous (`p`) vs one-shot-per-period (`q`) periodic sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicMode {
    Continuous,
    OneShot,
}

/// The `@...` timing/triggering modifier. `raw` is the exact text following
/// `@` as the caller wrote it (sans casing normalization), so canonical
/// re-emission is byte-for-byte stable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DrfEvent {
    #[default]
    Default,
    Immediate(String),
    Never(String),
    Periodic {
        raw: String,
        mode: PeriodicMode,
    },
    Clock(String),
    State(String),
}

impl DrfEvent {
    /// True for `DefaultEvent`, `ImmediateEvent`, `NeverEvent`, and
    /// `PeriodicEvent` in one-shot (`Q`) mode — anything that yields at most
    /// one reading per request.
    pub fn is_oneshot(&self) -> bool {
        match self {
            DrfEvent::Default | DrfEvent::Immediate(_) | DrfEvent::Never(_) => true,
            DrfEvent::Periodic { mode, .. } => matches!(mode, PeriodicMode::OneShot),
            DrfEvent::Clock(_) | DrfEvent::State(_) => false,
        }
    }

    /// Parsed periodic period in milliseconds, if this is a `PeriodicEvent`.
    pub fn periodic_millis(&self) -> Option<u64> {
        match self {
            DrfEvent::Periodic { raw, .. } => {
                let (_, duration) = raw.split_once(',')?;
                parse_time_freq(duration).ok()
            }
            _ => None,
        }
    }

    pub(crate) fn parse(raw: &str, whole_text: &str, pos: usize) -> Result<Self, DrfParseError> {
        let Some(first) = raw.chars().next() else {
            return Err(DrfParseError::new(whole_text, pos, "empty event after '@'"));
        };
        match first.to_ascii_lowercase() {
            'i' => Ok(DrfEvent::Immediate(raw.to_string())),
            'n' => Ok(DrfEvent::Never(raw.to_string())),
            'p' => Ok(DrfEvent::Periodic {
                raw: raw.to_string(),
                mode: PeriodicMode::Continuous,
            }),
            'q' => Ok(DrfEvent::Periodic {
                raw: raw.to_string(),
                mode: PeriodicMode::OneShot,
            }),
            'e' => Ok(DrfEvent::Clock(raw.to_string())),
            's' => Ok(DrfEvent::State(raw.to_string())),
            _ => Err(DrfParseError::new(
                whole_text,
                pos,
                format!("unrecognized event type '{first}'"),
            )),
        }
    }
}

impl fmt::Display for DrfEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrfEvent::Default => Ok(()),
            DrfEvent::Immediate(raw) | DrfEvent::Never(raw) | DrfEvent::Clock(raw) | DrfEvent::State(raw) => {
                write!(f, "@{raw}")
            }
            DrfEvent::Periodic { raw, .. } => write!(f, "@{raw}"),
        }
    }
}

/// Convert a periodic duration token (mantissa plus optional unit suffix) to
/// milliseconds, half-up rounded from double-precision arithmetic. Units:
/// none/`M` = ms, `U` = µs, `S` = s, `H` = Hz (period), `K` = kHz (period).
/// Zero is always zero, regardless of unit.
pub fn parse_time_freq(token: &str) -> Result<u64, DrfParseError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DrfParseError::new(token, 0, "empty duration"));
    }
    let (mantissa_str, unit) = match token.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => (&token[..token.len() - 1], c.to_ascii_uppercase()),
        _ => (token, 'M'),
    };
    let mantissa: f64 = mantissa_str
        .parse()
        .map_err(|_| DrfParseError::new(token, 0, format!("invalid duration mantissa '{mantissa_str}'")))?;
    if mantissa == 0.0 {
        return Ok(0);
    }
    let ms = match unit {
        'M' => mantissa,
        'U' => mantissa / 1000.0,
        'S' => mantissa * 1000.0,
        'H' => 1000.0 / mantissa,
        'K' => 1.0 / mantissa,
        other => {
            return Err(DrfParseError::new(
                token,
                0,
                format!("unrecognized duration unit '{other}'"),
            ));
        }
    };
    Ok((ms + 0.5).floor() as u64)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn parses_known_unit_suffixes() {
        let cases: &[(&str, u64)] = &[
            ("500", 500),
            ("1000M", 1000),
            ("2S", 2000),
            ("500U", 1),
            ("1500U", 2),
            ("1U", 0),
            ("100H", 10),
            ("10H", 100),
            ("60H", 17),
            ("1K", 1),
            ("3K", 0),
            ("0H", 0),
        ];
        for (raw, expected) in cases {
            assert_eq!(parse_time_freq(raw).unwrap(), *expected, "raw={raw}");
        }
    }
}
