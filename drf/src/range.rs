use std::fmt;

use crate::error::DrfParseError;

/// An array-slice qualifier. `Single` is kept distinct from `Std` even
/// though a single index could be expressed as `[n:n+1]`, because the two
/// forms carry different semantics upstream (a scalar read vs a one-element
/// array read) and must round-trip back to their original surface form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrfRange {
    #[default]
    None,
    Full,
    Single(i64),
    Std {
        lo: Option<i64>,
        hi: Option<i64>,
    },
}

impl fmt::Display for DrfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrfRange::None => Ok(()),
            DrfRange::Full => write!(f, "[:]"),
            DrfRange::Single(n) => write!(f, "[{n}]"),
            DrfRange::Std { lo, hi } => {
                write!(f, "[")?;
                if let Some(lo) = lo {
                    write!(f, "{lo}")?;
                }
                write!(f, ":")?;
                if let Some(hi) = hi {
                    write!(f, "{hi}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Parse the contents of a `[...]` range qualifier (without the brackets).
/// `None` means no `[...]` was present at all.
pub fn parse_range(text: Option<&str>, whole_text: &str, pos: usize) -> Result<DrfRange, DrfParseError> {
    let Some(text) = text else {
        return Ok(DrfRange::None);
    };
    let text = text.trim();
    if text.is_empty() || text == ":" {
        return Ok(DrfRange::Full);
    }
    if !text.contains(':') {
        let n = text
            .parse::<i64>()
            .map_err(|_| DrfParseError::new(whole_text, pos, format!("invalid range index '{text}'")))?;
        return Ok(DrfRange::Single(n));
    }
    let (lo_str, hi_str) = text
        .split_once(':')
        .ok_or_else(|| DrfParseError::new(whole_text, pos, format!("invalid range '{text}'")))?;
    let parse_bound = |s: &str| -> Result<Option<i64>, DrfParseError> {
        if s.is_empty() {
            Ok(None)
        } else {
            s.parse::<i64>()
                .map(Some)
                .map_err(|_| DrfParseError::new(whole_text, pos, format!("invalid range bound '{s}'")))
        }
    };
    Ok(DrfRange::Std {
        lo: parse_bound(lo_str)?,
        hi: parse_bound(hi_str)?,
    })
}
