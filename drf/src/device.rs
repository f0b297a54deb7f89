use std::fmt;

use crate::error::DrfParseError;
use crate::property::DrfProperty;

/// The device-name prefix of a DRF: a single uppercase letter, a one-char
/// delimiter that also hints at the default property, and the remainder of
/// the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Device {
    pub first: char,
    pub delimiter: char,
    pub name: String,
}

impl Device {
    /// Canonical device string — always rendered with the `:` (READING)
    /// delimiter regardless of what delimiter the input used.
    pub fn canonical_string(&self) -> String {
        format!("{}:{}", self.first, self.name)
    }

    /// The property the delimiter character hints at (defaults to READING
    /// if the delimiter is unrecognized, which cannot happen for a
    /// successfully parsed `Device`).
    pub fn delimiter_property(&self) -> DrfProperty {
        DrfProperty::from_delimiter(self.delimiter).unwrap_or(DrfProperty::Reading)
    }

    /// Render this device with the delimiter for `property` instead of the
    /// one it was originally parsed with.
    pub fn qualified_for(&self, property: DrfProperty) -> String {
        format!("{}{}{}", self.first, property.delimiter(), self.name)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}

const KNOWN_DELIMITERS: &[char] = &[':', '_', '|', '&', '@', '$', '~'];

/// Parse just the device prefix of `text`, stopping at the first `.`, `[`,
/// `@`, or end of string. Does not strip a trailing `<-HANDLE` hint — callers
/// that need that should strip it first (see [`crate::strip_backend_hint`]).
pub fn parse_device(text: &str) -> Result<Device, DrfParseError> {
    let mut chars = text.char_indices();
    let (_, first) = chars
        .next()
        .ok_or_else(|| DrfParseError::new(text, 0, "empty device"))?;
    if !first.is_ascii_alphanumeric() {
        return Err(DrfParseError::new(text, 0, "device must start with an alphanumeric character"));
    }
    let (delim_idx, delimiter) = chars
        .next()
        .ok_or_else(|| DrfParseError::new(text, 1, "device is missing its delimiter character"))?;
    if !KNOWN_DELIMITERS.contains(&delimiter) {
        return Err(DrfParseError::new(
            text,
            delim_idx,
            format!("'{delimiter}' is not a recognized device delimiter"),
        ));
    }
    let name_start = delim_idx + delimiter.len_utf8();
    let name_end = text[name_start..]
        .find(['.', '[', '@'])
        .map(|i| name_start + i)
        .unwrap_or(text.len());
    let name = &text[name_start..name_end];
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DrfParseError::new(text, name_start, "device name must be alphanumeric"));
    }
    Ok(Device {
        first: first.to_ascii_uppercase(),
        delimiter,
        name: name.to_ascii_uppercase(),
    })
}

/// Length in bytes of the device prefix consumed by [`parse_device`], so
/// callers parsing a full request can continue from where it left off.
pub fn device_prefix_len(text: &str) -> usize {
    if text.len() < 2 {
        return text.len();
    }
    let name_start = 2;
    text[name_start..]
        .find(['.', '[', '@'])
        .map(|i| name_start + i)
        .unwrap_or(text.len())
}
