use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use strum_macros::EnumString;

/// A device property. Defaults to `READING` when neither a delimiter nor an
/// explicit `.PROPERTY` suffix is present.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive, serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrfProperty {
    Reading,
    Setting,
    Status,
    Control,
    AnalogAlarm,
    DigitalAlarm,
    Description,
}

impl DrfProperty {
    /// The one-character delimiter that hints at this property when it
    /// follows a device's first character (e.g. `N:I2B1RI` for READING).
    pub fn delimiter(self) -> char {
        match self {
            DrfProperty::Reading => ':',
            DrfProperty::Setting => '_',
            DrfProperty::Status => '|',
            DrfProperty::Control => '&',
            DrfProperty::AnalogAlarm => '@',
            DrfProperty::DigitalAlarm => '$',
            DrfProperty::Description => '~',
        }
    }

    /// Inverse of [`DrfProperty::delimiter`].
    pub fn from_delimiter(delim: char) -> Option<Self> {
        match delim {
            ':' => Some(DrfProperty::Reading),
            '_' => Some(DrfProperty::Setting),
            '|' => Some(DrfProperty::Status),
            '&' => Some(DrfProperty::Control),
            '@' => Some(DrfProperty::AnalogAlarm),
            '$' => Some(DrfProperty::DigitalAlarm),
            '~' => Some(DrfProperty::Description),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn delimiter_roundtrips() {
        for prop in [
            DrfProperty::Reading,
            DrfProperty::Setting,
            DrfProperty::Status,
            DrfProperty::Control,
            DrfProperty::AnalogAlarm,
            DrfProperty::DigitalAlarm,
            DrfProperty::Description,
        ] {
            assert_eq!(DrfProperty::from_delimiter(prop.delimiter()), Some(prop));
        }
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("setting".parse::<DrfProperty>().unwrap(), DrfProperty::Setting);
        assert_eq!("SETTING".parse::<DrfProperty>().unwrap(), DrfProperty::Setting);
    }
}
