use std::fmt;

use crate::device::parse_device;
use crate::device::Device;
use crate::error::DrfParseError;
use crate::event::DrfEvent;
use crate::field::DrfField;
use crate::range::parse_range;
use crate::range::DrfRange;
use crate::strip_backend_hint;

/// A fully parsed device request: `device.property.field[range]@event`.
///
/// Every field is optional on the wire except `device` — omitted parts take
/// their default from the device's delimiter (`property`) or a fixed
/// default (`field`, `range`, `event`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub device: Device,
    pub property: crate::property::DrfProperty,
    pub range: DrfRange,
    pub field: DrfField,
    pub event: DrfEvent,
}

/// Split `text` at the first occurrence of any of `stops`, not counting the
/// character at index 0 (already consumed by the caller).
fn token_until(text: &str, stops: &[char]) -> (&str, &str) {
    match text.find(stops) {
        Some(i) => (&text[..i], &text[i..]),
        None => (text, ""),
    }
}

/// Parse a complete device request in any of its surface forms.
///
/// Steps:
/// 1. Strip a trailing `<-HANDLE` backend-routing hint, if present.
/// 2. Parse the device prefix (stops at `.`, `[`, `@`, or end).
/// 3. Consume leading `.SEGMENT` tokens one at a time: the first one is
///    tried as a `.PROPERTY` name and consumed if recognized; every
///    `.SEGMENT` that isn't consumed as the property (including the first,
///    when it doesn't name a property) is tried as a `.FIELD` instead, so
///    `.PROPERTY` and `.FIELD` may appear in either order ahead of a range,
///    and an unrecognized property name falls back to a field with the
///    property inferred from the device's delimiter. A later field
///    segment overrides an earlier one.
/// 4. Parse an optional `[range]` segment, defaulting to `None`.
/// 5. Parse one more optional `.FIELD` segment following the range — the
///    canonical/qualified emit order — overriding any field from step 3.
/// 6. Parse an optional `@event` segment, defaulting to `Default`.
pub fn parse_request(text: &str) -> Result<Request, DrfParseError> {
    let (text, _hint) = strip_backend_hint(text);

    let device = parse_device(text)?;
    let prefix_len = crate::device::device_prefix_len(text);
    let mut rest = &text[prefix_len..];
    let mut pos = prefix_len;

    let mut property = device.delimiter_property();
    let mut property_explicit = false;
    let mut field = DrfField::Scaled;

    while let Some(stripped) = rest.strip_prefix('.') {
        let (token, tail) = token_until(stripped, &['.', '[', '@']);
        if token.is_empty() {
            return Err(DrfParseError::new(text, pos + 1, "empty segment after '.'"));
        }
        if !property_explicit {
            if let Ok(p) = token.parse() {
                property = p;
                property_explicit = true;
                pos += 1 + token.len();
                rest = tail;
                continue;
            }
        }
        field = token
            .parse()
            .map_err(|_| DrfParseError::new(text, pos + 1, format!("unrecognized property or field '{token}'")))?;
        pos += 1 + token.len();
        rest = tail;
    }

    let mut range = DrfRange::None;
    if let Some(stripped) = rest.strip_prefix('[') {
        pos += 1;
        let close = stripped
            .find(']')
            .ok_or_else(|| DrfParseError::new(text, pos, "range is missing closing ']'"))?;
        range = parse_range(Some(&stripped[..close]), text, pos)?;
        pos += close + 1;
        rest = &stripped[close + 1..];
    }

    // Canonical/qualified forms emit `[range].field` — accept a trailing
    // `.field` here too, overriding whatever step 3 picked up.
    if let Some(stripped) = rest.strip_prefix('.') {
        pos += 1;
        let (token, tail) = token_until(stripped, &['@']);
        if token.is_empty() {
            return Err(DrfParseError::new(text, pos, "empty field after '.'"));
        }
        field = token
            .parse()
            .map_err(|_| DrfParseError::new(text, pos, format!("unrecognized field '{token}'")))?;
        pos += token.len();
        rest = tail;
    }

    if property == crate::property::DrfProperty::Status && !matches!(field, DrfField::Scaled) {
        return Err(DrfParseError::new(text, pos, "STATUS property cannot carry a field"));
    }

    let mut event = DrfEvent::Default;
    if let Some(stripped) = rest.strip_prefix('@') {
        pos += 1;
        event = DrfEvent::parse(stripped, text, pos)?;
        rest = "";
    }

    if !rest.is_empty() {
        return Err(DrfParseError::new(text, text.len() - rest.len(), format!("unexpected trailing text '{rest}'")));
    }

    Ok(Request {
        device,
        property,
        range,
        field,
        event,
    })
}

impl Request {
    /// Canonical form: always shows the property explicitly, uses the `:`
    /// device delimiter, and renders as
    /// `DEVICE.PROPERTY[range][.field]@event` — range before field, even
    /// though the parser accepts `.field` ahead of `[range]` on input.
    pub fn to_canonical(&self) -> String {
        let mut out = self.device.canonical_string();
        out.push('.');
        out.push_str(&self.property.to_string());
        out.push_str(&self.range.to_string());
        if !matches!(self.field, DrfField::Scaled) {
            out.push('.');
            out.push_str(&self.field.to_string());
        }
        out.push_str(&self.event.to_string());
        out
    }

    /// Qualified form: folds the property into the device delimiter instead
    /// of writing it out, so it reads the way operators type requests by
    /// hand. Same `[range][.field]` ordering as `to_canonical`.
    pub fn to_qualified(&self) -> String {
        let mut out = self.device.qualified_for(self.property);
        out.push_str(&self.range.to_string());
        if !matches!(self.field, DrfField::Scaled) {
            out.push('.');
            out.push_str(&self.field.to_string());
        }
        out.push_str(&self.event.to_string());
        out
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::event::PeriodicMode;
    use crate::property::DrfProperty;

    #[test]
    fn defaults_property_from_delimiter() {
        let r = parse_request("N:I2B1RI").unwrap();
        assert_eq!(r.property, DrfProperty::Reading);
        assert_eq!(r.field, DrfField::Scaled);
        assert_eq!(r.range, DrfRange::None);
        assert_eq!(r.event, DrfEvent::Default);
        assert_eq!(r.to_canonical(), "N:I2B1RI.READING");
        assert_eq!(r.to_qualified(), "N:I2B1RI");
    }

    #[test]
    fn underscore_delimiter_means_setting() {
        let r = parse_request("N_I2B1RI").unwrap();
        assert_eq!(r.property, DrfProperty::Setting);
        assert_eq!(r.to_qualified(), "N_I2B1RI");
    }

    #[test]
    fn explicit_property_field_range_event() {
        let r = parse_request("M:OUTTMP.SCALED.RAW[0:5]@p,1000").unwrap();
        assert_eq!(r.property, DrfProperty::Reading);
        assert_eq!(r.field, DrfField::Raw);
        assert_eq!(r.range, DrfRange::Std { lo: Some(0), hi: Some(5) });
        assert!(matches!(r.event, DrfEvent::Periodic { mode: PeriodicMode::Continuous, .. }));
        assert_eq!(r.event.periodic_millis(), Some(1000));
    }

    #[test]
    fn roundtrips_through_canonical() {
        let original = "M:OUTTMP.SCALED.RAW[0:5]@p,1000";
        let once = parse_request(original).unwrap();
        let twice = parse_request(&once.to_canonical()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn canonical_and_qualified_put_range_before_field() {
        let r = parse_request("N_I2B1RI.SETTING[50].RAW@e,AE,e,1000").unwrap();
        assert_eq!(r.device.canonical_string(), "N:I2B1RI");
        assert_eq!(r.property, DrfProperty::Setting);
        assert_eq!(r.range, DrfRange::Single(50));
        assert_eq!(r.field, DrfField::Raw);
        assert!(matches!(r.event, DrfEvent::Clock(ref raw) if raw == "e,AE,e,1000"));
        assert_eq!(r.to_canonical(), "N:I2B1RI.SETTING[50].RAW@e,AE,e,1000");
        assert_eq!(r.to_qualified(), "N_I2B1RI[50].RAW@e,AE,e,1000");
    }

    #[test]
    fn unrecognized_property_segment_falls_back_to_a_field() {
        let r = parse_request("M:OUTTMP.RAW").unwrap();
        assert_eq!(r.property, DrfProperty::Reading);
        assert_eq!(r.field, DrfField::Raw);
    }

    #[test]
    fn canonical_form_with_range_and_field_round_trips() {
        let r = parse_request("N_I2B1RI.SETTING[50].RAW@e,AE,e,1000").unwrap();
        let canonical = r.to_canonical();
        let reparsed = parse_request(&canonical).unwrap();
        assert_eq!(r, reparsed);
        assert_eq!(reparsed.to_canonical(), canonical);
    }

    #[test]
    fn analog_alarm_delimiter_then_event() {
        let r = parse_request("N@I2B1RI@p,1000").unwrap();
        assert_eq!(r.property, DrfProperty::AnalogAlarm);
        assert!(matches!(r.event, DrfEvent::Periodic { .. }));
    }

    #[test]
    fn rejects_unrecognized_event_type() {
        assert!(parse_request("N:I2B1RI@z,1000").is_err());
    }

    #[test]
    fn rejects_unrecognized_property() {
        assert!(parse_request("N:I2B1RI.BOGUS").is_err());
    }

    #[test]
    fn status_property_rejects_field() {
        assert!(parse_request("N:I2B1RI.STATUS.RAW").is_err());
        assert!(parse_request("N|I2B1RI.RAW").is_err());
    }
}
