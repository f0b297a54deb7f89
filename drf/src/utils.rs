use crate::event::DrfEvent;
use crate::property::DrfProperty;
use crate::request::parse_request;
use crate::request::Request;
use crate::error::DrfParseError;
use crate::strip_backend_hint;

/// If `drf` carries no event at all, append `@I` (forcing a one-shot
/// immediate read) ahead of any trailing `<-HANDLE` routing hint; if it
/// already has an event, return it unchanged. Used by backends that only
/// ever perform one-shot reads (e.g. the ACL/CGI backend) to turn a bare
/// device request into an explicit immediate one without disturbing a
/// caller-supplied event or hint.
pub fn ensure_immediate_event(drf: &str) -> Result<String, DrfParseError> {
    let request = parse_request(drf)?;
    if !matches!(request.event, DrfEvent::Default) {
        return Ok(drf.to_string());
    }
    let (body, hint) = strip_backend_hint(drf);
    match hint {
        Some(hint) => Ok(format!("{body}@I<-{hint}")),
        None => Ok(format!("{body}@I")),
    }
}

/// The bare canonical device name (`facility:name`), discarding property,
/// field, range, and event. Used as the matching key for device-scoped
/// policies.
pub fn get_device_name(drf: &str) -> Result<String, DrfParseError> {
    let request = parse_request(drf)?;
    Ok(request.device.canonical_string())
}

/// Render `drf` qualified for `property` instead of whatever property it was
/// originally parsed with.
pub fn get_qualified_device(drf: &str, property: DrfProperty) -> Result<String, DrfParseError> {
    let mut request = parse_request(drf)?;
    request.property = property;
    Ok(request.to_qualified())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn qualifies_setting() {
        assert_eq!(
            get_qualified_device("N:I2B1RI", DrfProperty::Setting).unwrap(),
            "N_I2B1RI"
        );
    }

    #[test]
    fn strips_field_property_range_event() {
        assert_eq!(
            get_device_name("M:OUTTMP.SCALED.RAW[0:5]@p,1000").unwrap(),
            "M:OUTTMP"
        );
    }

    #[test]
    fn leaves_existing_event_untouched() {
        let rewritten = ensure_immediate_event("M:OUTTMP@p,1000").unwrap();
        assert_eq!(rewritten, "M:OUTTMP@p,1000");
    }

    #[test]
    fn appends_immediate_event_ahead_of_backend_hint() {
        let rewritten = ensure_immediate_event("M:OUTTMP<-FTP").unwrap();
        assert_eq!(rewritten, "M:OUTTMP@I<-FTP");
    }

    #[test]
    fn appends_immediate_event_with_no_hint() {
        let rewritten = ensure_immediate_event("M:OUTTMP").unwrap();
        assert_eq!(rewritten, "M:OUTTMP@I");
    }
}
