//! Device Request Format (DRF) grammar, parsing, and canonicalization.
//!
//! A DRF names a control-system device and how to read or write it:
//! `device.property.field[range]@event`. Every part past `device` is
//! optional and takes a default, and the same request can be spelled
//! several equivalent ways (`N:I2B1RI` vs `N_I2B1RI.SETTING`, `[:]` vs
//! bare, explicit `@i` vs omitted). Parsing a request and re-emitting it in
//! canonical or qualified form must be idempotent: `parse(canon(parse(s)))
//! == parse(s)`.

mod device;
mod error;
mod event;
mod field;
mod property;
mod range;
mod request;
mod utils;

pub use device::device_prefix_len;
pub use device::parse_device;
pub use device::Device;
pub use error::DrfParseError;
pub use event::parse_time_freq;
pub use event::DrfEvent;
pub use event::PeriodicMode;
pub use field::DrfField;
pub use property::DrfProperty;
pub use range::parse_range;
pub use range::DrfRange;
pub use request::parse_request;
pub use request::Request;
pub use utils::ensure_immediate_event;
pub use utils::get_device_name;
pub use utils::get_qualified_device;

/// Strip a trailing `<-HANDLE` backend-routing hint, if present, returning
/// `(rest, hint)`. The hint steers a request to a specific backend and is
/// never part of the device name, property, or any other grammar element,
/// so it is removed before grammar parsing begins.
pub fn strip_backend_hint(text: &str) -> (&str, Option<&str>) {
    match text.rfind("<-") {
        Some(i) => (&text[..i], Some(&text[i + 2..])),
        None => (text, None),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn strips_handle_hint() {
        let (rest, hint) = strip_backend_hint("M:OUTTMP<-DPM01");
        assert_eq!(rest, "M:OUTTMP");
        assert_eq!(hint, Some("DPM01"));
    }

    #[test]
    fn no_hint_is_passthrough() {
        let (rest, hint) = strip_backend_hint("M:OUTTMP");
        assert_eq!(rest, "M:OUTTMP");
        assert_eq!(hint, None);
    }

    #[test]
    fn request_round_trip_law() {
        let samples = [
            "N:I2B1RI",
            "N_I2B1RI",
            "M:OUTTMP.SCALED.RAW[0:5]@p,1000",
            "M:OUTTMP[:]@i",
            "N@I2B1RI@q,500",
        ];
        for s in samples {
            let once = parse_request(s).unwrap();
            let twice = parse_request(&once.to_canonical()).unwrap();
            assert_eq!(once, twice, "round-trip failed for {s}");
        }
    }
}
