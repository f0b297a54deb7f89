/// Characters passed through raw in the `acl=` query component. Everything
/// else is percent-encoded. Note this deliberately does *not* match
/// `url::Url`'s default query encode-set, which would over-escape the
/// colons and brackets DRF text is full of.
fn is_whitelisted(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(byte, b':' | b'[' | b']' | b'@' | b',' | b'.' | b'$' | b'|' | b'~' | b'_' | b'-')
}

/// Percent-encode `text` for inclusion in an ACL `read+DEVICE` query
/// segment, leaving the DRF-grammar whitelist characters untouched.
pub fn encode_device(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.as_bytes() {
        if is_whitelisted(*byte) {
            out.push(*byte as char);
        } else if *byte == b' ' {
            out.push_str("%20");
        } else if *byte == b'\'' {
            out.push_str("%27");
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Build the URL for a single-device `read` request.
pub fn build_single_url(base: &str, drf: &str) -> String {
    format!("{base}?acl=read+{}", encode_device(drf))
}

/// Build the URL for a batch `read` request: per-device `read+DEVICE`
/// segments joined by a literal `\;`.
pub fn build_batch_url(base: &str, drfs: &[String]) -> String {
    let joined: Vec<String> = drfs.iter().map(|d| format!("read+{}", encode_device(d))).collect();
    format!("{base}?acl={}", joined.join("\\;"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn single_url_leaves_drf_punctuation_raw() {
        let url = build_single_url("http://acl.example/cgi", "M:OUTTMP.SCALED@p,1000");
        assert_eq!(url, "http://acl.example/cgi?acl=read+M:OUTTMP.SCALED@p,1000");
    }

    #[test]
    fn batch_url_joins_with_escaped_semicolon() {
        let url = build_batch_url("http://acl.example/cgi", &["M:OUTTMP".to_string(), "N:I2B1RI".to_string()]);
        assert_eq!(url, "http://acl.example/cgi?acl=read+M:OUTTMP\\;read+N:I2B1RI");
    }

    #[test]
    fn encodes_space_and_quote() {
        assert_eq!(encode_device("A B'C"), "A%20B%27C");
    }
}
