// The error-code pattern is a fixed literal checked by this crate's tests;
// it cannot fail to compile at runtime.
#![allow(clippy::expect_used)]

use regex_lite::Regex;
use std::sync::OnceLock;

use devnet_core::Value;

/// Outcome of parsing one line of ACL/CGI output.
#[derive(Debug, Clone, PartialEq)]
pub enum LineResult {
    Error(String),
    Value(Value),
}

fn error_code_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9]*(_[A-Z0-9]+)+$").expect("static regex is valid"))
}

/// True if `line` is an ACL error line: either it starts with `!`, or the
/// text after the last `" - "` looks like an error-code token
/// (`[A-Z][A-Z0-9]*(_[A-Z0-9]+)+`).
pub fn is_error_response(line: &str) -> bool {
    if line.starts_with('!') {
        return true;
    }
    match line.rfind(" - ") {
        Some(i) => error_code_pattern().is_match(&line[i + 3..]),
        None => false,
    }
}

/// Parse one line of ACL/CGI output into an error message or a value.
pub fn parse_line(line: &str) -> LineResult {
    if let Some(rest) = line.strip_prefix('!') {
        return LineResult::Error(rest.to_string());
    }
    if let Some(i) = line.rfind(" - ") {
        if error_code_pattern().is_match(&line[i + 3..]) {
            return LineResult::Error(line.to_string());
        }
    }

    let body = match line.rfind('=') {
        Some(i) => &line[i + 1..],
        None => line,
    };
    let body = body.trim();
    let tokens: Vec<&str> = body.split_whitespace().collect();

    if let Ok(v) = body.parse::<f64>() {
        return LineResult::Value(Value::Scalar(v));
    }
    if !tokens.is_empty() {
        if let Some(all) = tokens.iter().map(|t| t.parse::<f64>().ok()).collect::<Option<Vec<_>>>() {
            return LineResult::Value(Value::ScalarArray(all));
        }
        if tokens.len() > 1 {
            if let Some(all) = tokens[..tokens.len() - 1]
                .iter()
                .map(|t| t.parse::<f64>().ok())
                .collect::<Option<Vec<_>>>()
            {
                return LineResult::Value(Value::ScalarArray(all));
            }
        }
        if let Ok(v) = tokens[0].parse::<f64>() {
            return LineResult::Value(Value::Scalar(v));
        }
    }
    LineResult::Value(Value::Text(body.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn bang_prefixed_line_is_error() {
        assert!(is_error_response("!device not found"));
        assert_eq!(parse_line("!device not found"), LineResult::Error("device not found".to_string()));
    }

    #[test]
    fn error_code_tail_is_error() {
        let line = "M:OUTTMP - DBM_NOPROP";
        assert!(is_error_response(line));
        assert_eq!(parse_line(line), LineResult::Error(line.to_string()));
    }

    #[test]
    fn plain_scalar_line() {
        assert_eq!(parse_line("M:OUTTMP = 72.3"), LineResult::Value(Value::Scalar(72.3)));
    }

    #[test]
    fn scalar_array_line() {
        match parse_line("M:ARRAY = 1.0 2.0 3.0") {
            LineResult::Value(Value::ScalarArray(v)) => assert_eq!(v, vec![1.0, 2.0, 3.0]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn scalar_array_with_trailing_unit() {
        match parse_line("M:ARRAY = 1.0 2.0 Deg") {
            LineResult::Value(Value::ScalarArray(v)) => assert_eq!(v, vec![1.0, 2.0]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn two_token_trailing_unit_is_single_element_array() {
        // The "all-but-last as floats" rule fires before "first token as
        // float", so a bare value-plus-unit pair becomes a one-element
        // array rather than a bare scalar.
        match parse_line("M:OUTTMP = 72.3 Deg") {
            LineResult::Value(Value::ScalarArray(v)) => assert_eq!(v, vec![72.3]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn first_token_scalar_when_middle_tokens_are_not_numeric() {
        match parse_line("M:OUTTMP = 72.3 abc Deg") {
            LineResult::Value(Value::Scalar(v)) => assert_eq!(v, 72.3),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_text() {
        assert_eq!(parse_line("M:DESC = some text value"), LineResult::Value(Value::Text("some text value".to_string())));
    }
}
