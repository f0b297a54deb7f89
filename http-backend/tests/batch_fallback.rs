#![allow(clippy::unwrap_used, clippy::expect_used)]

use devnet_core::AsyncBackend;
use devnet_core::Value;
use devnet_http::HttpBackend;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Match;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::Request;
use wiremock::ResponseTemplate;

/// Matches the single-device `read+DEVICE` query built by `build_single_url`
/// (no escaped `\;` batch separator present).
struct SingleDeviceQuery;

impl Match for SingleDeviceQuery {
    fn matches(&self, req: &Request) -> bool {
        req.url.query().map(|q| !q.contains(';')).unwrap_or(false)
    }
}

/// Matches the batch query built by `build_batch_url`, joining several
/// `read+DEVICE` segments with an escaped semicolon.
struct BatchQuery;

impl Match for BatchQuery {
    fn matches(&self, req: &Request) -> bool {
        req.url.query().map(|q| q.contains(';')).unwrap_or(false)
    }
}

#[tokio::test]
async fn batch_reply_with_too_few_lines_falls_back_to_per_device_reads() {
    let server = MockServer::start().await;

    // The ACL gateway replies with only two lines for a three-device batch
    // request — a malformed/truncated reply that must trigger per-device
    // fallback rather than misaligning readings to drfs.
    Mock::given(method("GET"))
        .and(path("/cgi"))
        .and(BatchQuery)
        .respond_with(ResponseTemplate::new(200).set_body_string("75.2\n!timeout\n"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi"))
        .and(SingleDeviceQuery)
        .respond_with(ResponseTemplate::new(200).set_body_string("75.2"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(format!("{}/cgi", server.uri()));
    let drfs = vec!["M:OUTTMP".to_string(), "Z:BAD".to_string(), "G:AMANDA".to_string()];
    let readings = backend.get_many(&drfs, None).await.unwrap();

    assert_eq!(readings.len(), 3);
    for reading in &readings {
        assert_eq!(reading.value, Some(Value::Scalar(75.2)));
        assert!(reading.is_ok());
    }
}

#[tokio::test]
async fn batch_reply_with_an_error_line_falls_back_to_per_device_reads() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi"))
        .and(BatchQuery)
        .respond_with(ResponseTemplate::new(200).set_body_string("75.2\n!Facility not found\n"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi"))
        .and(SingleDeviceQuery)
        .respond_with(ResponseTemplate::new(200).set_body_string("75.2"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(format!("{}/cgi", server.uri()));
    let drfs = vec!["M:OUTTMP".to_string(), "Z:BAD".to_string()];
    let readings = backend.get_many(&drfs, None).await.unwrap();

    assert_eq!(readings.len(), 2);
    assert!(readings.iter().all(|r| r.is_ok()));
}

#[tokio::test]
async fn clean_batch_reply_is_used_without_any_fallback_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi"))
        .and(BatchQuery)
        .respond_with(ResponseTemplate::new(200).set_body_string("75.2\n-3.0"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(format!("{}/cgi", server.uri()));
    let drfs = vec!["M:OUTTMP".to_string(), "N:I2B1RI".to_string()];
    let readings = backend.get_many(&drfs, None).await.unwrap();

    assert_eq!(readings[0].value, Some(Value::Scalar(75.2)));
    assert_eq!(readings[1].value, Some(Value::Scalar(-3.0)));
}
