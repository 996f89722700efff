//! Error-to-response mapping.
//!
//! Client errors carry their message; server errors are masked.

use waypoint::Error;
use waypoint::format::Invalid;

fn body_of(err: Error) -> (u16, String) {
    let resp = err.into_response();
    let status = resp.status().as_u16();
    let bytes = tokio_test::block_on(http_body_util::BodyExt::collect(resp.into_body()))
        .unwrap()
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[test]
fn decode_errors_name_the_field() {
    let (status, body) = body_of(Error::Decode {
        field: "since".into(),
        source: Invalid::new("date-time", "not-a-date"),
    });
    assert_eq!(status, 400);
    assert!(body.contains("since"), "field missing from: {body}");
    assert!(body.contains("not-a-date"), "value missing from: {body}");
}

#[test]
fn internal_errors_are_masked() {
    let (status, body) = body_of(Error::Internal(
        "Failed to query SELECT * FROM users WHERE id = 'x'".into(),
    ));
    assert_eq!(status, 500);
    assert!(!body.contains("SELECT"), "detail leaked to client: {body}");
    assert!(body.contains("Internal server error"));
}

#[test]
fn io_errors_do_not_leak_paths() {
    let io_err = std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "No such file: /etc/secret/config.toml",
    );
    let (status, body) = body_of(Error::Io(io_err));
    assert_eq!(status, 500);
    assert!(!body.contains("/etc/secret"), "path leaked to client: {body}");
}
