//! HTTP response building module
//!
//! Builders for the JSON responses the server emits.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::json::to_ascii_json;

/// Body type shared by every response
pub type ResponseBody = Full<Bytes>;

pub const JSON_CONTENT_TYPE: &str = "application/json";

const INTERNAL_ERROR_BODY: &[u8] = br#"{"message":"Server Error"}"#;

/// Laravel-style error envelope
#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
}

/// Build a JSON response with explicit `Content-Length`
///
/// A serialization failure degrades to a 500 with a fixed body.
pub fn json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    body: &T,
) -> Response<ResponseBody> {
    match to_ascii_json(body) {
        Ok(json) => build_json(status, Bytes::from(json)),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            build_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(INTERNAL_ERROR_BODY),
            )
        }
    }
}

fn build_json(status: StatusCode, body: Bytes) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(CONTENT_LENGTH, body.len())
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            let mut resp = Response::new(Full::new(body));
            *resp.status_mut() = status;
            resp
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    json_response(StatusCode::NOT_FOUND, &ErrorBody { message: "Not Found" })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<ResponseBody> {
    json_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        &ErrorBody {
            message: "Payload Too Large",
        },
    )
}

fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
