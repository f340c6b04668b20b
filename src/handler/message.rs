//! Message handler
//!
//! Answers every request it is given with the fixed acknowledgment payload.

use hyper::{Request, Response, StatusCode};
use serde::Serialize;

use crate::http::{json_response, ResponseBody};

/// Acknowledgment text returned by the message endpoint
pub const MESSAGE: &str = "Laravel API is working \u{1F680}";

/// JSON body of the message endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl Default for MessageResponse {
    fn default() -> Self {
        Self { message: MESSAGE }
    }
}

/// Build the message response.
///
/// Method, headers, query and body of `_req` are ignored; the output is the
/// same for every call.
pub fn handle_message<B>(_req: &Request<B>) -> Response<ResponseBody> {
    json_response(StatusCode::OK, &MessageResponse::default())
}
