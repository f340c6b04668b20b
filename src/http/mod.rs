//! HTTP protocol layer module
//!
//! Response builders and body encoding shared by the handlers.

pub mod json;
pub mod response;

// Re-export commonly used types
pub use response::{build_404_response, build_413_response, json_response, ResponseBody};
