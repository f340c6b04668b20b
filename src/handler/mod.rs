//! Request handler module
//!
//! Route dispatch and the message endpoint.

pub mod message;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
