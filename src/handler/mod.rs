//! Request handler module
//!
//! Responsible for request routing dispatch and access logging.

pub mod router;

// Re-export main entry point
pub use router::{handle_request, route_request};
