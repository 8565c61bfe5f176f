//! HTTP protocol layer module
//!
//! Response builders shared by the router and the credit score handler.

pub mod response;

// Re-export commonly used types
pub use response::{
    build_404_response, build_405_response, build_health_response, build_options_response,
    finalize, json_error, json_response,
};
