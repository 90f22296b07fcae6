//! HTTP protocol layer module
//!
//! Response builders shared by the intake handler and the health probes.

pub mod response;

// Re-export commonly used types
pub use response::{
    build_404_response, build_envelope_response, build_health_response, build_redirect_response,
    Envelope,
};
