//! Request handler module
//!
//! `router` is the hyper entry point; `intake` holds the per-request handler
//! that owns the database connection and runs the submission pipeline.

pub mod intake;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
