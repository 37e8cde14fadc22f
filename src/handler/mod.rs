//! Request handler module
//!
//! Responsible for route prefix dispatch and the post view/edit/save handlers.

pub mod posts;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
