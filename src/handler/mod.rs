//! Request handler module
//!
//! Responsible for request routing dispatch: the rule table, static file
//! resolution, and the dispatcher that ties them to the API layer.

mod dispatcher;
pub mod router;
pub mod rules;
mod static_files;

// Re-export main entry point
pub use dispatcher::{Dispatcher, ServerInfo};
pub use router::handle_request;
pub use static_files::{FallbackDocument, StaticRoot};
