//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the dispatch policy.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cache::CachePolicy;
pub use mime::mime_type_of;
pub use response::{
    build_400_response, build_404_response, build_408_response, build_413_response,
    build_500_response, build_json_response, build_static_response, FALLBACK_CONTENT_TYPE,
};
