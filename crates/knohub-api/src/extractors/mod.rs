//! Custom Axum extractors.

pub mod client_ip;
pub mod json;
pub mod path;

pub use client_ip::client_ip;
pub use json::ValidatedJson;
pub use path::parse_id;
