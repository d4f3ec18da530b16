//! Integration tests for the KnoHub server.
//!
//! Everything runs against the in-memory tree store and a temporary upload
//! directory, so no external services are needed.

mod engine_test;
mod helpers;
mod http_test;
