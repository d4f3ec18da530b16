//! Core type definitions used across the KnoHub workspace.

pub mod id;

pub use id::*;
