//! Resource catalogue.

pub mod service;

pub use service::ResourceService;
