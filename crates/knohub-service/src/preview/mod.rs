//! Circuit previews and legacy document rendering.

pub mod circuit;
pub mod command;
pub mod document;
pub mod service;

pub use circuit::{CircuitRenderer, CommandCircuitRenderer};
pub use document::{CommandDocumentConverter, DocumentConverter};
pub use service::PreviewService;
