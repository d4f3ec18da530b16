//! Lightweight runtime metrics.

pub mod visitors;

pub use visitors::VisitorTracker;
