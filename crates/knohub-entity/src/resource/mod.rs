//! Resource (collection) entities.

pub mod kind;
pub mod model;

pub use kind::{ResourceTag, ResourceType};
pub use model::{NewResource, Resource, ResourceView, UpdateResource};
