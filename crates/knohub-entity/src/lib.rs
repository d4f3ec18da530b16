//! # knohub-entity
//!
//! Domain entity models for KnoHub. Database entities derive
//! `sqlx::FromRow`; view types are camelCase JSON for the web client.

pub mod file_item;
pub mod resource;
