//! Domain types shared across all campus services.
//!
//! This crate contains only pure types with no framework dependencies.

pub mod id;
pub mod money;
