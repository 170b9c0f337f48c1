//! Core domain model for repertoire.
//!
//! This crate defines the catalog-discovery data model (songwriter
//! identities, attributions, work candidates, discovered works and
//! discovery requests), the SQLite schema, and the core error type.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod schema;

pub use error::{Error, Result};
