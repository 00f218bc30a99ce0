//! Silo: a minimal active-record data layer.
//!
//! Entities declare an ordered, typed schema once; the core synthesizes the
//! SQL text for table creation and CRUD, validates and formats values per
//! column type, and executes statements through an auto-reconnecting
//! connection owned by a driver crate such as `silo-postgres`.

pub use silo_core::*;
