//! Implementation of the `#[derive(Record)]` macro.
//!
//! Generates field accessors, field id constants and a schema from struct
//! annotations.

mod attrs;
mod derive;

pub use derive::record_derive_impl;
