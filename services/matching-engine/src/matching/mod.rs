//! Matching logic module
//!
//! Price compatibility rules for the crossing loop

pub mod crossing;

pub use crossing::crosses;
