//! Common utility functions shared across the Zavalinka crates.
//!
//! # Design Principles
//!
//! - **Pure functions only** - no side effects, no I/O
//! - **No dependencies** - plain `std` string handling

pub mod string;

// Re-export commonly used functions at crate root for convenience
pub use string::normalize_str;
