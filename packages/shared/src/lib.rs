//! Utilities shared across the Parlor packages.

pub mod logger;
pub mod time;
