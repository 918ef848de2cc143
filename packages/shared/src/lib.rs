//! Utilities shared by the Kairo packages.

pub mod logger;
pub mod time;
