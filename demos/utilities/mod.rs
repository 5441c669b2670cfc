//! Shared demo helpers

pub mod logger;
