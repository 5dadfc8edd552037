//! Command implementations.

pub mod advise;
pub mod config;
