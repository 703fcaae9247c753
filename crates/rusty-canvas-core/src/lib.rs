//! Core config, errors, and canvas wire types for Rusty Canvas.

pub mod config;
pub mod error;
pub mod types;
