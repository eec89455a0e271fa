//! Command implementations for Weft
//!
//! Each command is implemented in its own module.

pub mod ast;
pub mod check;
pub mod complete;
pub mod config;
pub mod format;
