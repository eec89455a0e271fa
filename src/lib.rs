//! Weft - incremental per-file analysis scheduling
//!
//! Keeps versioned drafts of the files open in an editing session, rebuilds
//! their analysis units on a single background worker and serves completion,
//! formatting and AST requests ahead of the rebuild backlog.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod infra;
pub mod models;
pub mod services;

pub use error::{WeftError, WeftResult};
pub use services::session::{Session, SessionCapabilities};
