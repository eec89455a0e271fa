//! Error types for Weft

use std::path::PathBuf;

use thiserror::Error;

use crate::models::language::Language;

pub type WeftResult<T> = std::result::Result<T, WeftError>;

#[derive(Debug, Error)]
pub enum WeftError {
    #[error("{0}")]
    Draft(#[from] DraftError),

    #[error("{0}")]
    Scheduler(#[from] SchedulerError),
}

impl WeftError {
    pub fn is_not_tracked(&self) -> bool {
        matches!(self, Self::Draft(DraftError::NotTracked(_)))
    }
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("File is not tracked: {}. Open it before requesting features.", .0.display())]
    NotTracked(PathBuf),
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler terminated: task submitted after shutdown")]
    Terminated,

    #[error("Failed to start worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Task was dropped before producing a result")]
    TaskDropped,

    #[error("Cannot block inside a current-thread tokio runtime; call from a plain thread")]
    BlockingInRuntime,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No grammar available for {0:?} files")]
    UnsupportedLanguage(Language),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Builder panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CompileDbError {
    #[error("Invalid compilation database {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_tracked_detection() {
        let err: WeftError = DraftError::NotTracked(PathBuf::from("a.cc")).into();
        assert!(err.is_not_tracked());
        assert!(err.to_string().contains("a.cc"));

        let err: WeftError = SchedulerError::Terminated.into();
        assert!(!err.is_not_tracked());
    }

    #[test]
    fn test_build_error_message() {
        let err = BuildError::UnsupportedLanguage(Language::Unknown);
        assert_eq!(err.to_string(), "No grammar available for Unknown files");
    }
}
