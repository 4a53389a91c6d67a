//! Error types for the GC demo service

use std::fmt;

#[derive(Debug)]
pub enum GcDemoError {
    Config(String),
    Io(Box<std::io::Error>),
    /// A blocking workload task panicked or was cancelled
    Task(String),
}

impl fmt::Display for GcDemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GcDemoError::Config(msg) => write!(f, "Configuration error: {}", msg),
            GcDemoError::Io(err) => write!(f, "IO error: {}", err),
            GcDemoError::Task(msg) => write!(f, "Workload task failed: {}", msg),
        }
    }
}

impl std::error::Error for GcDemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GcDemoError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GcDemoError {
    fn from(err: std::io::Error) -> Self {
        GcDemoError::Io(Box::new(err))
    }
}

impl From<tokio::task::JoinError> for GcDemoError {
    fn from(err: tokio::task::JoinError) -> Self {
        GcDemoError::Task(err.to_string())
    }
}

impl From<blob_store::ParsePolicyError> for GcDemoError {
    fn from(err: blob_store::ParsePolicyError) -> Self {
        GcDemoError::Config(err.to_string())
    }
}

impl From<tracing_subscriber::filter::ParseError> for GcDemoError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        GcDemoError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GcDemoError>;
