//! Error types for kernel-space operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KernelSpaceError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Metric {0} does not satisfy the triangle inequality")]
    NonSubadditiveMetric(String),

    #[error("Invalid search range: expected a positive value, got {0}")]
    InvalidRange(f64),

    #[error("Configuration is locked: {0}")]
    ConfigurationLocked(String),

    #[error("Unsupported kernel: {0}")]
    UnsupportedKernel(String),

    #[error("Invalid label: expected -1 or +1, got {0}")]
    InvalidLabel(f64),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, KernelSpaceError>;
