//! Data loading
//!
//! Datasets in the LibSVM text format, the common interchange format for
//! sparse classification data.

pub mod libsvm;

pub use self::libsvm::*;
