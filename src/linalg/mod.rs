//! Small dense linear algebra used by the Gram-matrix bookkeeping
//!
//! Only what the incremental inverse updates need: a row-major dense matrix
//! with rank-1 updates, and an expandable square view over a larger backing
//! store so the basis can grow one row/column at a time without
//! reallocating on every insertion.

pub mod matrix;

pub use self::matrix::*;
