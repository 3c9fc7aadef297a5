//! Kernel-space points, online kernel learners and a vantage-point tree
//!
//! The crate has three main parts:
//!
//! * [`kernel_point`]: vectors `Σ α_i·φ(v_i)` in the feature space of a
//!   kernel, with budget maintenance (projection, RBF merging, stop,
//!   random eviction) and an incrementally maintained inverse Gram matrix;
//! * [`learner`]: online classifiers built on them (budget kernel
//!   perceptrons, Projectron/Projectron++) plus the linear SCW learner;
//! * [`vptree`]: a vantage-point tree answering k-nearest-neighbor and range
//!   queries for any metric that satisfies the triangle inequality.

pub mod collection;
pub mod core;
pub mod data;
pub mod kernel;
pub mod kernel_point;
pub mod learner;
pub mod linalg;
pub mod metric;
pub mod persistence;
pub mod vptree;

// Re-export main types for convenience
pub use crate::collection::{BruteForceCollection, Neighbor, VectorCollection};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{KernelSpaceError, Result};
pub use crate::data::LibSVMDataset;
pub use crate::kernel::{KernelSpec, KernelTrick};
pub use crate::kernel_point::{BudgetConfig, BudgetStrategy, KernelPoint, KernelPoints};
pub use crate::persistence::SerializableModel;
pub use crate::vptree::{VPTree, VPTreeBuilder};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
