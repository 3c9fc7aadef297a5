//! Points in a kernel-induced feature space with budget maintenance
//!
//! A kernel point represents `Σ_i α_i·φ(v_i)` without ever forming `φ`. Every
//! new vector either joins the basis `{v_i}` or is absorbed into it according
//! to a [`BudgetStrategy`], which keeps memory and evaluation cost bounded.
//! [`KernelPoints`] holds several points over one shared basis so online
//! learners with one weight vector per class pay for each kernel evaluation
//! only once.

pub mod budget;
pub mod point;
pub mod points;

pub use self::budget::{AddOutcome, BudgetConfig, BudgetStrategy};
pub use self::point::KernelPoint;
pub use self::points::{KernelPointRef, KernelPoints};
