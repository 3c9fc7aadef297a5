//! Kernel functions and the kernel trick abstraction

pub mod linear;
pub mod polynomial;
pub mod rbf;
pub mod spec;
pub mod traits;

pub use self::linear::*;
pub use self::polynomial::*;
pub use self::rbf::*;
pub use self::spec::*;
pub use self::traits::*;
