//! Distance metrics consumed by vector collections

pub mod euclidean;
pub mod kernel_distance;
pub mod minkowski;
pub mod traits;

pub use self::euclidean::*;
pub use self::kernel_distance::*;
pub use self::minkowski::*;
pub use self::traits::*;
