#![forbid(unsafe_code)]

pub mod bbox;
pub mod cloud;
pub mod error;
pub mod point;
pub mod traits;

pub use bbox::Aabb;
pub use cloud::{PointCloud, DEFAULT_UNITS};
pub use error::ValidationError;
pub use point::Sample;
pub use traits::HasPosition;
