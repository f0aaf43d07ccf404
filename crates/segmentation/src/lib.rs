#![forbid(unsafe_code)]

pub mod bbox;
pub mod cluster;
mod eigen;
pub mod error;
pub mod plane;
pub mod segmenter;

pub use bbox::{bounding_box, compute_objects, DetectedObject};
pub use cluster::{ClusterParams, Clustering, ObjectClusterer};
pub use error::SegmentationError;
pub use plane::{Plane, PlaneFit, PlaneFitter, PlaneFitterParams};
pub use segmenter::{Segmentation, Segmenter, SegmenterParams};
