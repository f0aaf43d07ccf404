//! Rangefinder point-cloud accumulation and segmentation.
//!
//! Samples are appended to a [`service::PointCloudStore`] (usually through a
//! [`service::ScanService`]), and each segmentation request splits a snapshot
//! of the cloud into a dominant base plane and labelled foreground objects.
//!
//! ```no_run
//! use rangescan::core::Sample;
//! use rangescan::service::ScanService;
//!
//! let service = ScanService::default();
//! service.add_sample(Sample::new(0.0, 0.0, 0.0, 2.0)).unwrap();
//! let result = service.segment();
//! println!("{}", serde_json::to_string(&result).unwrap());
//! ```

#![forbid(unsafe_code)]

pub use rangescan_core as core;
pub use rangescan_io as io;
pub use rangescan_segmentation as segmentation;
pub use rangescan_service as service;
pub use rangescan_spatial as spatial;

pub use rangescan_core::{Aabb, PointCloud, Sample, ValidationError};
pub use rangescan_segmentation::{Plane, Segmentation, Segmenter, SegmenterParams};
pub use rangescan_service::{ScanService, ServiceConfig, ServiceError};
