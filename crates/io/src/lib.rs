#![forbid(unsafe_code)]

pub mod error;
pub mod json;
pub mod ply;

pub use error::{JsonError, PlyError};
pub use json::{
    parse_samples_json, read_cloud_json, read_samples_json, ClearStatus, CloudExport,
    LabeledPoint, ObjectExport, PlaneExport, SegmentationExport,
};
pub use ply::{parse_ply, ply_bytes, read_ply, save_ply, write_ply, PlyFormat};
