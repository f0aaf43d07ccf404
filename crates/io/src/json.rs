//! JSON wire types for cloud and segmentation exports.

use crate::JsonError;
use rangescan_core::{PointCloud, Sample};
use rangescan_segmentation::{DetectedObject, Plane, Segmentation};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;

/// `{"units": ..., "points": [{x, y, z, distance}, ...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudExport {
    pub units: String,
    pub points: Vec<Sample>,
}

impl CloudExport {
    pub fn from_cloud(cloud: &PointCloud) -> Self {
        Self {
            units: cloud.units().to_string(),
            points: cloud.iter_samples().collect(),
        }
    }

    /// Rebuilds the cloud, validating every point.
    pub fn into_cloud(self) -> Result<PointCloud, JsonError> {
        let mut cloud = PointCloud::with_units(self.units);
        cloud.extend(&self.points)?;
        Ok(cloud)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub distance: f64,
    pub label: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectExport {
    pub label: u32,
    pub num_points: usize,
    pub bbox_min: [f64; 3],
    pub bbox_max: [f64; 3],
}

impl From<&DetectedObject> for ObjectExport {
    fn from(obj: &DetectedObject) -> Self {
        Self {
            label: obj.label,
            num_points: obj.num_points,
            bbox_min: obj.bbox.min,
            bbox_max: obj.bbox.max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneExport {
    pub normal: [f64; 3],
    pub d: f64,
}

impl From<&Plane> for PlaneExport {
    fn from(plane: &Plane) -> Self {
        Self {
            normal: plane.normal,
            d: plane.d,
        }
    }
}

/// Labelled cloud, objects, and base plane (`null` when none was found).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationExport {
    pub units: String,
    pub points: Vec<LabeledPoint>,
    pub objects: Vec<ObjectExport>,
    pub plane: Option<PlaneExport>,
}

impl SegmentationExport {
    /// Pairs each cloud point with its label.
    ///
    /// `segmentation` must have been computed from `cloud`; points without a
    /// label (a mismatched result) are reported as 0.
    pub fn new(cloud: &PointCloud, segmentation: &Segmentation) -> Self {
        let points = cloud
            .iter_samples()
            .enumerate()
            .map(|(i, s)| LabeledPoint {
                x: s.x,
                y: s.y,
                z: s.z,
                distance: s.distance,
                label: segmentation.labels.get(i).copied().unwrap_or(0),
            })
            .collect();

        Self {
            units: cloud.units().to_string(),
            points,
            objects: segmentation.objects.iter().map(ObjectExport::from).collect(),
            plane: segmentation.plane.as_ref().map(PlaneExport::from),
        }
    }
}

/// Response body for a clear request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearStatus {
    pub status: String,
}

impl ClearStatus {
    pub fn cleared() -> Self {
        Self {
            status: "cleared".to_string(),
        }
    }
}

/// Parses a `[{x, y, z, distance}, ...]` batch. Values are validated when
/// they are appended, not here.
pub fn parse_samples_json(text: &str) -> Result<Vec<Sample>, JsonError> {
    Ok(serde_json::from_str(text)?)
}

pub fn read_samples_json(path: impl AsRef<Path>) -> Result<Vec<Sample>, JsonError> {
    let mut text = String::new();
    fs::File::open(path)?.read_to_string(&mut text)?;
    parse_samples_json(&text)
}

/// Reads a file produced from [`CloudExport`].
pub fn read_cloud_json(path: impl AsRef<Path>) -> Result<PointCloud, JsonError> {
    let text = fs::read_to_string(path)?;
    let export: CloudExport = serde_json::from_str(&text)?;
    export.into_cloud()
}
