use crate::synthetic::ScannerConfig;
use crate::ServiceError;
use rangescan_core::DEFAULT_UNITS;
use rangescan_segmentation::{ClusterParams, PlaneFitterParams, SegmenterParams};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything a [`ScanService`](crate::ScanService) needs at start-up.
///
/// Every field has a default, so a YAML file only has to name what it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Unit label carried by the cloud and every export.
    #[serde(default = "default_units")]
    pub units: String,

    #[serde(default)]
    pub plane: PlaneFitterParams,

    #[serde(default)]
    pub cluster: ClusterParams,

    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Populate the scene with the demo shapes on start-up.
    #[serde(default = "default_with_default_scene")]
    pub with_default_scene: bool,
}

fn default_units() -> String {
    DEFAULT_UNITS.to_string()
}

fn default_with_default_scene() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            units: default_units(),
            plane: PlaneFitterParams::default(),
            cluster: ClusterParams::default(),
            scanner: ScannerConfig::default(),
            with_default_scene: default_with_default_scene(),
        }
    }
}

impl ServiceConfig {
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ServiceError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ServiceError> {
        std::fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }

    pub fn to_yaml_string(&self) -> Result<String, ServiceError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn segmenter_params(&self) -> SegmenterParams {
        SegmenterParams {
            plane: self.plane.clone(),
            cluster: self.cluster.clone(),
        }
    }
}
