#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod service;
pub mod store;
pub mod synthetic;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use service::ScanService;
pub use store::PointCloudStore;
pub use synthetic::{
    default_scene, generate_random, ScannerConfig, Scene, SceneObject, SceneShape, ShapeKind,
    SweepScanner,
};
