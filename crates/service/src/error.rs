use rangescan_core::ValidationError;
use rangescan_io::{JsonError, PlyError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("rejected sample: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("PLY error: {0}")]
    Ply(#[from] PlyError),

    #[error("JSON error: {0}")]
    Json(#[from] JsonError),

    #[error("segmentation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("scene object {0} not found")]
    UnknownObject(u32),
}
