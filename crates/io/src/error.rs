use rangescan_core::ValidationError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlyError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid PLY header: {0}")]
    Header(String),

    #[error("unsupported PLY {0}")]
    Unsupported(String),

    #[error("invalid PLY body: {0}")]
    Body(String),

    #[error("invalid vertex: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid sample: {0}")]
    Validation(#[from] ValidationError),
}
