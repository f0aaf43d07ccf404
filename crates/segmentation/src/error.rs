use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentationError {
    /// Too few points to define a plane at all.
    #[error("plane fitting needs at least {required} points, got {found}")]
    InsufficientData { found: usize, required: usize },

    /// A sampled triple was collinear or coincident. Recovered by skipping
    /// the trial; never escapes the fitter.
    #[error("sampled points are collinear or coincident")]
    DegenerateGeometry,
}
