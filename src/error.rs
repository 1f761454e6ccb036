/// Boxed error returned by external collaborators (estimators, frames, renderers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("maximum tracked identities must be at least 1, got {0}")]
    InvalidCapacity(u32),

    #[error("retire threshold must be at least 1 missed frame, got {0}")]
    InvalidRetireThreshold(u32),

    #[error("match distance must be a positive finite number, got {0}")]
    InvalidMatchDistance(f32),

    #[error("failed to construct NotNan from f32: {1}")]
    ConstructNotNan(#[source] ordered_float::FloatIsNan, f32),

    #[error("body estimator failed")]
    EstimateBody(#[source] BoxError),

    #[error("face estimator failed for identity {1}")]
    EstimateFace(#[source] BoxError, u32),

    #[error("failed to crop frame for identity {1}")]
    CropFrame(#[source] BoxError, u32),

    #[error("failed to render frame {1}")]
    Render(#[source] BoxError, u64),

    #[error("failed to read recording: {1:?}")]
    ReadRecording(#[source] std::io::Error, std::path::PathBuf),

    #[error("failed to parse recorded frame on line {1}")]
    ParseRecordedFrame(#[source] serde_json::Error, usize),

    #[error("recorded frame on line {0} has zero width or height")]
    EmptyRecordedFrame(usize),
}
