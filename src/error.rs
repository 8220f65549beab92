use thiserror::Error;

pub type AnnotationResult<T> = Result<T, AnnotationError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnotationError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("chart surface has been disposed")]
    SurfaceDisposed,

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("unknown id: {0}")]
    NotFound(String),

    #[error("drawing `{0}` is locked")]
    Locked(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}
