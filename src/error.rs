pub type FramepixResult<T> = Result<T, FramepixError>;

#[derive(thiserror::Error, Debug)]
pub enum FramepixError {
    /// An operation ran before its prerequisite artifact existed. Recoverable:
    /// the caller simply must not advance past the current stage.
    #[error("not ready: {0}")]
    NotReady(String),

    /// A 2D drawing surface could not be acquired. Fatal for the single
    /// operation that needed it; pipeline state is left unchanged.
    #[error("drawing surface unavailable: {0}")]
    Surface(String),

    /// Final rasterization or PNG encoding failed. No partial artifact is
    /// produced.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FramepixError {
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
