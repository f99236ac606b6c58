use scrapyard_lib::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
}

impl FrontendError {
    pub fn invalid_layout(msg: impl Into<String>) -> Self {
        Self::InvalidLayout(msg.into())
    }
}

impl From<FrontendError> for EngineError {
    fn from(e: FrontendError) -> Self {
        EngineError::compositor(e.to_string())
    }
}
