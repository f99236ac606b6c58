use thiserror::Error;

/// Errors raised by the shared data model.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A field or resource name that does not map to any `FieldKind`
    #[error("Unknown field kind: {0}")]
    UnknownFieldKind(String),

    /// A path that cannot describe a game file (no file name)
    #[error("Invalid file path: {0}")]
    InvalidPath(String),
}

impl CoreError {
    pub fn unknown_field_kind(name: impl Into<String>) -> Self {
        Self::UnknownFieldKind(name.into())
    }

    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }
}
