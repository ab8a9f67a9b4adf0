/// Convenience result type used across the crate.
pub type BehindTextResult<T> = Result<T, BehindTextError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Cancellation is not represented here: cancelled depth acquisitions resolve to `Ok(None)`.
#[derive(thiserror::Error, Debug)]
pub enum BehindTextError {
    /// Invalid caller-provided parameters or buffer shapes.
    #[error("validation error: {0}")]
    Validation(String),

    /// Depth provider, cutout provider, or input decode failure.
    #[error("acquisition error: {0}")]
    Acquisition(String),

    /// A compute backend is not available on this machine.
    #[error("unsupported backend: {0}")]
    Unsupported(String),

    /// Failure while rasterizing or compositing layers.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing requests and parameters.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BehindTextError {
    /// Build a [`BehindTextError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BehindTextError::Acquisition`] value.
    pub fn acquisition(msg: impl Into<String>) -> Self {
        Self::Acquisition(msg.into())
    }

    /// Build a [`BehindTextError::Unsupported`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Build a [`BehindTextError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`BehindTextError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Short status line suitable for surfacing to an end user.
    pub fn status(&self) -> String {
        match self {
            Self::Validation(m)
            | Self::Acquisition(m)
            | Self::Unsupported(m)
            | Self::Render(m)
            | Self::Serde(m) => m.clone(),
            Self::Other(e) => format!("{e:#}"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
