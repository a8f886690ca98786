/// Convenience result type used across stagecraft.
pub type StageResult<T> = Result<T, StageError>;

/// Which input image an asset failure refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetRole {
    /// The generated stage / background plate.
    Background,
    /// The original product photograph.
    Product,
    /// A matte supplied as an image source.
    Matte,
}

impl std::fmt::Display for AssetRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Background => "background",
            Self::Product => "product",
            Self::Matte => "matte",
        })
    }
}

/// Top-level error taxonomy of the synthesis pipeline.
///
/// Fatal variants render a stable, user-facing sentence; the raw collaborator error stays
/// reachable through [`std::error::Error::source`].
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    /// A required image failed to fetch or decode.
    #[error("the {role} image could not be loaded")]
    AssetLoad {
        /// Which image failed.
        role: AssetRole,
        /// Underlying fetch/decode failure.
        #[source]
        source: anyhow::Error,
    },

    /// The matting collaborator failed or returned an unusable matte.
    #[error("the product could not be separated from its photo background")]
    MatteExtraction(#[source] anyhow::Error),

    /// Font provisioning exceeded its bound. Never aborts a pipeline run.
    #[error("font '{font}' did not load within {waited_ms} ms")]
    FontTimeout {
        /// Requested font identifier.
        font: String,
        /// How long provisioning waited.
        waited_ms: u64,
    },

    /// An internal drawing or transform step failed.
    #[error("the image could not be composed")]
    Compositing(#[source] anyhow::Error),

    /// Invalid caller-provided style, specs or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Build a [`StageError::AssetLoad`] value.
    pub fn asset_load(role: AssetRole, source: impl Into<anyhow::Error>) -> Self {
        Self::AssetLoad {
            role,
            source: source.into(),
        }
    }

    /// Build a [`StageError::MatteExtraction`] value.
    pub fn matte(source: impl Into<anyhow::Error>) -> Self {
        Self::MatteExtraction(source.into())
    }

    /// Build a [`StageError::Compositing`] value.
    pub fn compositing(msg: impl Into<String>) -> Self {
        Self::Compositing(anyhow::Error::msg(msg.into()))
    }

    /// Build a [`StageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `false` only for errors the pipeline degrades around instead of aborting.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::FontTimeout { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
