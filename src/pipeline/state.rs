use serde::{Deserialize, Serialize};

use crate::foundation::error::StageError;

/// How the product reaches the final image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Cut the product out, cast shadows and composite it onto the stage.
    #[default]
    Precision,
    /// The background already contains the product; only text is layered on top.
    Creative,
}

impl GenerationMode {
    /// Whether this mode needs a matte and the shadow/foreground layers.
    pub fn composites_product(self) -> bool {
        matches!(self, Self::Precision)
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Precision => "precision",
            Self::Creative => "creative",
        })
    }
}

impl std::str::FromStr for GenerationMode {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "precision" => Ok(Self::Precision),
            "creative" => Ok(Self::Creative),
            other => Err(StageError::validation(format!(
                "unknown generation mode '{other}' (expected precision|creative)"
            ))),
        }
    }
}

/// Steps a request passes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Not started.
    Idle,
    /// Fetching and decoding inputs, provisioning the font.
    LoadingAssets,
    /// Obtaining the matte and cutting the product out.
    ExtractingMatte,
    /// Rendering cast and contact shadows.
    SynthesizingShadow,
    /// Flattening the layer stack.
    Compositing,
    /// Drawing the text overlay.
    RenderingText,
    /// Final image encoded.
    Encoded,
    /// Aborted; no image produced.
    Failed,
}

impl PipelineState {
    /// `true` for `Encoded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Encoded | Self::Failed)
    }
}

/// Ordered record of the states one request visited.
#[derive(Clone, Debug)]
pub(crate) struct StateTrace {
    states: Vec<PipelineState>,
}

impl StateTrace {
    pub(crate) fn new() -> Self {
        Self {
            states: vec![PipelineState::Idle],
        }
    }

    pub(crate) fn current(&self) -> PipelineState {
        self.states
            .last()
            .copied()
            .unwrap_or(PipelineState::Idle)
    }

    pub(crate) fn advance(&mut self, next: PipelineState) {
        tracing::debug!(from = ?self.current(), to = ?next, "pipeline state");
        self.states.push(next);
    }

    pub(crate) fn fail(&mut self, err: &StageError) {
        tracing::debug!(from = ?self.current(), error = %err, "pipeline failed");
        self.states.push(PipelineState::Failed);
    }

    pub(crate) fn into_states(self) -> Vec<PipelineState> {
        self.states
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/state.rs"]
mod tests;
