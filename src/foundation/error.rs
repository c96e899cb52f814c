/// Result alias used across the merge engine.
pub type MergeResult<T> = Result<T, MergeError>;

/// Errors surfaced by a merge.
///
/// `Input` errors are raised before any decode work begins. Every other variant is fatal for the
/// merge it occurs in: the multiplexer is aborted and no output is returned.
#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    /// Empty clip list, non-positive dimensions or durations, zero-length source.
    #[error("input error: {0}")]
    Input(String),

    /// A clip has no video track.
    #[error("missing track error: clip {clip} has no video track")]
    MissingTrack {
        /// Index of the offending clip in merge order.
        clip: usize,
    },

    /// The media library failed to open or decode a source.
    #[error("decode error: {0}")]
    Decode(String),

    /// Audio could not be brought to the target sample rate / channel layout.
    #[error("resample error: {0}")]
    Resample(String),

    /// The multiplexer or container writer failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// The caller cancelled the merge.
    #[error("merge cancelled")]
    Cancelled,

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MergeError {
    /// Build an [`MergeError::Input`].
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`MergeError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`MergeError::Resample`].
    pub fn resample(msg: impl Into<String>) -> Self {
        Self::Resample(msg.into())
    }

    /// Build an [`MergeError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
