// THEORY:
// Every analyzer in this crate is a pure function of one decoded image. That
// leaves very few ways for an analysis call to fail, and all of them are local
// to the call that produced them:
//
// 1.  **Malformed input**: the buffer does not describe a real image (zero-sized
//     dimensions, or a byte length that disagrees with width * height * 4). The
//     analyzer fails fast and returns nothing.
// 2.  **Bad parameters**: a caller asked for something meaningless, like zero
//     clusters or an encoded file size of zero bytes.
// 3.  **Plumbing**: the worker pool could not accept or return a task, or a
//     configuration file could not be read.
// 4.  **Staleness**: the result belongs to an image the user has already
//     replaced. This is not a failure of the analysis; the caller simply drops it.
//
// Degenerate-but-valid inputs (an empty k-means cluster, no mid-gray pixels,
// no edges) are never errors. They are handled by per-algorithm fallbacks so
// that no NaN or infinity ever reaches a caller.

use thiserror::Error;

/// Result type alias for image_insight operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Every way a single analysis call can fail.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Pixel byte length does not match the declared dimensions.
    #[error("Invalid buffer: expected {expected} bytes of RGBA data, got {actual}")]
    InvalidBuffer { expected: usize, actual: usize },

    /// Width or height is zero.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// An analysis parameter is outside its meaningful range.
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A task could not be delivered to, or answered by, the worker pool.
    #[error("Worker pool error: {message}")]
    WorkerPool { message: String },

    /// The image this result was computed for is no longer the current selection.
    #[error("Analysis superseded: image #{requested} was replaced by image #{current}")]
    Superseded { requested: u64, current: u64 },
}

impl AnalysisError {
    /// Create an invalid-parameter error from any displayable value.
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Create a configuration error with its underlying cause.
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn worker_pool(message: impl Into<String>) -> Self {
        Self::WorkerPool {
            message: message.into(),
        }
    }

    /// True when the result was discarded because a newer image took over.
    /// Callers should ignore these silently instead of surfacing them.
    pub fn is_stale(&self) -> bool {
        matches!(self, AnalysisError::Superseded { .. })
    }

    /// True when re-invoking with corrected input could succeed.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidBuffer { .. }
                | AnalysisError::InvalidDimensions { .. }
                | AnalysisError::InvalidParameter { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_results_are_not_input_errors() {
        let err = AnalysisError::Superseded {
            requested: 3,
            current: 4,
        };
        assert!(err.is_stale());
        assert!(!err.is_input_error());
        assert_eq!(
            err.to_string(),
            "Analysis superseded: image #3 was replaced by image #4"
        );
    }

    #[test]
    fn buffer_errors_describe_the_mismatch() {
        let err = AnalysisError::InvalidBuffer {
            expected: 16,
            actual: 12,
        };
        assert!(err.is_input_error());
        assert!(err.to_string().contains("expected 16 bytes"));
    }
}
