use thiserror::Error;

use crate::camera::Facing;
use crate::messaging::ActionKind;
use crate::workflow::WorkflowState;

/// Workflow-level errors using thiserror for structured error handling.
///
/// Every variant here is recoverable: the controller turns device and
/// submission failures into advisories and keeps the collected record intact.

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Camera unavailable ({facing}): {reason}")]
    DeviceUnavailable { facing: Facing, reason: String },

    #[error("No active video frame to capture")]
    NoActiveFrame,

    #[error("Failed to encode captured frame")]
    EncodeFailed(#[source] image::ImageError),
}

impl CaptureError {
    pub fn device_unavailable(facing: Facing, reason: impl Into<String>) -> Self {
        CaptureError::DeviceUnavailable {
            facing,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not authorized to submit captures")]
    Unauthorized,

    #[error("Capture rejected by server ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Server error ({status}): {detail}")]
    Server { status: u16, detail: String },

    #[error("Could not build the upload request: {0}")]
    InvalidRequest(String),

    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    #[error("Capture is incomplete: {0}")]
    Incomplete(&'static str),

    #[error("Submission cancelled")]
    Cancelled,
}

impl SubmissionError {
    /// Whether resubmitting the same record can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubmissionError::Network(_)
                | SubmissionError::Server { .. }
                | SubmissionError::InvalidResponse(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum PickError {
    #[error("File selection cancelled")]
    Cancelled,

    #[error("Failed to read image file: {path}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a supported image: {path}")]
    NotAnImage { path: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine the platform config directory")]
    NoConfigDir,
}

/// An action attempted outside the state that accepts it.
///
/// This is a contract violation by the host, not something to show users.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{action} is not valid in state {state}")]
pub struct InvalidTransition {
    pub action: ActionKind,
    pub state: WorkflowState,
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
