/// Submission module
///
/// The single contract between the capture workflow and the analysis backend.
///
/// ## Architecture
///
/// ```text
/// WorkflowController ── CaptureSnapshot ──> CaptureSubmitter (worker thread)
///                                             ├── HttpSubmitter (reqwest multipart upload)
///                                             └── DelayedSubmitter (cancellable processing wait)
/// ```

pub mod cancel;
pub mod delay;
pub mod http;

use chrono::{DateTime, Utc};

use crate::error::SubmissionError;
use crate::record::CaptureSnapshot;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use delay::DelayedSubmitter;
pub use http::HttpSubmitter;

/// Acknowledgment that the backend accepted a capture for analysis.
///
/// The workflow only cares that it succeeded; analysis content is not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisAccepted {
    pub message: String,
    pub needs_cadre_review: bool,
    pub needs_doctor_review: bool,
    pub accepted_at: DateTime<Utc>,
}

impl AnalysisAccepted {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            needs_cadre_review: false,
            needs_doctor_review: false,
            accepted_at: Utc::now(),
        }
    }
}

/// Hands a completed capture to the analysis backend.
///
/// Called on a worker thread; implementations should check `cancel` before
/// doing anything expensive.
pub trait CaptureSubmitter: Send + Sync {
    fn submit_capture(
        &self,
        snapshot: &CaptureSnapshot,
        cancel: &CancelToken,
    ) -> Result<AnalysisAccepted, SubmissionError>;
}

impl<S: CaptureSubmitter + ?Sized> CaptureSubmitter for std::sync::Arc<S> {
    fn submit_capture(
        &self,
        snapshot: &CaptureSnapshot,
        cancel: &CancelToken,
    ) -> Result<AnalysisAccepted, SubmissionError> {
        (**self).submit_capture(snapshot, cancel)
    }
}
