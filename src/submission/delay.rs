use std::time::Duration;

use super::{AnalysisAccepted, CancelToken, CaptureSubmitter};
use crate::error::SubmissionError;
use crate::record::CaptureSnapshot;

/// Waits a processing delay before delegating, giving the user a window to cancel
pub struct DelayedSubmitter<S> {
    inner: S,
    delay: Duration,
}

impl<S: CaptureSubmitter> DelayedSubmitter<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<S: CaptureSubmitter> CaptureSubmitter for DelayedSubmitter<S> {
    fn submit_capture(
        &self,
        snapshot: &CaptureSnapshot,
        cancel: &CancelToken,
    ) -> Result<AnalysisAccepted, SubmissionError> {
        if !self.delay.is_zero() && !cancel.sleep(self.delay) {
            tracing::info!(
                target: "lesion_capture::submission",
                "Submission {} cancelled during processing delay",
                snapshot.session_id
            );
            return Err(SubmissionError::Cancelled);
        }

        if cancel.is_cancelled() {
            return Err(SubmissionError::Cancelled);
        }

        self.inner.submit_capture(snapshot, cancel)
    }
}
