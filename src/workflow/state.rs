/// Workflow state types
///
/// The controller's position in the flow, the camera condition within the
/// capture step, and the advisories it surfaces to users.

use crate::camera::Facing;
use crate::error::SubmissionError;
use crate::steps::Step;

/// Where the controller is in the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    /// Waiting for input on a step
    Step(Step),

    /// A submission is in flight (transitional state)
    Submitting,
}

impl WorkflowState {
    /// The step being shown, if not submitting
    pub fn step(&self) -> Option<Step> {
        match self {
            WorkflowState::Step(step) => Some(*step),
            WorkflowState::Submitting => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, WorkflowState::Submitting)
    }

    pub fn code(&self) -> &'static str {
        match self {
            WorkflowState::Step(step) => step.code(),
            WorkflowState::Submitting => "submitting",
        }
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        WorkflowState::Step(Step::Capture)
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Camera condition as seen by the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraStatus {
    Inactive,

    /// Waiting for the platform to grant a stream (permission prompt)
    Pending { facing: Facing },

    Active { facing: Facing },
}

impl CameraStatus {
    pub fn is_inactive(&self) -> bool {
        matches!(self, CameraStatus::Inactive)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CameraStatus::Pending { .. })
    }

    pub fn is_active(&self) -> bool {
        matches!(self, CameraStatus::Active { .. })
    }

    pub fn description(&self) -> &'static str {
        match self {
            CameraStatus::Inactive => "Camera off",
            CameraStatus::Pending { .. } => "Waiting for camera...",
            CameraStatus::Active { .. } => "Camera on",
        }
    }
}

/// A recoverable failure shown to the user; the record is left intact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// Camera denied or missing; the file picker remains available
    CameraUnavailable { facing: Facing, reason: String },

    /// Frame capture failed; the user can try again
    FrameUnavailable { reason: String },

    /// Submission failed; the user is back on review and may retry
    SubmissionFailed { error: SubmissionError },
}

impl Advisory {
    /// Text suitable for display
    pub fn message(&self) -> String {
        match self {
            Advisory::CameraUnavailable { reason, .. } => format!(
                "Unable to access camera ({}). Please check permissions or upload an image instead.",
                reason
            ),
            Advisory::FrameUnavailable { .. } => {
                "Could not capture a photo. Please try again.".to_string()
            }
            Advisory::SubmissionFailed { error } if error.is_retryable() => {
                format!("Submission failed: {}. Please try again.", error)
            }
            Advisory::SubmissionFailed { error } => format!("Submission failed: {}", error),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Advisory::CameraUnavailable { .. } | Advisory::FrameUnavailable { .. } => true,
            Advisory::SubmissionFailed { error } => error.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        let capture = WorkflowState::default();
        assert_eq!(capture.step(), Some(Step::Capture));
        assert!(!capture.is_submitting());

        assert_eq!(WorkflowState::Submitting.step(), None);
        assert!(WorkflowState::Submitting.is_submitting());
        assert_eq!(WorkflowState::Submitting.to_string(), "submitting");
    }

    #[test]
    fn test_camera_status_predicates() {
        let pending = CameraStatus::Pending {
            facing: Facing::User,
        };
        assert!(pending.is_pending());
        assert!(!pending.is_active());
        assert!(CameraStatus::Inactive.is_inactive());
    }

    #[test]
    fn test_advisory_messages() {
        let advisory = Advisory::CameraUnavailable {
            facing: Facing::Environment,
            reason: "permission denied".into(),
        };
        assert!(advisory.message().contains("upload an image instead"));

        let advisory = Advisory::SubmissionFailed {
            error: SubmissionError::Network("timed out".into()),
        };
        assert!(advisory.is_retryable());
        assert!(advisory.message().ends_with("Please try again."));

        let advisory = Advisory::SubmissionFailed {
            error: SubmissionError::Unauthorized,
        };
        assert!(!advisory.is_retryable());
    }
}
