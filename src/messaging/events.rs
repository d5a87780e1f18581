/// Event types for the capture workflow
///
/// Events represent things that have happened (past tense).
/// They are broadcast to all subscribers.
use uuid::Uuid;

use crate::camera::Facing;
use crate::submission::AnalysisAccepted;
use crate::workflow::{Advisory, CameraStatus, WorkflowState};

/// Workflow events
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// The controller moved between steps (or into/out of submitting)
    StepChanged {
        from: WorkflowState,
        to: WorkflowState,
    },

    /// Camera became pending, active or inactive
    CameraChanged { status: CameraStatus },

    /// A frame was captured into the record
    PhotoCaptured { facing: Facing, bytes: usize },

    /// An image file was placed into the record
    ImageSelected { bytes: usize },

    /// A recoverable failure needs the user's attention
    AdvisoryRaised { advisory: Advisory },

    SubmissionStarted { session_id: Uuid },

    /// The backend accepted the capture; the record has been discarded
    SubmissionCompleted {
        session_id: Uuid,
        accepted: AnalysisAccepted,
    },

    /// A fresh, empty session began
    SessionReset { session_id: Uuid },

    /// Executor is stopping
    Shutdown,
}

impl WorkflowEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            WorkflowEvent::StepChanged { from, to } => format!("Step changed: {} -> {}", from, to),
            WorkflowEvent::CameraChanged { status } => status.description().to_string(),
            WorkflowEvent::PhotoCaptured { facing, bytes } => {
                format!("Photo captured ({}, {} bytes)", facing, bytes)
            }
            WorkflowEvent::ImageSelected { bytes } => format!("Image selected ({} bytes)", bytes),
            WorkflowEvent::AdvisoryRaised { advisory } => advisory.message(),
            WorkflowEvent::SubmissionStarted { session_id } => {
                format!("Submission started: {}", session_id)
            }
            WorkflowEvent::SubmissionCompleted { accepted, .. } => {
                format!("Submission accepted: {}", accepted.message)
            }
            WorkflowEvent::SessionReset { session_id } => format!("New session: {}", session_id),
            WorkflowEvent::Shutdown => "Shutdown".to_string(),
        }
    }
}
