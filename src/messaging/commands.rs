/// Command types for the capture workflow
///
/// Commands represent requests to perform actions (imperative).
/// They are sent to the session executor, which applies them to the controller.
use crate::artifact::ImageArtifact;
use crate::camera::Facing;
use crate::record::{BodyRegion, SymptomCode};

/// Workflow commands
#[derive(Debug, Clone)]
pub enum WorkflowCommand {
    /// Ask the platform for a camera stream
    RequestCamera { facing: Facing },

    /// Swap front/back camera
    SwitchFacing { facing: Facing },

    /// Stop the camera (or abandon a pending request)
    CancelCamera,

    /// Capture the current frame
    CapturePhoto,

    /// Use an image chosen from disk instead of the camera
    SelectFile { artifact: ImageArtifact },

    Advance,
    Retreat,

    SetBodyRegion { region: BodyRegion },
    SetCustomLocation { text: String },
    ToggleSymptom { code: SymptomCode },
    SetNotes { text: String },

    /// Send the record for analysis
    Submit,

    /// Abandon the session (or the in-flight submission)
    Cancel,

    /// Start over with an empty record
    Reset,

    /// Tear the session down and stop the executor
    Shutdown,
}

impl WorkflowCommand {
    /// Workflow action this command maps to (`None` for executor control)
    pub fn kind(&self) -> Option<ActionKind> {
        let kind = match self {
            WorkflowCommand::RequestCamera { .. } => ActionKind::RequestCamera,
            WorkflowCommand::SwitchFacing { .. } => ActionKind::SwitchFacing,
            WorkflowCommand::CancelCamera => ActionKind::CancelCamera,
            WorkflowCommand::CapturePhoto => ActionKind::CapturePhoto,
            WorkflowCommand::SelectFile { .. } => ActionKind::SelectFile,
            WorkflowCommand::Advance => ActionKind::Advance,
            WorkflowCommand::Retreat => ActionKind::Retreat,
            WorkflowCommand::SetBodyRegion { .. } => ActionKind::SetBodyRegion,
            WorkflowCommand::SetCustomLocation { .. } => ActionKind::SetCustomLocation,
            WorkflowCommand::ToggleSymptom { .. } => ActionKind::ToggleSymptom,
            WorkflowCommand::SetNotes { .. } => ActionKind::SetNotes,
            WorkflowCommand::Submit => ActionKind::Submit,
            WorkflowCommand::Cancel => ActionKind::Cancel,
            WorkflowCommand::Reset => ActionKind::Reset,
            WorkflowCommand::Shutdown => return None,
        };
        Some(kind)
    }

    /// Get a human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            WorkflowCommand::RequestCamera { facing } => format!("Request camera ({})", facing),
            WorkflowCommand::SwitchFacing { facing } => format!("Switch camera to {}", facing),
            WorkflowCommand::CancelCamera => "Cancel camera".to_string(),
            WorkflowCommand::CapturePhoto => "Capture photo".to_string(),
            WorkflowCommand::SelectFile { artifact } => {
                let (width, height) = artifact.dimensions();
                format!("Select image file ({}x{}, {} bytes)", width, height, artifact.len())
            }
            WorkflowCommand::Advance => "Next step".to_string(),
            WorkflowCommand::Retreat => "Previous step".to_string(),
            WorkflowCommand::SetBodyRegion { region } => format!("Set body region: {}", region),
            WorkflowCommand::SetCustomLocation { text } => {
                format!("Set custom location: {}", text)
            }
            WorkflowCommand::ToggleSymptom { code } => format!("Toggle symptom: {}", code),
            // Notes may contain patient details; keep them out of the log
            WorkflowCommand::SetNotes { text } => format!("Set notes ({} chars)", text.chars().count()),
            WorkflowCommand::Submit => "Submit capture".to_string(),
            WorkflowCommand::Cancel => "Cancel session".to_string(),
            WorkflowCommand::Reset => "Reset session".to_string(),
            WorkflowCommand::Shutdown => "Shutdown".to_string(),
        }
    }
}

/// Kind of workflow action, used for transition checks and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    RequestCamera,
    SwitchFacing,
    CancelCamera,
    CapturePhoto,
    SelectFile,
    Advance,
    Retreat,
    SetBodyRegion,
    SetCustomLocation,
    ToggleSymptom,
    SetNotes,
    Submit,
    Cancel,
    Reset,
}

impl ActionKind {
    pub const ALL: [ActionKind; 14] = [
        ActionKind::RequestCamera,
        ActionKind::SwitchFacing,
        ActionKind::CancelCamera,
        ActionKind::CapturePhoto,
        ActionKind::SelectFile,
        ActionKind::Advance,
        ActionKind::Retreat,
        ActionKind::SetBodyRegion,
        ActionKind::SetCustomLocation,
        ActionKind::ToggleSymptom,
        ActionKind::SetNotes,
        ActionKind::Submit,
        ActionKind::Cancel,
        ActionKind::Reset,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ActionKind::RequestCamera => "request_camera",
            ActionKind::SwitchFacing => "switch_facing",
            ActionKind::CancelCamera => "cancel_camera",
            ActionKind::CapturePhoto => "capture_photo",
            ActionKind::SelectFile => "select_file",
            ActionKind::Advance => "advance",
            ActionKind::Retreat => "retreat",
            ActionKind::SetBodyRegion => "set_body_region",
            ActionKind::SetCustomLocation => "set_custom_location",
            ActionKind::ToggleSymptom => "toggle_symptom",
            ActionKind::SetNotes => "set_notes",
            ActionKind::Submit => "submit",
            ActionKind::Cancel => "cancel",
            ActionKind::Reset => "reset",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_description() {
        let cmd = WorkflowCommand::RequestCamera {
            facing: Facing::User,
        };
        assert_eq!(cmd.description(), "Request camera (user)");

        let cmd = WorkflowCommand::SetBodyRegion {
            region: BodyRegion::Neck,
        };
        assert_eq!(cmd.description(), "Set body region: neck");
    }

    #[test]
    fn test_notes_not_logged() {
        let cmd = WorkflowCommand::SetNotes {
            text: "patient name".into(),
        };
        assert_eq!(cmd.description(), "Set notes (12 chars)");
    }

    #[test]
    fn test_command_kind() {
        assert_eq!(WorkflowCommand::Submit.kind(), Some(ActionKind::Submit));
        assert_eq!(
            WorkflowCommand::ToggleSymptom {
                code: SymptomCode::Itching
            }
            .kind(),
            Some(ActionKind::ToggleSymptom)
        );
        assert_eq!(WorkflowCommand::Shutdown.kind(), None);
    }

    #[test]
    fn test_action_codes_unique() {
        let mut codes: Vec<_> = ActionKind::ALL.iter().map(|a| a.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), ActionKind::ALL.len());
    }
}
