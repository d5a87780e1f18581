/// Capture step definitions
///
/// Defines the ordered steps of one capture session.

use serde::{Deserialize, Serialize};

/// Capture step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Capture - Take a photo or pick an image file
    Capture,

    /// Locate - Select the body region of the lesion
    Locate,

    /// Symptoms - Tick any symptoms and add notes
    Symptoms,

    /// Review - Check everything and submit
    Review,
}

impl Step {
    /// All steps in order
    pub const ALL: [Step; 4] = [Step::Capture, Step::Locate, Step::Symptoms, Step::Review];

    /// Get step title
    pub fn title(&self) -> &'static str {
        match self {
            Step::Capture => "Capture Lesion Photo",
            Step::Locate => "Lesion Location",
            Step::Symptoms => "Symptoms",
            Step::Review => "Review & Submit",
        }
    }

    /// Get step description
    pub fn description(&self) -> &'static str {
        match self {
            Step::Capture => "Take a clear, well-lit photo of the lesion or choose an existing image",
            Step::Locate => "Select where on the body the lesion is located",
            Step::Symptoms => "Select any symptoms you have noticed and add notes",
            Step::Review => "Check the information below before submitting for analysis",
        }
    }

    /// Get step number (1-indexed)
    pub fn number(&self) -> usize {
        match self {
            Step::Capture => 1,
            Step::Locate => 2,
            Step::Symptoms => 3,
            Step::Review => 4,
        }
    }

    /// Get total number of steps
    pub fn total_steps() -> usize {
        Self::ALL.len()
    }

    /// Check if this is the first step
    pub fn is_first(&self) -> bool {
        matches!(self, Step::Capture)
    }

    /// Check if this is the last step
    pub fn is_last(&self) -> bool {
        matches!(self, Step::Review)
    }

    /// Get next step
    pub fn next(&self) -> Option<Step> {
        match self {
            Step::Capture => Some(Step::Locate),
            Step::Locate => Some(Step::Symptoms),
            Step::Symptoms => Some(Step::Review),
            Step::Review => None,
        }
    }

    /// Get previous step
    pub fn previous(&self) -> Option<Step> {
        match self {
            Step::Capture => None,
            Step::Locate => Some(Step::Capture),
            Step::Symptoms => Some(Step::Locate),
            Step::Review => Some(Step::Symptoms),
        }
    }

    /// Fraction of the flow reached when standing on this step (0.25-1.0)
    pub fn progress(&self) -> f32 {
        self.number() as f32 / Self::total_steps() as f32
    }

    /// Short machine-friendly name
    pub fn code(&self) -> &'static str {
        match self {
            Step::Capture => "capture",
            Step::Locate => "locate",
            Step::Symptoms => "symptoms",
            Step::Review => "review",
        }
    }
}

impl Default for Step {
    fn default() -> Self {
        Step::Capture
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
