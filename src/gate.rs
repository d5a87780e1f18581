/// Step gating
///
/// Decides whether the user may move forward from a step given the current
/// record. Pure functions: calling them never touches the camera or record.

use crate::record::CaptureRecord;
use crate::steps::Step;

/// Why forward navigation is currently disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateBlock {
    /// Capture needs a photo or image file
    MissingImage,

    /// Locate needs a body region
    MissingBodyRegion,

    /// Review has no forward step; submission is a separate action
    FinalStep,
}

impl std::fmt::Display for GateBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateBlock::MissingImage => write!(f, "Take or select a photo first"),
            GateBlock::MissingBodyRegion => write!(f, "Select where the lesion is located"),
            GateBlock::FinalStep => write!(f, "Already at the final step"),
        }
    }
}

pub struct StepGate;

impl StepGate {
    /// Whether leaving `step` forward is allowed
    pub fn can_advance(step: Step, record: &CaptureRecord) -> bool {
        Self::check(step, record).is_ok()
    }

    /// Same as [`StepGate::can_advance`], with the reason when refused
    pub fn check(step: Step, record: &CaptureRecord) -> Result<(), GateBlock> {
        match step {
            Step::Capture if !record.has_image() => Err(GateBlock::MissingImage),
            // Custom text for `Other` is optional; only the region is required.
            Step::Locate if record.body_region().is_none() => Err(GateBlock::MissingBodyRegion),
            Step::Review => Err(GateBlock::FinalStep),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{sample_png, ArtifactSource, ImageArtifact};
    use crate::camera::Facing;
    use crate::record::{BodyRegion, SymptomCode};

    fn record_with_image() -> CaptureRecord {
        let mut record = CaptureRecord::new();
        record.set_image(
            ImageArtifact::from_bytes(
                sample_png(2, 2),
                ArtifactSource::CameraFrame {
                    facing: Facing::User,
                },
            )
            .unwrap(),
        );
        record
    }

    #[test]
    fn test_capture_requires_image() {
        let record = CaptureRecord::new();
        assert!(!StepGate::can_advance(Step::Capture, &record));
        assert_eq!(
            StepGate::check(Step::Capture, &record),
            Err(GateBlock::MissingImage)
        );

        assert!(StepGate::can_advance(Step::Capture, &record_with_image()));
    }

    #[test]
    fn test_locate_requires_region_not_text() {
        let mut record = record_with_image();
        assert!(!StepGate::can_advance(Step::Locate, &record));

        record.set_body_region(BodyRegion::Other);
        assert!(record.custom_location().is_none());
        assert!(StepGate::can_advance(Step::Locate, &record));
    }

    #[test]
    fn test_symptoms_always_pass() {
        let mut record = CaptureRecord::new();
        assert!(StepGate::can_advance(Step::Symptoms, &record));

        record.toggle_symptom(SymptomCode::Pain);
        assert!(StepGate::can_advance(Step::Symptoms, &record));
    }

    #[test]
    fn test_review_is_terminal() {
        assert_eq!(
            StepGate::check(Step::Review, &record_with_image()),
            Err(GateBlock::FinalStep)
        );
    }

    #[test]
    fn test_gate_is_repeatable() {
        let record = record_with_image();
        let before = record.clone();
        for _ in 0..3 {
            assert!(StepGate::can_advance(Step::Capture, &record));
        }
        assert_eq!(record, before);
    }
}
