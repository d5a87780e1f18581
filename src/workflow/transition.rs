/// Workflow transitions
///
/// Pure functions deciding which actions are legal in a state and where
/// navigation leads. The controller applies the results; nothing here touches
/// the camera or performs I/O.

use super::state::{CameraStatus, WorkflowState};
use crate::error::InvalidTransition;
use crate::gate::{GateBlock, StepGate};
use crate::messaging::ActionKind;
use crate::record::CaptureRecord;
use crate::steps::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Why a navigation request did not move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationBlock {
    /// The current step's gate refused
    Gate(GateBlock),

    /// Already at the first step
    FirstStep,
}

impl std::fmt::Display for NavigationBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationBlock::Gate(block) => write!(f, "{}", block),
            NavigationBlock::FirstStep => write!(f, "Already at the first step"),
        }
    }
}

/// Navigation result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Navigation succeeded, now on new step
    Moved(Step),

    /// Navigation blocked (at boundary or gate refused)
    Blocked(NavigationBlock),
}

/// Where `direction` leads from `step` given the record
pub fn navigate(step: Step, direction: Direction, record: &CaptureRecord) -> Navigation {
    match direction {
        Direction::Forward => match StepGate::check(step, record) {
            Err(block) => Navigation::Blocked(NavigationBlock::Gate(block)),
            Ok(()) => match step.next() {
                Some(next) => Navigation::Moved(next),
                None => Navigation::Blocked(NavigationBlock::Gate(GateBlock::FinalStep)),
            },
        },
        Direction::Backward => match step.previous() {
            Some(previous) => Navigation::Moved(previous),
            None => Navigation::Blocked(NavigationBlock::FirstStep),
        },
    }
}

/// Whether `action` may be applied in `state` with the camera in `camera`
///
/// Camera actions only exist on the capture step. Navigation waits for a
/// pending camera request to settle. Nothing but reset and cancel is accepted
/// while a submission is in flight.
pub fn permit(
    state: WorkflowState,
    camera: CameraStatus,
    action: ActionKind,
) -> Result<(), InvalidTransition> {
    let at = |step: Step| state == WorkflowState::Step(step);

    let allowed = match action {
        ActionKind::Reset | ActionKind::Cancel => true,
        ActionKind::RequestCamera | ActionKind::SelectFile => {
            at(Step::Capture) && camera.is_inactive()
        }
        ActionKind::SwitchFacing | ActionKind::CapturePhoto => {
            at(Step::Capture) && camera.is_active()
        }
        ActionKind::CancelCamera => at(Step::Capture),
        ActionKind::Advance | ActionKind::Retreat => {
            state.step().is_some() && !camera.is_pending()
        }
        ActionKind::SetBodyRegion | ActionKind::SetCustomLocation => at(Step::Locate),
        ActionKind::ToggleSymptom => at(Step::Symptoms),
        ActionKind::SetNotes => at(Step::Symptoms) || at(Step::Review),
        ActionKind::Submit => at(Step::Review),
    };

    if allowed {
        Ok(())
    } else {
        Err(InvalidTransition { action, state })
    }
}
