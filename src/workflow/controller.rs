use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use uuid::Uuid;

use super::state::{Advisory, CameraStatus, WorkflowState};
use super::transition::{self, Direction, Navigation, NavigationBlock};
use crate::artifact::ImageArtifact;
use crate::camera::{
    AcquireRequest, CameraResource, Facing, FrameGrabber, MediaDevices, ResolutionHint, VideoStream,
};
use crate::config::Config;
use crate::error::{CaptureError, InvalidTransition, SubmissionError};
use crate::gate::StepGate;
use crate::messaging::{ActionKind, EventBus, WorkflowCommand, WorkflowEvent};
use crate::record::{BodyRegion, CaptureRecord, CaptureSnapshot, SymptomCode};
use crate::steps::Step;
use crate::submission::{AnalysisAccepted, CancelToken, CaptureSubmitter};

const LOG_TARGET: &str = "lesion_capture::workflow";

/// Device settings applied to every session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub resolution_hint: ResolutionHint,
    pub jpeg_quality: u8,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ControllerOptions {
    fn from(config: &Config) -> Self {
        Self {
            resolution_hint: config.resolution_hint,
            jpeg_quality: config.jpeg_quality,
        }
    }
}

/// What an action did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The controller is now on this step
    Moved(Step),

    /// Record or camera changed; the step did not
    Updated,

    /// Background work started; its result arrives through `poll`/`wait_pending`
    Pending,

    /// Navigation refused (disabled control, not an error)
    Blocked(NavigationBlock),

    /// A recoverable failure; the advisory is also kept on the controller
    Failed(Advisory),

    /// The backend accepted the capture and a fresh session has begun
    Completed(AnalysisAccepted),

    /// The action is not valid in the current state; nothing changed
    Rejected(InvalidTransition),
}

impl ActionOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, ActionOutcome::Rejected(_))
    }
}

/// Result of background work, delivered over the controller's completion channel
pub struct TaskCompletion {
    generation: u64,
    result: TaskResult,
}

enum TaskResult {
    Camera {
        facing: Facing,
        result: Result<StreamHandoff, CaptureError>,
    },
    Submission(Result<AnalysisAccepted, SubmissionError>),
}

/// A stream on its way from a worker to the camera resource.
///
/// Stopped on drop unless taken, so a stream that arrives after cancel, or
/// after the controller is gone, never stays open.
struct StreamHandoff(Option<Box<dyn VideoStream>>);

impl StreamHandoff {
    fn take(mut self) -> Option<Box<dyn VideoStream>> {
        self.0.take()
    }
}

impl Drop for StreamHandoff {
    fn drop(&mut self) {
        if let Some(mut stream) = self.0.take() {
            stream.stop();
            tracing::debug!(target: LOG_TARGET, "Stopped late camera stream ({})", stream.facing());
        }
    }
}

impl std::fmt::Debug for TaskCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.result {
            TaskResult::Camera { .. } => "camera",
            TaskResult::Submission(_) => "submission",
        };
        f.debug_struct("TaskCompletion")
            .field("generation", &self.generation)
            .field("kind", &kind)
            .finish()
    }
}

/// Drives one capture session at a time through the capture steps
///
/// # State
/// - `state`: current step, or `Submitting` while the backend call runs
/// - `record`: data collected so far, discarded on reset or accepted submission
/// - `camera`: at most one live stream, only ever active on the capture step
///
/// # Background work
/// Camera requests and submissions run on worker threads. Each one gets a
/// generation number; completions from an older generation (after cancel or
/// reset) are thrown away, and a camera stream that arrives too late is
/// stopped on the spot.
pub struct WorkflowController {
    state: WorkflowState,
    record: CaptureRecord,
    session_id: Uuid,
    camera: CameraResource,
    camera_request: Option<Facing>,
    grabber: FrameGrabber,
    devices: Arc<dyn MediaDevices>,
    submitter: Arc<dyn CaptureSubmitter>,
    events: EventBus,
    advisory: Option<Advisory>,
    generation: u64,
    pending: Option<CancelToken>,
    completion_tx: Sender<TaskCompletion>,
    completion_rx: Receiver<TaskCompletion>,
}

impl WorkflowController {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        submitter: Arc<dyn CaptureSubmitter>,
        options: ControllerOptions,
    ) -> Self {
        let (completion_tx, completion_rx) = unbounded();
        let session_id = Uuid::new_v4();
        tracing::info!(target: LOG_TARGET, "Capture session started: {}", session_id);

        Self {
            state: WorkflowState::default(),
            record: CaptureRecord::new(),
            session_id,
            camera: CameraResource::new(options.resolution_hint),
            camera_request: None,
            grabber: FrameGrabber::new(options.jpeg_quality),
            devices,
            submitter,
            events: EventBus::new(),
            advisory: None,
            generation: 0,
            pending: None,
            completion_tx,
            completion_rx,
        }
    }

    /// Publish events on `events` instead of a private bus
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn current_step(&self) -> Option<Step> {
        self.state.step()
    }

    pub fn record(&self) -> &CaptureRecord {
        &self.record
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn camera_status(&self) -> CameraStatus {
        if let Some(facing) = self.camera_request {
            CameraStatus::Pending { facing }
        } else if self.camera.is_active() {
            CameraStatus::Active {
                facing: self.camera.facing(),
            }
        } else {
            CameraStatus::Inactive
        }
    }

    pub fn is_camera_active(&self) -> bool {
        self.camera.is_active()
    }

    /// Latest advisory, cleared by the next accepted action
    pub fn advisory(&self) -> Option<&Advisory> {
        self.advisory.as_ref()
    }

    pub fn dismiss_advisory(&mut self) {
        self.advisory = None;
    }

    /// Whether background work (camera request or submission) is outstanding
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the forward control should be enabled
    pub fn can_advance(&self) -> bool {
        match self.state {
            WorkflowState::Step(step) => {
                !self.camera_status().is_pending() && StepGate::can_advance(step, &self.record)
            }
            WorkflowState::Submitting => false,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Receiver for background completions, for hosts running their own loop
    pub fn completions(&self) -> Receiver<TaskCompletion> {
        self.completion_rx.clone()
    }

    /// Apply a command
    pub fn dispatch(&mut self, command: WorkflowCommand) -> ActionOutcome {
        match command {
            WorkflowCommand::RequestCamera { facing } => self.request_camera(facing),
            WorkflowCommand::SwitchFacing { facing } => self.switch_facing(facing),
            WorkflowCommand::CancelCamera => self.cancel_camera(),
            WorkflowCommand::CapturePhoto => self.capture_photo(),
            WorkflowCommand::SelectFile { artifact } => self.select_file(artifact),
            WorkflowCommand::Advance => self.advance(),
            WorkflowCommand::Retreat => self.retreat(),
            WorkflowCommand::SetBodyRegion { region } => self.set_body_region(region),
            WorkflowCommand::SetCustomLocation { text } => self.set_custom_location(text),
            WorkflowCommand::ToggleSymptom { code } => self.toggle_symptom(code),
            WorkflowCommand::SetNotes { text } => self.set_notes(text),
            WorkflowCommand::Submit => self.submit(),
            WorkflowCommand::Cancel => self.cancel(),
            WorkflowCommand::Reset => self.reset(),
            WorkflowCommand::Shutdown => {
                self.teardown();
                ActionOutcome::Updated
            }
        }
    }

    /// Ask for a camera stream; the result arrives as a completion
    pub fn request_camera(&mut self, facing: Facing) -> ActionOutcome {
        if let Err(outcome) = self.permit(ActionKind::RequestCamera) {
            return outcome;
        }
        self.advisory = None;
        let request = self.camera.begin_acquire(facing);
        self.start_camera_request(request)
    }

    /// Stop the current stream and request one with `facing`
    pub fn switch_facing(&mut self, facing: Facing) -> ActionOutcome {
        if let Err(outcome) = self.permit(ActionKind::SwitchFacing) {
            return outcome;
        }
        self.advisory = None;
        let request = self.camera.switch_facing(facing);
        self.start_camera_request(request)
    }

    /// Stop the camera, abandoning a pending request
    pub fn cancel_camera(&mut self) -> ActionOutcome {
        if let Err(outcome) = self.permit(ActionKind::CancelCamera) {
            return outcome;
        }
        self.cancel_pending();
        self.release_camera();
        ActionOutcome::Updated
    }

    /// Store the current frame and move on to locating it
    ///
    /// The camera is released whether or not the frame could be grabbed.
    pub fn capture_photo(&mut self) -> ActionOutcome {
        if let Err(outcome) = self.permit(ActionKind::CapturePhoto) {
            return outcome;
        }

        let facing = self.camera.facing();
        let grabbed = self.grabber.grab(&self.camera);
        self.release_camera();

        match grabbed {
            Ok(artifact) => {
                let bytes = artifact.len();
                self.record.set_image(artifact);
                self.advisory = None;
                tracing::info!(target: LOG_TARGET, "Photo captured ({}, {} bytes)", facing, bytes);
                self.events
                    .publish(WorkflowEvent::PhotoCaptured { facing, bytes });
                self.move_to(Step::Locate)
            }
            Err(err) => self.raise(Advisory::FrameUnavailable {
                reason: err.to_string(),
            }),
        }
    }

    /// Use an image chosen from disk; the camera must already be released
    pub fn select_file(&mut self, artifact: ImageArtifact) -> ActionOutcome {
        if let Err(outcome) = self.permit(ActionKind::SelectFile) {
            return outcome;
        }

        let bytes = artifact.len();
        self.record.set_image(artifact);
        self.advisory = None;
        tracing::info!(target: LOG_TARGET, "Image file selected ({} bytes)", bytes);
        self.events.publish(WorkflowEvent::ImageSelected { bytes });
        self.move_to(Step::Locate)
    }

    pub fn advance(&mut self) -> ActionOutcome {
        self.navigate(ActionKind::Advance, Direction::Forward)
    }

    pub fn retreat(&mut self) -> ActionOutcome {
        self.navigate(ActionKind::Retreat, Direction::Backward)
    }

    pub fn set_body_region(&mut self, region: BodyRegion) -> ActionOutcome {
        if let Err(outcome) = self.permit(ActionKind::SetBodyRegion) {
            return outcome;
        }
        if region.is_high_risk() {
            tracing::info!(target: LOG_TARGET, "High-risk body region selected: {}", region);
        }
        self.record.set_body_region(region);
        ActionOutcome::Updated
    }

    /// Free text describing the location; only used when the region is `Other`
    pub fn set_custom_location(&mut self, text: impl Into<String>) -> ActionOutcome {
        if let Err(outcome) = self.permit(ActionKind::SetCustomLocation) {
            return outcome;
        }
        self.record.set_custom_location_text(text.into());
        ActionOutcome::Updated
    }

    pub fn toggle_symptom(&mut self, code: SymptomCode) -> ActionOutcome {
        if let Err(outcome) = self.permit(ActionKind::ToggleSymptom) {
            return outcome;
        }
        let present = self.record.toggle_symptom(code);
        tracing::debug!(target: LOG_TARGET, "Symptom {} {}", code, if present { "added" } else { "removed" });
        ActionOutcome::Updated
    }

    pub fn set_notes(&mut self, text: impl Into<String>) -> ActionOutcome {
        if let Err(outcome) = self.permit(ActionKind::SetNotes) {
            return outcome;
        }
        self.record.set_notes(text.into());
        ActionOutcome::Updated
    }

    /// Send a snapshot of the record to the backend on a worker thread
    pub fn submit(&mut self) -> ActionOutcome {
        if let Err(outcome) = self.permit(ActionKind::Submit) {
            return outcome;
        }

        let snapshot = match CaptureSnapshot::from_record(self.session_id, &self.record) {
            Ok(snapshot) => snapshot,
            Err(error) => return self.raise(Advisory::SubmissionFailed { error }),
        };

        self.advisory = None;
        let (generation, cancel, tx) = self.begin_task();
        let submitter = Arc::clone(&self.submitter);
        thread::spawn(move || {
            let result = submitter.submit_capture(&snapshot, &cancel);
            // A closed channel means the controller is gone; nothing to clean up
            let _ = tx.send(TaskCompletion {
                generation,
                result: TaskResult::Submission(result),
            });
        });

        tracing::info!(target: LOG_TARGET, "Submitting capture {}", self.session_id);
        self.set_state(WorkflowState::Submitting);
        self.events.publish(WorkflowEvent::SubmissionStarted {
            session_id: self.session_id,
        });
        ActionOutcome::Pending
    }

    /// Abandon the session, including an in-flight submission
    pub fn cancel(&mut self) -> ActionOutcome {
        if self.state.is_submitting() {
            tracing::info!(target: LOG_TARGET, "Submission {} cancelled", self.session_id);
        }
        self.reset()
    }

    /// Release the camera, discard the record and start over on the capture step
    pub fn reset(&mut self) -> ActionOutcome {
        self.start_new_session();
        ActionOutcome::Moved(Step::Capture)
    }

    /// Cancel background work and release the camera; the record is kept
    pub fn teardown(&mut self) {
        self.cancel_pending();
        self.release_camera();
    }

    /// Apply every completion that has already arrived
    pub fn poll(&mut self) -> Vec<ActionOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            if let Some(outcome) = self.on_completion(completion) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Block until the outstanding task resolves or `timeout` passes
    ///
    /// Returns `None` when nothing was pending or the wait timed out.
    pub fn wait_pending(&mut self, timeout: Duration) -> Option<ActionOutcome> {
        let deadline = Instant::now() + timeout;
        while self.pending.is_some() {
            match self.completion_rx.recv_deadline(deadline) {
                Ok(completion) => {
                    if let Some(outcome) = self.on_completion(completion) {
                        return Some(outcome);
                    }
                }
                Err(_) => return None,
            }
        }
        None
    }

    /// Apply one background completion; stale ones are discarded (`None`)
    pub fn on_completion(&mut self, completion: TaskCompletion) -> Option<ActionOutcome> {
        if self.pending.is_none() || completion.generation != self.generation {
            tracing::debug!(target: LOG_TARGET, "Discarding stale completion {:?}", completion);
            return None;
        }
        self.pending = None;

        match completion.result {
            TaskResult::Camera { facing, result } => {
                self.camera_request = None;
                match result {
                    Ok(handoff) => {
                        if let Some(stream) = handoff.take() {
                            self.camera.bind(stream);
                        }
                        self.events.publish(WorkflowEvent::CameraChanged {
                            status: self.camera_status(),
                        });
                        Some(ActionOutcome::Updated)
                    }
                    Err(err) => {
                        self.events.publish(WorkflowEvent::CameraChanged {
                            status: CameraStatus::Inactive,
                        });
                        Some(self.raise(Advisory::CameraUnavailable {
                            facing,
                            reason: match err {
                                CaptureError::DeviceUnavailable { reason, .. } => reason,
                                other => other.to_string(),
                            },
                        }))
                    }
                }
            }
            TaskResult::Submission(Ok(accepted)) => {
                tracing::info!(
                    target: LOG_TARGET,
                    "Capture {} accepted: {}",
                    self.session_id,
                    accepted.message
                );
                self.events.publish(WorkflowEvent::SubmissionCompleted {
                    session_id: self.session_id,
                    accepted: accepted.clone(),
                });
                self.start_new_session();
                Some(ActionOutcome::Completed(accepted))
            }
            TaskResult::Submission(Err(error)) => {
                self.set_state(WorkflowState::Step(Step::Review));
                Some(self.raise(Advisory::SubmissionFailed { error }))
            }
        }
    }

    fn permit(&self, action: ActionKind) -> Result<(), ActionOutcome> {
        transition::permit(self.state, self.camera_status(), action).map_err(|err| {
            tracing::debug!(target: LOG_TARGET, "Ignored: {}", err);
            ActionOutcome::Rejected(err)
        })
    }

    fn navigate(&mut self, action: ActionKind, direction: Direction) -> ActionOutcome {
        if let Err(outcome) = self.permit(action) {
            return outcome;
        }
        let WorkflowState::Step(step) = self.state else {
            return ActionOutcome::Rejected(InvalidTransition {
                action,
                state: self.state,
            });
        };

        match transition::navigate(step, direction, &self.record) {
            Navigation::Moved(next) => {
                if step == Step::Capture {
                    self.release_camera();
                }
                self.advisory = None;
                self.move_to(next)
            }
            Navigation::Blocked(block) => {
                tracing::debug!(target: LOG_TARGET, "Navigation blocked on {}: {}", step, block);
                ActionOutcome::Blocked(block)
            }
        }
    }

    fn start_camera_request(&mut self, request: AcquireRequest) -> ActionOutcome {
        if request.replaced_stream() {
            self.events.publish(WorkflowEvent::CameraChanged {
                status: CameraStatus::Inactive,
            });
        }
        let facing = request.facing();
        let (generation, _cancel, tx) = self.begin_task();
        self.camera_request = Some(facing);

        let devices = Arc::clone(&self.devices);
        thread::spawn(move || {
            let result = request
                .open(devices.as_ref())
                .map(|stream| StreamHandoff(Some(stream)));
            // If the controller is gone the handoff is dropped, stopping the stream
            let _ = tx.send(TaskCompletion {
                generation,
                result: TaskResult::Camera { facing, result },
            });
        });

        tracing::info!(target: LOG_TARGET, "Camera requested ({})", facing);
        self.events.publish(WorkflowEvent::CameraChanged {
            status: CameraStatus::Pending { facing },
        });
        ActionOutcome::Pending
    }

    fn begin_task(&mut self) -> (u64, CancelToken, Sender<TaskCompletion>) {
        self.cancel_pending();
        self.generation += 1;
        let cancel = CancelToken::new();
        self.pending = Some(cancel.clone());
        (self.generation, cancel, self.completion_tx.clone())
    }

    fn cancel_pending(&mut self) {
        if let Some(cancel) = self.pending.take() {
            cancel.cancel();
            tracing::debug!(target: LOG_TARGET, "Cancelled task generation {}", self.generation);
        }
        if self.camera_request.take().is_some() {
            self.events.publish(WorkflowEvent::CameraChanged {
                status: CameraStatus::Inactive,
            });
        }
    }

    fn release_camera(&mut self) {
        if self.camera.release() {
            self.events.publish(WorkflowEvent::CameraChanged {
                status: CameraStatus::Inactive,
            });
        }
    }

    fn start_new_session(&mut self) {
        self.teardown();
        self.record = CaptureRecord::new();
        self.advisory = None;
        self.session_id = Uuid::new_v4();
        self.set_state(WorkflowState::Step(Step::Capture));

        tracing::info!(target: LOG_TARGET, "Capture session started: {}", self.session_id);
        self.events.publish(WorkflowEvent::SessionReset {
            session_id: self.session_id,
        });
    }

    fn move_to(&mut self, step: Step) -> ActionOutcome {
        self.set_state(WorkflowState::Step(step));
        ActionOutcome::Moved(step)
    }

    fn set_state(&mut self, to: WorkflowState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::info!(target: LOG_TARGET, "Step changed: {} -> {}", from, to);
        self.events.publish(WorkflowEvent::StepChanged { from, to });
    }

    fn raise(&mut self, advisory: Advisory) -> ActionOutcome {
        tracing::warn!(target: LOG_TARGET, "{}", advisory.message());
        self.advisory = Some(advisory.clone());
        self.events.publish(WorkflowEvent::AdvisoryRaised {
            advisory: advisory.clone(),
        });
        ActionOutcome::Failed(advisory)
    }
}

impl Drop for WorkflowController {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowController")
            .field("state", &self.state)
            .field("session_id", &self.session_id)
            .field("camera", &self.camera_status())
            .field("record", &self.record)
            .field("advisory", &self.advisory)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{sample_png, ArtifactSource};
    use crate::camera::SyntheticDevices;
    use parking_lot::Mutex;

    const WAIT: Duration = Duration::from_secs(5);

    /// Returns queued results in order, then accepts
    #[derive(Default)]
    struct ScriptedSubmitter {
        script: Mutex<Vec<Result<AnalysisAccepted, SubmissionError>>>,
        seen: Mutex<Vec<CaptureSnapshot>>,
    }

    impl ScriptedSubmitter {
        fn failing_once(error: SubmissionError) -> Self {
            Self {
                script: Mutex::new(vec![Err(error)]),
                ..Self::default()
            }
        }
    }

    impl CaptureSubmitter for ScriptedSubmitter {
        fn submit_capture(
            &self,
            snapshot: &CaptureSnapshot,
            _cancel: &CancelToken,
        ) -> Result<AnalysisAccepted, SubmissionError> {
            self.seen.lock().push(snapshot.clone());
            let mut script = self.script.lock();
            if script.is_empty() {
                Ok(AnalysisAccepted::new("Analysis complete"))
            } else {
                script.remove(0)
            }
        }
    }

    fn controller_with(
        devices: SyntheticDevices,
        submitter: Arc<ScriptedSubmitter>,
    ) -> WorkflowController {
        WorkflowController::new(Arc::new(devices), submitter, ControllerOptions::default())
    }

    fn file_artifact() -> ImageArtifact {
        ImageArtifact::from_bytes(
            sample_png(8, 8),
            ArtifactSource::File {
                path: "lesion.png".into(),
            },
        )
        .unwrap()
    }

    fn controller_at_review(submitter: Arc<ScriptedSubmitter>) -> WorkflowController {
        let mut controller = controller_with(SyntheticDevices::new(), submitter);
        controller.select_file(file_artifact());
        controller.set_body_region(BodyRegion::Arms);
        assert_eq!(controller.advance(), ActionOutcome::Moved(Step::Symptoms));
        assert_eq!(controller.advance(), ActionOutcome::Moved(Step::Review));
        controller
    }

    #[test]
    fn test_initial_state() {
        let controller = controller_with(SyntheticDevices::new(), Arc::default());
        assert_eq!(controller.state(), WorkflowState::Step(Step::Capture));
        assert!(controller.record().is_empty());
        assert_eq!(controller.camera_status(), CameraStatus::Inactive);
        assert!(!controller.can_advance());
    }

    #[test]
    fn test_camera_request_completes() {
        let mut controller = controller_with(SyntheticDevices::new(), Arc::default());

        assert_eq!(controller.request_camera(Facing::User), ActionOutcome::Pending);
        assert_eq!(
            controller.camera_status(),
            CameraStatus::Pending {
                facing: Facing::User
            }
        );
        assert_eq!(controller.wait_pending(WAIT), Some(ActionOutcome::Updated));
        assert_eq!(
            controller.camera_status(),
            CameraStatus::Active {
                facing: Facing::User
            }
        );
    }

    #[test]
    fn test_poll_applies_arrived_completions() {
        let mut controller = controller_with(SyntheticDevices::new(), Arc::default());
        assert!(controller.poll().is_empty());

        controller.request_camera(Facing::Environment);
        let mut outcomes = Vec::new();
        let deadline = Instant::now() + WAIT;
        while outcomes.is_empty() && Instant::now() < deadline {
            outcomes = controller.poll();
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(outcomes, vec![ActionOutcome::Updated]);
        assert!(controller.is_camera_active());
        assert!(!controller.is_busy());
    }

    #[test]
    fn test_denied_camera_raises_advisory() {
        let devices = SyntheticDevices::new().unavailable();
        let mut controller = controller_with(devices, Arc::default());

        controller.request_camera(Facing::Environment);
        let outcome = controller.wait_pending(WAIT).unwrap();
        assert!(matches!(
            outcome,
            ActionOutcome::Failed(Advisory::CameraUnavailable { .. })
        ));
        assert_eq!(controller.state(), WorkflowState::Step(Step::Capture));
        assert!(!controller.is_camera_active());

        // File selection is still available
        assert_eq!(
            controller.select_file(file_artifact()),
            ActionOutcome::Moved(Step::Locate)
        );
        assert!(controller.advisory().is_none());
    }

    #[test]
    fn test_capture_photo_releases_and_advances() {
        let devices = SyntheticDevices::new().with_frame_size(32, 24);
        let ledger = devices.ledger().clone();
        let mut controller = controller_with(devices, Arc::default());

        controller.request_camera(Facing::Environment);
        controller.wait_pending(WAIT);

        assert_eq!(controller.capture_photo(), ActionOutcome::Moved(Step::Locate));
        assert!(!controller.is_camera_active());
        let image = controller.record().image().unwrap();
        assert_eq!(image.dimensions(), (32, 24));
        assert_eq!(ledger.live_count(), 0);
    }

    #[test]
    fn test_failed_capture_still_releases() {
        let devices = SyntheticDevices::new().with_frame_size(0, 0);
        let ledger = devices.ledger().clone();
        let mut controller = controller_with(devices, Arc::default());

        controller.request_camera(Facing::Environment);
        controller.wait_pending(WAIT);

        let outcome = controller.capture_photo();
        assert!(matches!(
            outcome,
            ActionOutcome::Failed(Advisory::FrameUnavailable { .. })
        ));
        assert_eq!(controller.state(), WorkflowState::Step(Step::Capture));
        assert!(!controller.record().has_image());
        assert!(!controller.is_camera_active());
        assert_eq!(ledger.stopped_count(Facing::Environment), 1);
    }

    #[test]
    fn test_select_file_refused_while_camera_active() {
        let mut controller = controller_with(SyntheticDevices::new(), Arc::default());
        controller.request_camera(Facing::Environment);
        controller.wait_pending(WAIT);

        assert!(controller.select_file(file_artifact()).is_rejected());
        assert!(!controller.record().has_image());
    }

    #[test]
    fn test_cancel_pending_camera_stops_late_stream() {
        let devices = SyntheticDevices::new().with_latency(Duration::from_millis(50));
        let ledger = devices.ledger().clone();
        let mut controller = controller_with(devices, Arc::default());

        controller.request_camera(Facing::User);
        assert_eq!(controller.cancel_camera(), ActionOutcome::Updated);
        assert_eq!(controller.camera_status(), CameraStatus::Inactive);

        // The late completion is discarded and its stream stopped
        let late = controller.completions().recv_timeout(WAIT).unwrap();
        assert_eq!(controller.on_completion(late), None);
        assert!(!controller.is_camera_active());
        assert_eq!(ledger.opened_count(Facing::User), 1);
        assert_eq!(ledger.live_count(), 0);
    }

    #[test]
    fn test_navigation_refused_while_camera_pending() {
        let devices = SyntheticDevices::new().with_latency(Duration::from_millis(20));
        let mut controller = controller_with(devices, Arc::default());

        controller.request_camera(Facing::Environment);
        assert!(controller.advance().is_rejected());
        assert!(!controller.can_advance());
        controller.wait_pending(WAIT);
    }

    #[test]
    fn test_advance_out_of_capture_releases_camera() {
        let mut controller = controller_with(SyntheticDevices::new(), Arc::default());
        controller.select_file(file_artifact());
        controller.retreat();

        controller.request_camera(Facing::Environment);
        controller.wait_pending(WAIT);
        assert!(controller.is_camera_active());

        assert_eq!(controller.advance(), ActionOutcome::Moved(Step::Locate));
        assert!(!controller.is_camera_active());
    }

    #[test]
    fn test_submit_success_starts_new_session() {
        let submitter = Arc::new(ScriptedSubmitter::default());
        let mut controller = controller_at_review(Arc::clone(&submitter));
        let first_session = controller.session_id();
        controller.set_notes("raised, 4mm");

        assert_eq!(controller.submit(), ActionOutcome::Pending);
        assert!(controller.state().is_submitting());

        let outcome = controller.wait_pending(WAIT).unwrap();
        assert!(matches!(outcome, ActionOutcome::Completed(_)));
        assert_eq!(controller.state(), WorkflowState::Step(Step::Capture));
        assert!(controller.record().is_empty());
        assert_ne!(controller.session_id(), first_session);

        let seen = submitter.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].session_id, first_session);
        assert_eq!(seen[0].notes.as_deref(), Some("raised, 4mm"));
    }

    #[test]
    fn test_submit_failure_returns_to_review() {
        let submitter = Arc::new(ScriptedSubmitter::failing_once(SubmissionError::Network(
            "connection refused".into(),
        )));
        let mut controller = controller_at_review(submitter);
        let before = controller.record().clone();

        controller.submit();
        let outcome = controller.wait_pending(WAIT).unwrap();
        assert!(matches!(
            outcome,
            ActionOutcome::Failed(Advisory::SubmissionFailed { .. })
        ));
        assert_eq!(controller.state(), WorkflowState::Step(Step::Review));
        assert_eq!(controller.record(), &before);

        // Retry succeeds
        controller.submit();
        assert!(matches!(
            controller.wait_pending(WAIT),
            Some(ActionOutcome::Completed(_))
        ));
    }

    #[test]
    fn test_actions_rejected_while_submitting() {
        let submitter = Arc::new(ScriptedSubmitter::default());
        let mut controller = controller_at_review(submitter);

        controller.submit();
        assert!(controller.set_notes("late").is_rejected());
        assert!(controller.retreat().is_rejected());
        assert!(controller.submit().is_rejected());
        controller.wait_pending(WAIT);
    }

    #[test]
    fn test_cancel_while_submitting_discards_result() {
        let submitter = Arc::new(ScriptedSubmitter::default());
        let mut controller = controller_at_review(submitter);
        let completions = controller.completions();

        controller.submit();
        assert_eq!(controller.cancel(), ActionOutcome::Moved(Step::Capture));
        assert!(controller.record().is_empty());
        assert!(!controller.is_busy());

        let late = completions.recv_timeout(WAIT).unwrap();
        assert_eq!(controller.on_completion(late), None);
        assert_eq!(controller.state(), WorkflowState::Step(Step::Capture));
    }

    #[test]
    fn test_events_published() {
        let bus = EventBus::new();
        let (rx, _id) = bus.subscribe();
        let mut controller =
            controller_with(SyntheticDevices::new(), Arc::default()).with_event_bus(bus);

        controller.select_file(file_artifact());
        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events[0], WorkflowEvent::ImageSelected { .. }));
        assert!(matches!(
            events[1],
            WorkflowEvent::StepChanged {
                to: WorkflowState::Step(Step::Locate),
                ..
            }
        ));
    }

    #[test]
    fn test_drop_releases_camera() {
        let devices = SyntheticDevices::new();
        let ledger = devices.ledger().clone();
        {
            let mut controller = controller_with(devices, Arc::default());
            controller.request_camera(Facing::Environment);
            controller.wait_pending(WAIT);
            assert_eq!(ledger.live_count(), 1);
        }
        assert_eq!(ledger.live_count(), 0);
    }

    #[test]
    fn test_switch_facing_releases_before_new_stream() {
        let devices = SyntheticDevices::new();
        let ledger = devices.ledger().clone();
        let bus = EventBus::new();
        let mut controller = controller_with(devices, Arc::default()).with_event_bus(bus.clone());
        controller.request_camera(Facing::Environment);
        controller.wait_pending(WAIT);

        let (rx, _id) = bus.subscribe();
        assert_eq!(controller.switch_facing(Facing::User), ActionOutcome::Pending);
        assert_eq!(ledger.stopped_count(Facing::Environment), 1);
        assert!(!controller.is_camera_active());

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(
            events[0],
            WorkflowEvent::CameraChanged {
                status: CameraStatus::Inactive
            }
        ));
        assert!(matches!(
            events[1],
            WorkflowEvent::CameraChanged {
                status: CameraStatus::Pending {
                    facing: Facing::User
                }
            }
        ));

        assert_eq!(controller.wait_pending(WAIT), Some(ActionOutcome::Updated));
        assert_eq!(
            controller.camera_status(),
            CameraStatus::Active {
                facing: Facing::User
            }
        );
        assert_eq!(ledger.live_count(), 1);
    }

    #[test]
    fn test_switch_facing_failure_stays_inactive() {
        let devices = SyntheticDevices::new().deny(Facing::User);
        let ledger = devices.ledger().clone();
        let mut controller = controller_with(devices, Arc::default());
        controller.request_camera(Facing::Environment);
        controller.wait_pending(WAIT);

        controller.switch_facing(Facing::User);
        assert!(matches!(
            controller.wait_pending(WAIT),
            Some(ActionOutcome::Failed(Advisory::CameraUnavailable {
                facing: Facing::User,
                ..
            }))
        ));
        assert_eq!(controller.camera_status(), CameraStatus::Inactive);
        assert_eq!(ledger.live_count(), 0);
        assert_eq!(ledger.requests(), vec![Facing::Environment, Facing::User]);
    }
}
