//! Guided capture of a skin-lesion photo with clinical metadata.
//!
//! A session moves through four steps (capture, locate, symptoms, review)
//! and ends with an asynchronous submission to the analysis backend.
//! [`workflow::WorkflowController`] owns the state machine, the camera and
//! the collected [`record::CaptureRecord`]; hosts drive it directly or
//! through [`messaging::SessionExecutor`].

pub mod artifact;
pub mod camera;
pub mod config;
pub mod error;
pub mod gate;
pub mod messaging;
pub mod picker;
pub mod record;
pub mod steps;
pub mod submission;
pub mod workflow;

// Re-export commonly used types
pub use artifact::{ArtifactSource, ImageArtifact};
pub use camera::{Facing, MediaDevices, ResolutionHint, SyntheticDevices};
pub use config::Config;
pub use error::{CaptureError, ConfigError, InvalidTransition, PickError, SubmissionError};
pub use record::{BodyRegion, CaptureRecord, CaptureSnapshot, SeverityTier, SymptomCode};
pub use steps::Step;
pub use submission::{AnalysisAccepted, CaptureSubmitter};
pub use workflow::{ActionOutcome, Advisory, WorkflowController, WorkflowState};
