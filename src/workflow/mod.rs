/// Capture workflow
///
/// ## Architecture
///
/// ```text
/// Capture ──> Locate ──> Symptoms ──> Review ──submit──> Submitting
///    ▲           │           │           │                   │
///    └─retreat───┴───────────┴───────────┘       failure ────┘ (back to Review)
///                                                 success ───> new session (Capture)
/// ```
///
/// - `transition`: pure legality checks and navigation
/// - `controller`: owns the record, the camera and background tasks
/// - `state`: workflow, camera and advisory types

pub mod controller;
pub mod state;
pub mod transition;

// Re-export commonly used types
pub use controller::{ActionOutcome, ControllerOptions, TaskCompletion, WorkflowController};
pub use state::{Advisory, CameraStatus, WorkflowState};
pub use transition::{Direction, Navigation, NavigationBlock};
