/// Camera module
///
/// Live camera access for the capture step.
///
/// ## Architecture
///
/// ```text
/// MediaDevices (platform capability)
///   └── request_video_stream(facing, hint) -> VideoStream
///
/// CameraResource (owns at most one VideoStream, releases on drop)
///   ├── begin_acquire / switch_facing -> AcquireRequest::open (worker) -> bind
///   └── FrameGrabber (current frame -> JPEG ImageArtifact)
/// ```

pub mod device;
pub mod grabber;
pub mod resource;
pub mod synthetic;

// Re-export commonly used types
pub use device::{Facing, MediaDevices, ResolutionHint, VideoStream};
pub use grabber::{FrameGrabber, DEFAULT_JPEG_QUALITY};
pub use resource::{AcquireRequest, CameraResource};
pub use synthetic::{StreamLedger, SyntheticDevices};
