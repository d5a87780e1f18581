/// Media device capability
///
/// Abstracts the platform camera so the workflow can be driven by a browser
/// bridge, a native backend or the synthetic source used in tests.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::CaptureError;

/// Which physical camera supplies the stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Outward (rear) camera
    #[default]
    Environment,

    /// Inward (selfie) camera
    User,
}

impl Facing {
    pub fn code(&self) -> &'static str {
        match self {
            Facing::Environment => "environment",
            Facing::User => "user",
        }
    }

    pub fn from_code(code: &str) -> Option<Facing> {
        match code.trim().to_ascii_lowercase().as_str() {
            "environment" | "back" | "rear" => Some(Facing::Environment),
            "user" | "front" | "selfie" => Some(Facing::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Preferred stream resolution; devices may deliver something else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionHint {
    pub width: u32,
    pub height: u32,
}

impl ResolutionHint {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ResolutionHint {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// A live video stream bound to a sink
pub trait VideoStream: Send {
    fn facing(&self) -> Facing;

    /// The frame currently shown in the sink, if any
    fn current_frame(&self) -> Option<RgbaImage>;

    /// Number of underlying media tracks
    fn track_count(&self) -> usize;

    /// Stop every track. The stream is unusable afterwards.
    fn stop(&mut self);
}

/// Source of camera streams (`getUserMedia` on the web, a native API elsewhere)
pub trait MediaDevices: Send + Sync {
    /// Ask for a stream; fails with `DeviceUnavailable` when denied or absent
    fn request_video_stream(
        &self,
        facing: Facing,
        hint: ResolutionHint,
    ) -> Result<Box<dyn VideoStream>, CaptureError>;
}
