use image::RgbaImage;

use super::device::{Facing, MediaDevices, ResolutionHint, VideoStream};
use crate::error::CaptureError;

const LOG_TARGET: &str = "lesion_capture::camera";

/// Scoped owner of at most one live camera stream
///
/// # Lifecycle
/// - `begin_acquire` releases any previous stream and returns the request to
///   open; `bind` attaches the stream it produced
/// - `release` stops every track exactly once and clears the handle
/// - dropping the resource releases it, so teardown never leaks a stream
///
/// Opening runs away from the resource (a worker thread in the controller),
/// so a slow permission prompt never blocks the workflow.
///
/// # Notes
/// - Acquisition failure leaves the resource inactive; the caller is expected
///   to offer file selection instead
/// - `switch_facing` never falls back to the previous facing on failure
pub struct CameraResource {
    stream: Option<Box<dyn VideoStream>>,
    facing: Facing,
    hint: ResolutionHint,
}

/// A camera request detached from its resource, ready to be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireRequest {
    facing: Facing,
    hint: ResolutionHint,
    replaced_stream: bool,
}

impl AcquireRequest {
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Whether a live stream was stopped to make room for this request
    pub fn replaced_stream(&self) -> bool {
        self.replaced_stream
    }

    /// Ask `devices` for the stream; the result goes back through `CameraResource::bind`
    pub fn open(&self, devices: &dyn MediaDevices) -> Result<Box<dyn VideoStream>, CaptureError> {
        devices
            .request_video_stream(self.facing, self.hint)
            .map_err(|err| {
                tracing::warn!(target: LOG_TARGET, "Camera acquisition failed ({}): {}", self.facing, err);
                err
            })
    }
}

impl CameraResource {
    pub fn new(hint: ResolutionHint) -> Self {
        Self {
            stream: None,
            facing: Facing::default(),
            hint,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Facing of the live stream, or of the last request when inactive
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Release the current stream and prepare a request for `facing`
    pub fn begin_acquire(&mut self, facing: Facing) -> AcquireRequest {
        let replaced_stream = self.release();
        self.facing = facing;
        AcquireRequest {
            facing,
            hint: self.hint,
            replaced_stream,
        }
    }

    /// Bind a stream opened from an `AcquireRequest`
    pub fn bind(&mut self, stream: Box<dyn VideoStream>) {
        self.release();
        self.facing = stream.facing();
        tracing::info!(
            target: LOG_TARGET,
            "Camera stream active ({}, {} track(s))",
            self.facing,
            stream.track_count()
        );
        self.stream = Some(stream);
    }

    /// Stop all tracks; returns whether a stream was actually stopped
    pub fn release(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => {
                stream.stop();
                tracing::info!(target: LOG_TARGET, "Camera stream released ({})", self.facing);
                true
            }
            None => false,
        }
    }

    /// Release the current stream, then request one with `facing`
    ///
    /// If opening the new request fails the resource stays inactive.
    pub fn switch_facing(&mut self, facing: Facing) -> AcquireRequest {
        tracing::debug!(target: LOG_TARGET, "Switching camera {} -> {}", self.facing, facing);
        self.begin_acquire(facing)
    }

    /// Frame currently in the sink
    pub(crate) fn current_frame(&self) -> Option<RgbaImage> {
        self.stream.as_ref().and_then(|stream| stream.current_frame())
    }

    /// Open and bind in one go, for tests that need a live camera
    #[cfg(test)]
    pub(crate) fn acquire_now(
        &mut self,
        devices: &dyn MediaDevices,
        facing: Facing,
    ) -> Result<(), CaptureError> {
        let request = self.begin_acquire(facing);
        let stream = request.open(devices)?;
        self.bind(stream);
        Ok(())
    }
}

impl Default for CameraResource {
    fn default() -> Self {
        Self::new(ResolutionHint::default())
    }
}

impl Drop for CameraResource {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CameraResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraResource")
            .field("facing", &self.facing)
            .field("is_active", &self.is_active())
            .field("hint", &self.hint)
            .finish()
    }
}
