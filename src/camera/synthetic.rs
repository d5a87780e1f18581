/// Synthetic media source
///
/// Produces test-pattern streams without camera hardware. Every stream is
/// recorded in a shared [`StreamLedger`] so callers can verify that tracks are
/// stopped exactly once.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;

use super::device::{Facing, MediaDevices, ResolutionHint, VideoStream};
use crate::error::CaptureError;

/// Largest frame the synthetic sensor delivers
const MAX_SYNTHETIC_SIZE: (u32, u32) = (640, 480);

#[derive(Debug, Default)]
struct LedgerInner {
    requests: Vec<Facing>,
    opened: Vec<Facing>,
    stopped: Vec<Facing>,
}

/// Shared record of stream requests, opens and stops
#[derive(Debug, Clone, Default)]
pub struct StreamLedger {
    inner: Arc<Mutex<LedgerInner>>,
}

impl StreamLedger {
    /// Facings requested, in order (including denied requests)
    pub fn requests(&self) -> Vec<Facing> {
        self.inner.lock().requests.clone()
    }

    pub fn opened_count(&self, facing: Facing) -> usize {
        self.inner
            .lock()
            .opened
            .iter()
            .filter(|f| **f == facing)
            .count()
    }

    pub fn stopped_count(&self, facing: Facing) -> usize {
        self.inner
            .lock()
            .stopped
            .iter()
            .filter(|f| **f == facing)
            .count()
    }

    /// Streams opened and not yet stopped
    pub fn live_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.opened.len().saturating_sub(inner.stopped.len())
    }
}

/// Media devices backed by a generated test pattern
#[derive(Debug, Clone, Default)]
pub struct SyntheticDevices {
    denied: HashSet<Facing>,
    frame_size: Option<(u32, u32)>,
    latency: Duration,
    ledger: StreamLedger,
}

impl SyntheticDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse streams for `facing`, as a denied permission prompt would
    pub fn deny(mut self, facing: Facing) -> Self {
        self.denied.insert(facing);
        self
    }

    /// Refuse every stream (no camera present)
    pub fn unavailable(self) -> Self {
        self.deny(Facing::Environment).deny(Facing::User)
    }

    /// Force the delivered frame size, ignoring the resolution hint
    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = Some((width, height));
        self
    }

    /// Delay every request, like a permission prompt waiting for the user
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn ledger(&self) -> &StreamLedger {
        &self.ledger
    }
}

impl MediaDevices for SyntheticDevices {
    fn request_video_stream(
        &self,
        facing: Facing,
        hint: ResolutionHint,
    ) -> Result<Box<dyn VideoStream>, CaptureError> {
        self.ledger.inner.lock().requests.push(facing);

        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }

        if self.denied.contains(&facing) {
            return Err(CaptureError::device_unavailable(facing, "permission denied"));
        }

        let (width, height) = self.frame_size.unwrap_or((
            hint.width.min(MAX_SYNTHETIC_SIZE.0),
            hint.height.min(MAX_SYNTHETIC_SIZE.1),
        ));

        self.ledger.inner.lock().opened.push(facing);
        Ok(Box::new(SyntheticStream {
            facing,
            width,
            height,
            live: true,
            ledger: self.ledger.clone(),
        }))
    }
}

struct SyntheticStream {
    facing: Facing,
    width: u32,
    height: u32,
    live: bool,
    ledger: StreamLedger,
}

impl VideoStream for SyntheticStream {
    fn facing(&self) -> Facing {
        self.facing
    }

    fn current_frame(&self) -> Option<RgbaImage> {
        if !self.live {
            return None;
        }

        // Diagonal gradient, tinted per facing so captures are distinguishable
        let tint = match self.facing {
            Facing::Environment => 40u8,
            Facing::User => 160u8,
        };
        let w = self.width.max(1);
        let h = self.height.max(1);
        Some(RgbaImage::from_fn(self.width, self.height, |x, y| {
            let r = (x * 255 / w) as u8;
            let g = (y * 255 / h) as u8;
            Rgba([r, g, tint, 255])
        }))
    }

    fn track_count(&self) -> usize {
        if self.live {
            1
        } else {
            0
        }
    }

    fn stop(&mut self) {
        // Every call is recorded so double stops show up in the ledger
        self.ledger.inner.lock().stopped.push(self.facing);
        self.live = false;
    }
}
