use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use super::resource::CameraResource;
use crate::artifact::{ArtifactSource, ImageArtifact};
use crate::error::CaptureError;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Converts the live frame of a camera into a still JPEG artifact
///
/// Grabbing never changes the camera; the caller decides when to release it.
#[derive(Debug, Clone, Copy)]
pub struct FrameGrabber {
    quality: u8,
}

impl FrameGrabber {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode the current frame of `camera`
    pub fn grab(&self, camera: &CameraResource) -> Result<ImageArtifact, CaptureError> {
        if !camera.is_active() {
            return Err(CaptureError::NoActiveFrame);
        }

        let frame = camera.current_frame().ok_or(CaptureError::NoActiveFrame)?;
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(CaptureError::NoActiveFrame);
        }

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgba8(frame).to_rgb8();

        let mut buf = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut buf, self.quality)
            .encode_image(&rgb)
            .map_err(CaptureError::EncodeFailed)?;

        let bytes = buf.into_inner();
        tracing::debug!(
            target: "lesion_capture::camera",
            "Grabbed {}x{} frame ({} bytes, q={})",
            width,
            height,
            bytes.len(),
            self.quality
        );

        Ok(ImageArtifact::new(
            bytes,
            ImageFormat::Jpeg,
            width,
            height,
            ArtifactSource::CameraFrame {
                facing: camera.facing(),
            },
        ))
    }
}

impl Default for FrameGrabber {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}
