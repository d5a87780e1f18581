/// Image artifacts
///
/// A binary image payload produced by frame capture or file selection.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::{ImageFormat, ImageReader};

use crate::camera::Facing;
use crate::error::PickError;

/// Where an artifact came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Grabbed from a live camera stream
    CameraFrame { facing: Facing },

    /// Selected from disk
    File { path: PathBuf },
}

/// Encoded image bytes plus the metadata needed to upload them.
///
/// Bytes are shared, so cloning an artifact into a submission snapshot is cheap
/// and the snapshot cannot observe later record edits.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    bytes: Arc<Vec<u8>>,
    format: ImageFormat,
    width: u32,
    height: u32,
    captured_at: DateTime<Utc>,
    source: ArtifactSource,
}

impl ImageArtifact {
    pub fn new(
        bytes: Vec<u8>,
        format: ImageFormat,
        width: u32,
        height: u32,
        source: ArtifactSource,
    ) -> Self {
        Self {
            bytes: Arc::new(bytes),
            format,
            width,
            height,
            captured_at: Utc::now(),
            source,
        }
    }

    /// Load an image file from disk, sniffing the real format from its contents
    pub fn from_path(path: &Path) -> Result<Self, PickError> {
        let bytes = std::fs::read(path).map_err(|source| PickError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(bytes, ArtifactSource::File {
            path: path.to_path_buf(),
        })
        .ok_or_else(|| PickError::NotAnImage {
            path: path.display().to_string(),
        })
    }

    /// Wrap already-encoded bytes; `None` if they are not a supported image
    pub fn from_bytes(bytes: Vec<u8>, source: ArtifactSource) -> Option<Self> {
        let format = image::guess_format(&bytes).ok()?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return None;
        }

        let (width, height) = ImageReader::with_format(Cursor::new(&bytes), format)
            .into_dimensions()
            .ok()?;
        if width == 0 || height == 0 {
            return None;
        }

        Some(Self::new(bytes, format, width, height, source))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type for upload
    pub fn media_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// File name used for upload
    pub fn file_name(&self) -> String {
        let ext = self.format.extensions_str().first().copied().unwrap_or("bin");
        format!("lesion_{}.{}", self.captured_at.format("%Y%m%dT%H%M%S"), ext)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn source(&self) -> &ArtifactSource {
        &self.source
    }
}

// Bytes are elided so artifacts can be logged with {:?}
impl fmt::Debug for ImageArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageArtifact")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("captured_at", &self.captured_at)
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 90]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}
