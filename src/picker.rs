/// File-selection fallback
///
/// Used when the camera is unavailable or the user prefers an existing photo.

use std::path::PathBuf;

use crate::artifact::ImageArtifact;
use crate::error::PickError;

/// Capability to let the user choose an image file
pub trait FilePicker {
    /// `Err(PickError::Cancelled)` when the user dismisses the picker
    fn pick_image_file(&self) -> Result<ImageArtifact, PickError>;
}

/// Native file dialog
#[cfg(feature = "native-dialog")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogFilePicker;

#[cfg(feature = "native-dialog")]
impl DialogFilePicker {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "native-dialog")]
impl FilePicker for DialogFilePicker {
    fn pick_image_file(&self) -> Result<ImageArtifact, PickError> {
        let path = rfd::FileDialog::new()
            .set_title("Select lesion photo")
            .add_filter("Images", &["jpg", "jpeg", "png"])
            .pick_file().ok_or(PickError::Cancelled)?;
        tracing::info!("Image file selected: {}", path.display());
        ImageArtifact::from_path(&path)
    }
}

/// Picker that returns a fixed path (command line `--file`)
#[derive(Debug, Clone)]
pub struct PathFilePicker {
    path: PathBuf,
}

impl PathFilePicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FilePicker for PathFilePicker {
    fn pick_image_file(&self) -> Result<ImageArtifact, PickError> {
        ImageArtifact::from_path(&self.path)
    }
}
