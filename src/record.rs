/// Capture record
///
/// The draft of user input for one capture session, and the immutable snapshot
/// handed to the submission collaborator.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::artifact::ImageArtifact;
use crate::error::SubmissionError;

/// Anatomical region of the lesion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyRegion {
    Face,
    Neck,
    Chest,
    Back,
    Arms,
    Hands,
    Abdomen,
    Legs,
    Feet,
    Genitals,
    Other,
}

impl BodyRegion {
    pub const ALL: [BodyRegion; 11] = [
        BodyRegion::Face,
        BodyRegion::Neck,
        BodyRegion::Chest,
        BodyRegion::Back,
        BodyRegion::Arms,
        BodyRegion::Hands,
        BodyRegion::Abdomen,
        BodyRegion::Legs,
        BodyRegion::Feet,
        BodyRegion::Genitals,
        BodyRegion::Other,
    ];

    /// Region code as understood by the analysis backend
    pub fn code(&self) -> &'static str {
        match self {
            BodyRegion::Face => "face",
            BodyRegion::Neck => "neck",
            BodyRegion::Chest => "chest",
            BodyRegion::Back => "back",
            BodyRegion::Arms => "arms",
            BodyRegion::Hands => "hands",
            BodyRegion::Abdomen => "abdomen",
            BodyRegion::Legs => "legs",
            BodyRegion::Feet => "feet",
            BodyRegion::Genitals => "genitals",
            BodyRegion::Other => "other",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BodyRegion::Face => "Face and facial features",
            BodyRegion::Neck => "Neck area",
            BodyRegion::Chest => "Chest and upper torso",
            BodyRegion::Back => "Back area",
            BodyRegion::Arms => "Arms and shoulders",
            BodyRegion::Hands => "Hands and fingers",
            BodyRegion::Abdomen => "Abdominal area",
            BodyRegion::Legs => "Legs and thighs",
            BodyRegion::Feet => "Feet and toes",
            BodyRegion::Genitals => "Genital area",
            BodyRegion::Other => "Other or unspecified location",
        }
    }

    /// Highly visible or hard-to-monitor areas get prioritized review
    pub fn is_high_risk(&self) -> bool {
        matches!(
            self,
            BodyRegion::Face
                | BodyRegion::Neck
                | BodyRegion::Hands
                | BodyRegion::Feet
                | BodyRegion::Genitals
        )
    }

    pub fn from_code(code: &str) -> Option<BodyRegion> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|region| region.code().eq_ignore_ascii_case(code))
    }
}

impl std::fmt::Display for BodyRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// How worrying a symptom is on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Low,
    Moderate,
    High,
}

impl SeverityTier {
    pub fn code(&self) -> &'static str {
        match self {
            SeverityTier::Low => "low",
            SeverityTier::Moderate => "moderate",
            SeverityTier::High => "high",
        }
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Symptom catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomCode {
    Itching,
    Scaling,
    Redness,
    Pain,
    Crusting,
    ColorChange,
    Growing,
    Bleeding,
    IrregularBorder,
}

impl SymptomCode {
    pub const ALL: [SymptomCode; 9] = [
        SymptomCode::Itching,
        SymptomCode::Scaling,
        SymptomCode::Redness,
        SymptomCode::Pain,
        SymptomCode::Crusting,
        SymptomCode::ColorChange,
        SymptomCode::Growing,
        SymptomCode::Bleeding,
        SymptomCode::IrregularBorder,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            SymptomCode::Itching => "itching",
            SymptomCode::Scaling => "scaling",
            SymptomCode::Redness => "redness",
            SymptomCode::Pain => "pain",
            SymptomCode::Crusting => "crusting",
            SymptomCode::ColorChange => "color_change",
            SymptomCode::Growing => "growing",
            SymptomCode::Bleeding => "bleeding",
            SymptomCode::IrregularBorder => "irregular_border",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SymptomCode::Itching => "Itching",
            SymptomCode::Scaling => "Scaling or flaking",
            SymptomCode::Redness => "Redness or inflammation",
            SymptomCode::Pain => "Pain or tenderness",
            SymptomCode::Crusting => "Crusting or oozing",
            SymptomCode::ColorChange => "Change in color",
            SymptomCode::Growing => "Growing or changing size",
            SymptomCode::Bleeding => "Bleeding",
            SymptomCode::IrregularBorder => "Irregular border",
        }
    }

    pub fn severity(&self) -> SeverityTier {
        match self {
            SymptomCode::Itching | SymptomCode::Scaling | SymptomCode::Redness => {
                SeverityTier::Low
            }
            SymptomCode::Pain | SymptomCode::Crusting => SeverityTier::Moderate,
            SymptomCode::ColorChange
            | SymptomCode::Growing
            | SymptomCode::Bleeding
            | SymptomCode::IrregularBorder => SeverityTier::High,
        }
    }

    pub fn from_code(code: &str) -> Option<SymptomCode> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|symptom| symptom.code().eq_ignore_ascii_case(code))
    }
}

impl std::fmt::Display for SymptomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Draft of one capture session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureRecord {
    image: Option<ImageArtifact>,
    body_region: Option<BodyRegion>,
    custom_location_text: String,
    symptoms: BTreeSet<SymptomCode>,
    notes: String,
}

impl CaptureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&ImageArtifact> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub(crate) fn set_image(&mut self, artifact: ImageArtifact) {
        self.image = Some(artifact);
    }

    pub fn body_region(&self) -> Option<BodyRegion> {
        self.body_region
    }

    pub(crate) fn set_body_region(&mut self, region: BodyRegion) {
        self.body_region = Some(region);
    }

    /// Raw custom location text, whatever region is selected
    pub fn custom_location_text(&self) -> &str {
        &self.custom_location_text
    }

    pub(crate) fn set_custom_location_text(&mut self, text: String) {
        self.custom_location_text = text;
    }

    /// Custom location, only when the region is `Other` and text was entered
    pub fn custom_location(&self) -> Option<&str> {
        match self.body_region {
            Some(BodyRegion::Other) => non_blank(&self.custom_location_text),
            _ => None,
        }
    }

    pub fn symptoms(&self) -> &BTreeSet<SymptomCode> {
        &self.symptoms
    }

    pub fn has_symptom(&self, code: SymptomCode) -> bool {
        self.symptoms.contains(&code)
    }

    /// Flip membership of `code`; returns whether it is now selected
    pub(crate) fn toggle_symptom(&mut self, code: SymptomCode) -> bool {
        if self.symptoms.remove(&code) {
            false
        } else {
            self.symptoms.insert(code);
            true
        }
    }

    /// Most severe tier among the selected symptoms
    pub fn highest_severity(&self) -> Option<SeverityTier> {
        self.symptoms.iter().map(SymptomCode::severity).max()
    }

    pub fn notes(&self) -> Option<&str> {
        non_blank(&self.notes)
    }

    pub(crate) fn set_notes(&mut self, notes: String) {
        self.notes = notes;
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_blank(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Immutable, validated copy of a record at the moment of submission
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSnapshot {
    pub session_id: Uuid,
    pub image: ImageArtifact,
    pub body_region: BodyRegion,
    pub custom_location: Option<String>,
    pub symptoms: Vec<SymptomCode>,
    pub highest_severity: Option<SeverityTier>,
    pub notes: Option<String>,
}

impl CaptureSnapshot {
    pub fn from_record(session_id: Uuid, record: &CaptureRecord) -> Result<Self, SubmissionError> {
        let image = record
            .image()
            .cloned()
            .ok_or(SubmissionError::Incomplete("image is required"))?;
        let body_region = record
            .body_region()
            .ok_or(SubmissionError::Incomplete("body region is required"))?;

        Ok(Self {
            session_id,
            image,
            body_region,
            custom_location: record.custom_location().map(str::to_string),
            symptoms: record.symptoms().iter().copied().collect(),
            highest_severity: record.highest_severity(),
            notes: record.notes().map(str::to_string),
        })
    }

    /// Comma-separated symptom codes, `None` when nothing was selected
    pub fn symptom_codes(&self) -> Option<String> {
        if self.symptoms.is_empty() {
            return None;
        }
        let codes: Vec<&str> = self.symptoms.iter().map(SymptomCode::code).collect();
        Some(codes.join(","))
    }

    /// Free-text notes with the location and symptoms folded in.
    ///
    /// The upload endpoint only reads `image`, `body_region` and `notes`, so
    /// anything else the user entered has to travel inside `notes`.
    pub fn backend_notes(&self) -> Option<String> {
        let mut lines = Vec::new();
        if let Some(notes) = &self.notes {
            lines.push(notes.clone());
        }
        if let Some(location) = &self.custom_location {
            lines.push(format!("Location: {}", location));
        }
        if !self.symptoms.is_empty() {
            let labels: Vec<&str> = self.symptoms.iter().map(SymptomCode::label).collect();
            lines.push(format!("Symptoms: {}", labels.join(", ")));
        }
        if let Some(tier) = self.highest_severity {
            lines.push(format!("Highest symptom severity: {}", tier));
        }

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}
