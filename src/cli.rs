use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use lesion_capture::{BodyRegion, Facing, SymptomCode};

#[derive(Parser, Debug)]
#[command(
    name = "lesion-capture",
    version,
    about = "Capture a skin lesion photo and submit it for analysis"
)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["file", "pick", "synthetic_camera"])
))]
pub struct Cli {
    #[arg(long, help = "Use an existing JPEG/PNG image")]
    pub file: Option<PathBuf>,

    #[arg(long, help = "Choose the image with a native file dialog")]
    pub pick: bool,

    #[arg(long, help = "Capture from the built-in test-pattern camera")]
    pub synthetic_camera: bool,

    #[arg(long, value_parser = parse_facing, help = "Camera to use (environment or user)")]
    pub facing: Option<Facing>,

    #[arg(long, value_parser = parse_region, help = "Body region of the lesion")]
    pub region: BodyRegion,

    #[arg(long, help = "Where exactly, when the region is 'other'")]
    pub custom_location: Option<String>,

    #[arg(long = "symptom", value_parser = parse_symptom, help = "Symptom code (repeatable)")]
    pub symptoms: Vec<SymptomCode>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long, help = "Config file to use instead of the platform default")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Override the configured API base URL")]
    pub api_url: Option<String>,
}

fn parse_facing(value: &str) -> Result<Facing, String> {
    Facing::from_code(value).ok_or_else(|| format!("unknown camera '{}'", value))
}

fn parse_region(value: &str) -> Result<BodyRegion, String> {
    BodyRegion::from_code(value).ok_or_else(|| {
        let codes: Vec<&str> = BodyRegion::ALL.iter().map(BodyRegion::code).collect();
        format!("unknown body region '{}' (expected one of {})", value, codes.join(", "))
    })
}

fn parse_symptom(value: &str) -> Result<SymptomCode, String> {
    SymptomCode::from_code(value).ok_or_else(|| {
        let codes: Vec<&str> = SymptomCode::ALL.iter().map(SymptomCode::code).collect();
        format!("unknown symptom '{}' (expected one of {})", value, codes.join(", "))
    })
}
