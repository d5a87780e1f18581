mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use crossbeam_channel::Receiver;
use sysinfo::System;

use lesion_capture::camera::SyntheticDevices;
use lesion_capture::error::AppResult;
use lesion_capture::messaging::{EventBus, SessionExecutor, WorkflowCommand, WorkflowEvent};
use lesion_capture::picker::{FilePicker, PathFilePicker};
use lesion_capture::submission::{DelayedSubmitter, HttpSubmitter};
use lesion_capture::workflow::{ActionOutcome, CameraStatus, ControllerOptions, WorkflowController};
use lesion_capture::{AnalysisAccepted, Config, ImageArtifact, Step};

use cli::Cli;

const LOG_TARGET_STARTUP: &str = "lesion_capture::startup";

/// How long to wait for the camera or the backend before giving up
const BACKGROUND_TIMEOUT: Duration = Duration::from_secs(120);

fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = Config::log_dir();

    // Create log directory if it doesn't exist
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    // Create file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "lesion-capture.log");

    // Configure filter (info level by default)
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    // In debug builds, also log to stderr (stdout carries the result)
    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

fn log_runtime_environment() {
    let version = env!("CARGO_PKG_VERSION");
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());
    let kernel = System::kernel_version().unwrap_or_else(|| "Unknown Kernel".to_string());
    let architecture = std::env::consts::ARCH;

    tracing::info!(target: LOG_TARGET_STARTUP, "Starting Lesion Capture v{} on ({})", version, architecture);
    tracing::info!(target: LOG_TARGET_STARTUP, "Operating System: {} (kernel {})", os_name, kernel);
}

fn load_config(cli: &Cli) -> AppResult<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    if let Some(url) = &cli.api_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
        config.validate().context("Invalid --api-url")?;
    }
    Ok(config)
}

#[cfg(feature = "native-dialog")]
fn pick_with_dialog() -> AppResult<ImageArtifact> {
    use lesion_capture::picker::DialogFilePicker;

    Ok(DialogFilePicker::new().pick_image_file()?)
}

#[cfg(not(feature = "native-dialog"))]
fn pick_with_dialog() -> AppResult<ImageArtifact> {
    bail!("--pick needs a build with the `native-dialog` feature; use --file instead")
}

/// Send `command` and return its immediate outcome, failing on refusals
fn expect_applied(executor: &SessionExecutor, command: WorkflowCommand) -> AppResult<ActionOutcome> {
    let description = command.description();
    let outcome = executor
        .request(command)
        .recv()
        .map_err(|_| anyhow!("Session stopped while running '{}'", description))?;

    match outcome {
        ActionOutcome::Rejected(err) => bail!("'{}' was refused: {}", description, err),
        ActionOutcome::Blocked(block) => bail!("'{}' was blocked: {}", description, block),
        ActionOutcome::Failed(advisory) => bail!("{}", advisory.message()),
        outcome => Ok(outcome),
    }
}

/// Wait for the camera request to settle
fn wait_for_camera(events: &Receiver<WorkflowEvent>) -> AppResult<()> {
    loop {
        let event = events
            .recv_timeout(BACKGROUND_TIMEOUT)
            .context("Timed out waiting for the camera")?;
        match event {
            WorkflowEvent::CameraChanged {
                status: CameraStatus::Active { facing },
            } => {
                println!("Camera ready ({})", facing);
                return Ok(());
            }
            WorkflowEvent::AdvisoryRaised { advisory } => bail!("{}", advisory.message()),
            _ => {}
        }
    }
}

/// Wait for the backend to accept or refuse the capture
fn wait_for_submission(events: &Receiver<WorkflowEvent>) -> AppResult<AnalysisAccepted> {
    loop {
        let event = events
            .recv_timeout(BACKGROUND_TIMEOUT)
            .context("Timed out waiting for the analysis service")?;
        match event {
            WorkflowEvent::SubmissionCompleted { accepted, .. } => return Ok(accepted),
            WorkflowEvent::AdvisoryRaised { advisory } => bail!("{}", advisory.message()),
            _ => {}
        }
    }
}

fn run_session(
    cli: &Cli,
    config: &Config,
    executor: &SessionExecutor,
    events: &Receiver<WorkflowEvent>,
) -> AppResult<AnalysisAccepted> {
    println!("Step {}/{}: {}", Step::Capture.number(), Step::total_steps(), Step::Capture.title());
    if cli.synthetic_camera {
        let facing = cli.facing.unwrap_or(config.preferred_facing);
        expect_applied(executor, WorkflowCommand::RequestCamera { facing })?;
        wait_for_camera(events)?;
        expect_applied(executor, WorkflowCommand::CapturePhoto)?;
    } else {
        let artifact = match &cli.file {
            Some(path) => PathFilePicker::new(path)
                .pick_image_file()
                .with_context(|| format!("Cannot use {}", path.display()))?,
            None => pick_with_dialog()?,
        };
        expect_applied(executor, WorkflowCommand::SelectFile { artifact })?;
    }

    println!("Step {}/{}: {}", Step::Locate.number(), Step::total_steps(), Step::Locate.title());
    expect_applied(executor, WorkflowCommand::SetBodyRegion { region: cli.region })?;
    if let Some(text) = &cli.custom_location {
        expect_applied(executor, WorkflowCommand::SetCustomLocation { text: text.clone() })?;
    }
    expect_applied(executor, WorkflowCommand::Advance)?;

    println!("Step {}/{}: {}", Step::Symptoms.number(), Step::total_steps(), Step::Symptoms.title());
    for code in &cli.symptoms {
        expect_applied(executor, WorkflowCommand::ToggleSymptom { code: *code })?;
    }
    if let Some(text) = &cli.notes {
        expect_applied(executor, WorkflowCommand::SetNotes { text: text.clone() })?;
    }
    expect_applied(executor, WorkflowCommand::Advance)?;

    println!("Step {}/{}: {}", Step::Review.number(), Step::total_steps(), Step::Review.title());
    expect_applied(executor, WorkflowCommand::Submit)?;
    wait_for_submission(events)
}

fn main() -> AppResult<()> {
    initialize_tracing();
    log_runtime_environment();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let submitter = DelayedSubmitter::new(
        HttpSubmitter::from_config(&config).context("Failed to set up the upload client")?,
        config.processing_delay(),
    );
    let devices = SyntheticDevices::new();

    let event_bus = EventBus::new();
    let (events, _subscription) = event_bus.subscribe();
    let controller = WorkflowController::new(
        Arc::new(devices),
        Arc::new(submitter),
        ControllerOptions::from(&config),
    )
    .with_event_bus(event_bus.clone());

    let executor = SessionExecutor::new(event_bus);
    let handle = executor.start_processing(controller);

    let result = run_session(&cli, &config, &executor, &events);

    executor.shutdown();
    if handle.join().is_err() {
        tracing::error!("Session executor panicked");
    }

    let accepted = result?;
    println!("{}", accepted.message);
    if accepted.needs_doctor_review {
        println!("A doctor will review this capture.");
    } else if accepted.needs_cadre_review {
        println!("A health worker will review this capture.");
    }
    Ok(())
}
