/// Messaging module for Event/Command architecture
///
/// This module implements the Event/Command segregation pattern:
/// - **Events**: Notifications of things that happened (past tense, broadcast)
/// - **Commands**: Requests to perform actions (imperative, targeted)
///
/// ## Architecture
///
/// ```text
/// ┌─────────┐     Command      ┌─────────────────┐     Event      ┌─────────────┐
/// │  Host   │ ───────────────> │ SessionExecutor │ ─────────────> │  Event Bus  │
/// │ (CLI)   │                  │ (controller)    │                │             │
/// └─────────┘                  └─────────────────┘                └─────────────┘
///                                      ▲                                 │
///                                      │ completions                     │ Publishes
///                               ┌──────────────┐                         ▼
///                               │ worker thread│                   ┌──────────┐
///                               │ camera/submit│                   │ Handlers │
///                               └──────────────┘                   └──────────┘
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let event_bus = EventBus::new();
/// let (rx, _id) = event_bus.subscribe();
///
/// let controller = WorkflowController::new(devices, submitter, options)
///     .with_event_bus(event_bus.clone());
/// let executor = SessionExecutor::new(event_bus.clone());
/// let handle = executor.start_processing(controller);
///
/// executor.execute(WorkflowCommand::RequestCamera { facing: Facing::Environment });
///
/// while let Ok(event) = rx.recv() {
///     match event {
///         WorkflowEvent::CameraChanged { .. } => { /* render preview */ },
///         _ => {}
///     }
/// }
/// ```

pub mod bus;
pub mod commands;
pub mod events;
pub mod executor;

// Re-export commonly used types
pub use bus::{EventBus, SubscriberId};
pub use commands::{ActionKind, WorkflowCommand};
pub use events::WorkflowEvent;
pub use executor::SessionExecutor;
