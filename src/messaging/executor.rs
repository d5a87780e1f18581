/// Session executor
///
/// Owns a workflow controller on its own thread and applies commands and
/// background completions one at a time.
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};

use super::bus::EventBus;
use super::commands::WorkflowCommand;
use super::events::WorkflowEvent;
use crate::workflow::{ActionOutcome, WorkflowController};

const LOG_TARGET: &str = "lesion_capture::workflow";

struct Envelope {
    command: WorkflowCommand,
    reply: Option<Sender<ActionOutcome>>,
}

/// Command executor that drives one controller and emits events
pub struct SessionExecutor {
    command_tx: Sender<Envelope>,
    command_rx: Receiver<Envelope>,
    event_bus: EventBus,
}

impl SessionExecutor {
    /// `event_bus` should be the bus the controller publishes on
    pub fn new(event_bus: EventBus) -> Self {
        let (tx, rx) = unbounded();

        Self {
            command_tx: tx,
            command_rx: rx,
            event_bus,
        }
    }

    /// Queue a command without waiting for its outcome
    pub fn execute(&self, command: WorkflowCommand) {
        let _ = self.command_tx.send(Envelope {
            command,
            reply: None,
        });
    }

    /// Queue a command; its immediate outcome arrives on the returned receiver
    ///
    /// Background results (camera, submission) are reported as events.
    pub fn request(&self, command: WorkflowCommand) -> Receiver<ActionOutcome> {
        let (tx, rx) = bounded(1);
        let _ = self.command_tx.send(Envelope {
            command,
            reply: Some(tx),
        });
        rx
    }

    pub fn shutdown(&self) {
        self.execute(WorkflowCommand::Shutdown);
    }

    /// Start the processing loop in a background thread
    ///
    /// The loop ends on `Shutdown` or when the executor is dropped; the
    /// controller is torn down either way.
    pub fn start_processing(&self, mut controller: WorkflowController) -> JoinHandle<()> {
        let commands = self.command_rx.clone();
        let completions = controller.completions();
        let event_bus = self.event_bus.clone();

        thread::spawn(move || {
            tracing::info!(target: LOG_TARGET, "Session executor started");

            loop {
                select! {
                    recv(commands) -> envelope => {
                        let Ok(Envelope { command, reply }) = envelope else {
                            break;
                        };
                        let shutdown = matches!(command, WorkflowCommand::Shutdown);
                        tracing::debug!(target: LOG_TARGET, "Executing command: {}", command.description());

                        let outcome = controller.dispatch(command);
                        if let Some(reply) = reply {
                            let _ = reply.send(outcome);
                        }
                        if shutdown {
                            tracing::info!(target: LOG_TARGET, "Shutdown command received, stopping executor");
                            break;
                        }
                    }
                    recv(completions) -> completion => {
                        if let Ok(completion) = completion {
                            controller.on_completion(completion);
                        }
                    }
                }
            }

            controller.teardown();
            event_bus.publish(WorkflowEvent::Shutdown);
            tracing::info!(target: LOG_TARGET, "Session executor stopped");
        })
    }
}
