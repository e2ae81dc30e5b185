// Step loop
//
// Runs a debugger session on its own task. Session commands and
// instrumentation events share one queue and are applied in the order they
// were sent; suspensions go out on a separate channel.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::StepConfig;
use crate::element::SourceElementKind;
use crate::error::{SessionError, SessionResult};
use crate::session::{DebuggerSession, StepDecision};
use crate::tag::InstrumentationEvent;

/// Notice that a step completed at `event`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspended {
    pub event: InstrumentationEvent,
    /// Count the completed step was prepared with
    pub count: u32,
}

/// Work item for the step loop
enum Command {
    PrepareStep {
        config: StepConfig,
        reply_tx: oneshot::Sender<SessionResult<()>>,
    },
    CancelStep {
        reply_tx: oneshot::Sender<SessionResult<StepConfig>>,
    },
    SetSourceElements {
        elements: Vec<SourceElementKind>,
        reply_tx: oneshot::Sender<SessionResult<()>>,
    },
    Event(InstrumentationEvent),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::PrepareStep { config, .. } => {
                f.debug_tuple("PrepareStep").field(config).finish()
            }
            Command::CancelStep { .. } => f.write_str("CancelStep"),
            Command::SetSourceElements { elements, .. } => {
                f.debug_tuple("SetSourceElements").field(elements).finish()
            }
            Command::Event(event) => f.debug_tuple("Event").field(event).finish(),
        }
    }
}

/// Handle to the step loop for controlling the session and reporting events
#[derive(Clone, Debug)]
pub struct StepLoopHandle {
    command_tx: mpsc::Sender<Command>,
    suspended_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Suspended>>>,
}

impl StepLoopHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<SessionResult<T>>) -> Command,
    ) -> SessionResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::LoopClosed)?;

        reply_rx.await.map_err(|_| SessionError::LoopClosed)?
    }

    /// Start stepping with `config`, replacing any step in progress.
    ///
    /// Events reported earlier are evaluated before the step is installed.
    pub async fn prepare_step(&self, config: StepConfig) -> SessionResult<()> {
        self.request(|reply_tx| Command::PrepareStep { config, reply_tx })
            .await
    }

    /// Abandon the active step once earlier events have been evaluated
    pub async fn cancel_step(&self) -> SessionResult<StepConfig> {
        self.request(|reply_tx| Command::CancelStep { reply_tx }).await
    }

    pub async fn set_source_elements(&self, elements: Vec<SourceElementKind>) -> SessionResult<()> {
        self.request(|reply_tx| Command::SetSourceElements { elements, reply_tx })
            .await
    }

    /// Report an instrumentation event. Events and commands are applied in
    /// the order they were sent.
    pub async fn report(&self, event: InstrumentationEvent) -> SessionResult<()> {
        self.command_tx
            .send(Command::Event(event))
            .await
            .map_err(|_| SessionError::LoopClosed)
    }

    /// Try to receive a suspension (non-blocking)
    pub async fn try_recv_suspended(&self) -> Option<Suspended> {
        let mut rx = self.suspended_rx.lock().await;
        rx.try_recv().ok()
    }

    /// Wait for the next suspension
    pub async fn recv_suspended(&self) -> Option<Suspended> {
        let mut rx = self.suspended_rx.lock().await;
        rx.recv().await
    }
}

/// Start the step loop task for `session`
pub fn spawn_step_loop(session: DebuggerSession) -> StepLoopHandle {
    // Events dominate the queue, size it for bursts of instrumentation
    let (command_tx, command_rx) = mpsc::channel(256);
    let (suspended_tx, suspended_rx) = mpsc::channel(64);

    tokio::spawn(step_loop_task(session, command_rx, suspended_tx));

    StepLoopHandle {
        command_tx,
        suspended_rx: Arc::new(tokio::sync::Mutex::new(suspended_rx)),
    }
}

async fn step_loop_task(
    mut session: DebuggerSession,
    mut command_rx: mpsc::Receiver<Command>,
    suspended_tx: mpsc::Sender<Suspended>,
) {
    info!("Step loop started");

    while let Some(command) = command_rx.recv().await {
        handle_command(&mut session, command, &suspended_tx);
    }

    info!("Step loop shutting down");
}

fn handle_event(
    session: &mut DebuggerSession,
    event: InstrumentationEvent,
    suspended_tx: &mpsc::Sender<Suspended>,
) {
    let count = session.active_step().map(StepConfig::count);
    match session.on_event(&event, event.anchor) {
        StepDecision::Suspend => {
            let notice = Suspended {
                event,
                count: count.unwrap_or(1),
            };
            match suspended_tx.try_send(notice) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(notice)) => {
                    error!(
                        location = ?notice.event.location,
                        "Suspension channel full! Dropping suspension notice."
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!("Suspension receiver dropped, future suspensions will be discarded");
                }
            }
        }
        StepDecision::Consumed { remaining } => {
            debug!(remaining, "Event consumed by step");
        }
        StepDecision::Ignored => {}
    }
}

fn handle_command(
    session: &mut DebuggerSession,
    command: Command,
    suspended_tx: &mpsc::Sender<Suspended>,
) {
    if !matches!(command, Command::Event(_)) {
        debug!(?command, "Handling command");
    }
    match command {
        Command::Event(event) => handle_event(session, event, suspended_tx),
        Command::PrepareStep { config, reply_tx } => {
            session.prepare_step(config);
            reply_tx.send(Ok(())).ok();
        }
        Command::CancelStep { reply_tx } => {
            reply_tx.send(session.cancel_step()).ok();
        }
        Command::SetSourceElements { elements, reply_tx } => {
            reply_tx.send(session.set_source_elements(&elements)).ok();
        }
    }
}
