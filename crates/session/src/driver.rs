//! Monitor driver task
//!
//! A single task owns the [`Monitor`]. Control commands and frames are
//! serialized through one `select!` loop: only the wait for the next frame
//! is ever cancelled, so a frame is never processed twice and the detector
//! is never called concurrently.

use landmark_source::ResourceProvider;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::monitor::Monitor;
use crate::snapshot::MonitorSnapshot;
use crate::SessionError;

const COMMAND_QUEUE: usize = 32;

/// Control request sent to the driver task
#[derive(Debug)]
pub enum Command {
    Start {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Retry {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    SetMuted {
        muted: bool,
        reply: oneshot::Sender<()>,
    },
    ToggleMute {
        reply: oneshot::Sender<bool>,
    },
}

/// Cloneable handle to a running monitor
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<MonitorSnapshot>,
}

impl MonitorHandle {
    /// Start monitoring; resolves once the session is active or failed
    pub async fn start(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Start { reply }).await?
    }

    pub async fn retry(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Retry { reply }).await?
    }

    pub async fn stop(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn set_muted(&self, muted: bool) -> Result<(), SessionError> {
        self.request(|reply| Command::SetMuted { muted, reply }).await
    }

    /// Flip the mute flag, returning the new value
    pub async fn toggle_mute(&self) -> Result<bool, SessionError> {
        self.request(|reply| Command::ToggleMute { reply }).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> MonitorSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshot.clone()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| SessionError::MonitorClosed)?;
        rx.await.map_err(|_| SessionError::MonitorClosed)
    }
}

/// Spawn the driver task. It runs until every handle is dropped.
pub fn spawn<P>(monitor: Monitor<P>) -> (MonitorHandle, JoinHandle<()>)
where
    P: ResourceProvider + 'static,
{
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
    let handle = MonitorHandle {
        commands: tx,
        snapshot: monitor.subscribe(),
    };
    let task = tokio::spawn(run(monitor, rx));
    (handle, task)
}

/// Driver loop
pub async fn run<P: ResourceProvider>(mut monitor: Monitor<P>, mut commands: mpsc::Receiver<Command>) {
    info!("Monitor driver started");

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(command) => dispatch(&mut monitor, command).await,
                None => break,
            },

            frame = monitor.next_frame(), if monitor.is_active() => match frame {
                Some(Ok(frame)) => {
                    monitor.process_frame(frame).await;
                }
                Some(Err(e)) => monitor.handle_source_error(e),
                None => {}
            },
        }
    }

    monitor.stop();
    info!("Monitor driver stopped");
}

async fn dispatch<P: ResourceProvider>(monitor: &mut Monitor<P>, command: Command) {
    debug!("Command: {:?}", command);
    // Replies are dropped silently when the requester went away
    match command {
        Command::Start { reply } => {
            let _ = reply.send(monitor.start().await);
        }
        Command::Retry { reply } => {
            let _ = reply.send(monitor.retry().await);
        }
        Command::Stop { reply } => {
            monitor.stop();
            let _ = reply.send(());
        }
        Command::SetMuted { muted, reply } => {
            monitor.set_muted(muted);
            let _ = reply.send(());
        }
        Command::ToggleMute { reply } => {
            let _ = reply.send(monitor.toggle_mute());
        }
    }
}
