use std::fmt::Display;

use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::info;

use crate::error::Error;

/// Why the service was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// `SIGINT`, e.g. Ctrl-C.
    Interrupt,

    /// `SIGTERM`, e.g. the service manager stopping us.
    Terminate,

    /// `SIGHUP`.
    Hangup,

    /// Asked to stop by the embedding code rather than by a signal.
    Requested,
}

impl Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownReason::Interrupt => write!(f, "SIGINT"),
            ShutdownReason::Terminate => write!(f, "SIGTERM"),
            ShutdownReason::Hangup => write!(f, "SIGHUP"),
            ShutdownReason::Requested => write!(f, "shutdown request"),
        }
    }
}

/// Listeners for the signals which mean "stop gracefully".
///
/// Installing these replaces the default "terminate immediately" behaviour,
/// so cleanup gets a chance to run.
#[derive(Debug)]
pub struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
    hangup: Signal,
}

impl ShutdownSignals {
    /// Start listening.
    /// Must be called from within a tokio runtime.
    pub fn install() -> Result<Self, Error> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).map_err(Error::Signal)?,
            terminate: signal(SignalKind::terminate()).map_err(Error::Signal)?,
            hangup: signal(SignalKind::hangup()).map_err(Error::Signal)?,
        })
    }

    /// Wait for the first shutdown signal.
    pub async fn recv(&mut self) -> ShutdownReason {
        let reason = tokio::select! {
            _ = self.interrupt.recv() => ShutdownReason::Interrupt,
            _ = self.terminate.recv() => ShutdownReason::Terminate,
            _ = self.hangup.recv() => ShutdownReason::Hangup,
        };

        info!(%reason, "Received signal, exiting gracefully");

        reason
    }
}
