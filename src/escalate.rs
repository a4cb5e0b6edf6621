//! Soft-then-hard termination of a child that has to go.

use crate::error::Result;
use crate::process::{ExitStatus, Process};
use nix::sys::signal::Signal;
use std::thread;
use std::time::Duration;

/// The two signals to try and how long the first one gets to work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Escalation {
    pub soft: Signal,
    pub hard: Signal,
    pub grace: Duration,
}

impl Default for Escalation {
    fn default() -> Self {
        Self {
            soft: Signal::SIGTERM,
            hard: Signal::SIGKILL,
            grace: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The child was gone by the end of the grace period.
    Graceful(ExitStatus),
    /// The child outlived the grace period and was sent the hard signal.
    Forced(ExitStatus),
}

impl Termination {
    #[cfg(test)]
    const fn status(self) -> ExitStatus {
        match self {
            Termination::Graceful(status) | Termination::Forced(status) => status,
        }
    }
}

/// Stops `process` and reaps it.
///
/// Sends the soft signal, sleeps through the grace period, then polls once.
/// If the child is still running it gets the hard signal and a blocking wait,
/// so this only returns once the child is confirmed dead.
pub fn terminate(process: &mut Process, escalation: &Escalation) -> Result<Termination> {
    process.signal(escalation.soft)?;
    thread::sleep(escalation.grace);

    if let Some(status) = process.try_wait()? {
        debug!("Child process {} stopped after {}", process.pid(), escalation.soft);
        return Ok(Termination::Graceful(status));
    }

    debug!(
        "Child process {} ignored {} for {:?}, sending {}",
        process.pid(),
        escalation.soft,
        escalation.grace,
        escalation.hard
    );
    process.signal(escalation.hard)?;
    process.wait().map(Termination::Forced)
}
