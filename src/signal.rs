#![allow(unsafe_code)]
//! Interception of the interruption signals and forwarding to the child.
//!
//! A signal handler cannot reach data on the supervisor's stack, so the state
//! it shares with the supervision loop lives in this module as a handful of
//! atomics. [`forward`] is their only writer while a [`SignalBridge`] is
//! installed, the loop reads them through [`SignalState::load`], and
//! [`SignalBridge::install`] resets them, so each invocation starts clean.
//! Only one bridge may be installed at a time.

use crate::error::{Error, Result};
use nix::errno::Errno;
use nix::libc::{self, c_int};
use nix::sys::signal::{kill, sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;
use std::convert::TryFrom;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Signals intercepted and forwarded while a child is supervised.
pub const INTERRUPTS: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGQUIT];

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static SIGNAL_NUMBER: AtomicI32 = AtomicI32::new(0);
static FORWARDED: AtomicBool = AtomicBool::new(false);
static CHILD_PID: AtomicI32 = AtomicI32::new(0);

/// The installed handler. Atomic stores and one `kill(2)`, nothing else.
///
/// `errno` is put back before returning, so a failed forward is invisible to
/// the code the signal interrupted.
extern "C" fn forward(signum: c_int) {
    let saved_errno = Errno::last_raw();
    SIGNAL_NUMBER.store(signum, Ordering::SeqCst);

    let pid = CHILD_PID.load(Ordering::SeqCst);
    if pid > 0 {
        unsafe {
            libc::kill(pid, signum);
        }
        FORWARDED.store(true, Ordering::SeqCst);
    }

    // Set last: a reader that sees the flag also sees the forwarding attempt.
    INTERRUPTED.store(true, Ordering::SeqCst);
    Errno::set_raw(saved_errno);
}

/// Snapshot of what the handler has recorded since the bridge was installed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SignalState {
    pub interrupted: bool,
    /// The received signal number, when one was recorded.
    pub signal: Option<i32>,
}

impl SignalState {
    pub fn load() -> Self {
        let interrupted = INTERRUPTED.load(Ordering::SeqCst);
        let signum = SIGNAL_NUMBER.load(Ordering::SeqCst);

        Self {
            interrupted,
            signal: if interrupted && signum > 0 {
                Some(signum)
            } else {
                None
            },
        }
    }

    fn reset() {
        INTERRUPTED.store(false, Ordering::SeqCst);
        SIGNAL_NUMBER.store(0, Ordering::SeqCst);
        FORWARDED.store(false, Ordering::SeqCst);
        CHILD_PID.store(0, Ordering::SeqCst);
    }
}

/// Installed handlers for [`INTERRUPTS`], restored exactly once.
///
/// Restoration happens on [`restore`](Self::restore) or, failing that, on
/// drop, so every exit path of the supervisor puts the previous dispositions
/// back.
pub struct SignalBridge {
    previous: Option<Vec<(Signal, SigAction)>>,
}

impl SignalBridge {
    pub fn install() -> Result<Self> {
        SignalState::reset();

        let action = SigAction::new(
            SigHandler::Handler(forward),
            SaFlags::empty(),
            SigSet::empty(),
        );

        let mut previous = Vec::with_capacity(INTERRUPTS.len());
        for &signal in &INTERRUPTS {
            match unsafe { sigaction(signal, &action) } {
                Ok(old) => previous.push((signal, old)),
                Err(errno) => {
                    reinstall(&previous);
                    return Err(Error::Signal(errno));
                }
            }
        }

        debug!("Intercepting {:?}", INTERRUPTS);
        Ok(Self {
            previous: Some(previous),
        })
    }

    /// Makes `pid` the target of forwarded signals.
    ///
    /// A signal caught between install and registration had no child to go
    /// to; it is forwarded here instead.
    pub fn register_child(&self, pid: Pid) {
        CHILD_PID.store(pid.as_raw(), Ordering::SeqCst);

        if INTERRUPTED.load(Ordering::SeqCst) && !FORWARDED.swap(true, Ordering::SeqCst) {
            if let Ok(signal) = Signal::try_from(SIGNAL_NUMBER.load(Ordering::SeqCst)) {
                debug!("Forwarding early {} to child process {}", signal, pid);
                let _ = kill(pid, signal);
            }
        }
    }

    pub fn unregister_child(&self) {
        CHILD_PID.store(0, Ordering::SeqCst);
    }

    /// Reinstalls the dispositions in place before [`install`](Self::install).
    pub fn restore(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.unregister_child();
            reinstall(&previous);
            debug!("Restored previous handlers for {:?}", INTERRUPTS);
        }
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        self.restore();
    }
}

fn reinstall(previous: &[(Signal, SigAction)]) {
    for (signal, action) in previous {
        if let Err(errno) = unsafe { sigaction(*signal, action) } {
            warn!("Couldn't restore handler for {}: {}", signal, errno);
        }
    }
}

/// Human-readable name of a signal number, e.g. `SIGINT`.
pub fn name(signum: i32) -> String {
    Signal::try_from(signum).map_or_else(
        |_| format!("signal {}", signum),
        |signal| signal.as_str().to_string(),
    )
}
