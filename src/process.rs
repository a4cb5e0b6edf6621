#![allow(unsafe_code)]

use crate::error::{Error, Result};
use crate::signal::INTERRUPTS;
use nix::errno::Errno;
use nix::libc::{self, c_char};
use nix::sys::signal::{
    kill, sigaction, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal,
};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use std::ffi::CString;
use std::ptr;

/// Status the child exits with when the target cannot be executed.
pub const EXEC_FAILED: i32 = 127;

/// Forks and executes `cmd` (program first, then its arguments), looking the
/// program up in `PATH`.
///
/// A program that cannot be executed is not an error here: the child reports
/// it on stderr and exits with [`EXEC_FAILED`], which the parent observes as
/// an ordinary completion.
pub fn spawn(cmd: &[String]) -> Result<Process> {
    let head = cmd
        .first()
        .ok_or_else(|| Error::Config("cmd must not be empty".into()))?;

    // Everything the child touches is allocated before forking.
    let argv = cmd
        .iter()
        .map(|arg| {
            CString::new(arg.as_bytes())
                .map_err(|_| Error::Config(format!("argument contains a NUL byte: {:?}", arg)))
        })
        .collect::<Result<Vec<_>>>()?;
    let mut argv_ptrs: Vec<*const c_char> = argv.iter().map(|arg| arg.as_ptr()).collect();
    argv_ptrs.push(ptr::null());
    let diagnostic = format!("Failed to execute '{}': ", head);

    debug!("Assembled command {:?}", cmd);

    // Hold interruptions while forking: the child must not run the
    // supervisor's handler, and the parent only handles them once the fork
    // has settled.
    let mut interrupts = SigSet::empty();
    for &signal in &INTERRUPTS {
        interrupts.add(signal);
    }
    let mask = interrupts
        .thread_swap_mask(SigmaskHow::SIG_BLOCK)
        .map_err(Error::Signal)?;

    let forked = unsafe { fork() };
    if let Ok(ForkResult::Child) = forked {
        exec_or_exit(&mask, &argv_ptrs, diagnostic.as_bytes());
    }

    if let Err(errno) = mask.thread_set_mask() {
        warn!("Couldn't restore signal mask: {}", errno);
    }

    match forked {
        Ok(ForkResult::Parent { child }) => {
            debug!("Spawned child process {}", child);
            Ok(Process::new(child))
        }
        Ok(ForkResult::Child) => unreachable!("child never returns from exec_or_exit"),
        Err(errno) => Err(Error::Spawn(errno)),
    }
}

/// Runs in the forked child: only async-signal-safe calls from here on.
fn exec_or_exit(mask: &SigSet, argv: &[*const c_char], diagnostic: &[u8]) -> ! {
    // Pending interruptions now hit the child with their default action.
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for &signal in &INTERRUPTS {
        let _ = unsafe { sigaction(signal, &default) };
    }
    let _ = mask.thread_set_mask();

    unsafe {
        libc::execvp(argv[0], argv.as_ptr());
    }

    let reason = Errno::last().desc();
    write_stderr(diagnostic);
    write_stderr(reason.as_bytes());
    write_stderr(b"\n");

    unsafe { libc::_exit(EXEC_FAILED) }
}

fn write_stderr(bytes: &[u8]) {
    unsafe {
        libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}

/// How a reaped child ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Exited(i32),
    /// Terminated by the given signal number.
    Signaled(i32),
}

/// A forked child, reaped at most once.
///
/// The first observed status is cached, so queries after reaping return
/// immediately and never wait on a pid that may have been recycled. Once a
/// status query fails the pid is no longer trusted: it is never signalled or
/// waited on again.
#[derive(Debug)]
pub struct Process {
    pid: Pid,
    status: Option<ExitStatus>,
    lost: bool,
}

impl Process {
    const fn new(pid: Pid) -> Self {
        Self {
            pid,
            status: None,
            lost: false,
        }
    }

    pub const fn pid(&self) -> Pid {
        self.pid
    }

    /// The status, if the child has already been reaped.
    #[cfg(test)]
    pub(crate) const fn status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// Non-blocking completion poll. `Ok(None)` means still running.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if let Some(status) = self.status {
            return Ok(Some(status));
        }

        match waitpid(self.pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(status) => Ok(self.record(status)),
            Err(Errno::EINTR) => Ok(None),
            Err(errno) => Err(self.lose(errno)),
        }
    }

    /// Blocks until the child has terminated.
    pub fn wait(&mut self) -> Result<ExitStatus> {
        loop {
            if let Some(status) = self.status {
                return Ok(status);
            }

            match waitpid(self.pid, None) {
                Ok(status) => {
                    self.record(status);
                }
                // Interruption handlers are installed without SA_RESTART.
                Err(Errno::EINTR) => {}
                Err(errno) => return Err(self.lose(errno)),
            }
        }
    }

    /// Sends `signal` to the child. A no-op once the child has been reaped.
    pub fn signal(&self, signal: Signal) -> Result<()> {
        if self.status.is_some() || self.lost {
            debug!("Not sending {} to reaped or lost child {}", signal, self.pid);
            return Ok(());
        }

        debug!("Sending {} to child process {}", signal, self.pid);
        match kill(self.pid, signal) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(Error::Signal(errno)),
        }
    }

    fn lose(&mut self, errno: Errno) -> Error {
        debug!("Lost track of child process {}: {}", self.pid, errno);
        self.lost = true;
        Error::Wait(errno)
    }

    fn record(&mut self, status: WaitStatus) -> Option<ExitStatus> {
        let status = match status {
            WaitStatus::Exited(_, code) => ExitStatus::Exited(code),
            WaitStatus::Signaled(_, signal, _) => ExitStatus::Signaled(signal as i32),
            // Stopped, continued, or nothing to report yet
            _ => return None,
        };

        debug!("Reaped child process {}: {:?}", self.pid, status);
        self.status = Some(status);
        Some(status)
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        if self.status.is_none() && !self.lost {
            debug!("Killing unreaped child process {}", self.pid);
            let _ = self.signal(Signal::SIGKILL);
            let _ = self.wait();
        }
    }
}
