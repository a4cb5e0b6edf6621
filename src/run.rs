use std::io::{self, Write};
use std::thread;
use std::time::Instant;

use crate::config::Config;
use crate::error::Result;
use crate::escalate;
use crate::process::{self, ExitStatus, Process};
use crate::signal::{self, SignalBridge, SignalState};
use crate::spinner::Spinner;

/// Exit code for a command that ran out of time.
pub const TIMED_OUT: i32 = 124;

/// Exit code for an interruption whose signal is unknown.
pub const INTERRUPTED: i32 = 130;

pub fn init_logger(debug: bool) {
    let mut log_builder = env_logger::Builder::new();
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    log_builder
        .format(|buf, r| writeln!(buf, "*** {}", r.args()))
        .filter(None, level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        log_builder.parse_filters(&filters);
    }

    if log_builder.try_init().is_err() {
        debug!("Logger already initialised");
    }
}

/// How a supervised run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The command exited on its own with this status.
    Exited(i32),
    /// The command was killed by this signal, not sent by us.
    Signaled(i32),
    /// The timeout elapsed and the command was stopped.
    TimedOut,
    /// We received this signal (if known) and passed it on.
    Interrupted(Option<i32>),
}

impl Outcome {
    pub const fn exit_code(self) -> i32 {
        match self {
            Outcome::Exited(code) => code,
            Outcome::Signaled(signum) => 128 + signum,
            Outcome::TimedOut => TIMED_OUT,
            Outcome::Interrupted(Some(signum)) => 128 + signum,
            Outcome::Interrupted(None) => INTERRUPTED,
        }
    }
}

impl From<ExitStatus> for Outcome {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Exited(code) => Outcome::Exited(code),
            ExitStatus::Signaled(signum) => Outcome::Signaled(signum),
        }
    }
}

/// Runs the configured command behind a spinner on stdout and returns the
/// exit code to report.
pub fn run(config: &Config) -> i32 {
    let stdout = io::stdout();
    match supervise(config, stdout.lock()) {
        Ok(outcome) => {
            debug!("Supervision ended: {:?}", outcome);
            outcome.exit_code()
        }
        Err(err) => {
            eprintln!("{}", err);
            err.exit_code()
        }
    }
}

/// Supervises one run of the configured command, drawing on `out`.
///
/// Signal dispositions and the cursor are restored before this returns, on
/// every path. The child is reaped on every path except a failed status
/// query, where dropping it kills and reaps it instead.
pub fn supervise<W: Write>(config: &Config, out: W) -> Result<Outcome> {
    let mut bridge = SignalBridge::install()?;
    let mut spinner = if config.animate {
        Spinner::new(out, config.message())
    } else {
        Spinner::disabled(out)
    };

    let mut child = process::spawn(&config.cmd)?;
    bridge.register_child(child.pid());

    if let Err(err) = spinner.hide_cursor() {
        warn!("Couldn't hide cursor, disabling spinner: {}", err);
        spinner.disable();
    }

    let outcome = watch(config, &mut child, &mut spinner);

    let _ = spinner.finish();
    bridge.restore();
    outcome
}

/// The supervision loop proper: interruption, then completion, then timeout,
/// then the next frame.
fn watch<W: Write>(
    config: &Config,
    child: &mut Process,
    spinner: &mut Spinner<W>,
) -> Result<Outcome> {
    let started = Instant::now();
    let mut last_frame: Option<Instant> = None;

    loop {
        let state = SignalState::load();
        if state.interrupted {
            let _ = spinner.finish();
            thread::sleep(config.interrupt_grace);

            // The run counts as interrupted whatever the child died of.
            let status = child.wait()?;
            debug!("Child ended with {:?} after interruption", status);

            match state.signal {
                Some(signum) => eprintln!("Interrupted by {}", signal::name(signum)),
                None => eprintln!("Interrupted"),
            }
            return Ok(Outcome::Interrupted(state.signal));
        }

        if let Some(status) = child.try_wait()? {
            return Ok(status.into());
        }

        if config.timeout.as_nanos() > 0 && started.elapsed() >= config.timeout {
            let _ = spinner.finish();
            eprintln!(
                "Process timed out after {} seconds",
                config.timeout.as_secs()
            );

            let termination = escalate::terminate(child, &config.escalation())?;
            debug!("Timed-out child stopped: {:?}", termination);
            return Ok(Outcome::TimedOut);
        }

        if last_frame.map_or(true, |at| at.elapsed() >= config.frame_interval) {
            if let Err(err) = spinner.render() {
                warn!("Couldn't draw spinner, disabling it: {}", err);
                spinner.disable();
            }
            last_frame = Some(Instant::now());
        }

        thread::sleep(config.poll_interval);
    }
}
