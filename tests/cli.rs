use std::io;
use std::os::unix::process::CommandExt;
use std::process::Command as StdCommand;
use std::thread;
use std::time::{Duration, Instant};

use assert_cmd::prelude::*;
use assert_cmd::Command;
use nix::sys::signal::{kill, signal, SigHandler, Signal};
use nix::unistd::Pid;
use predicates::prelude::*;

fn spinexec() -> Command {
    Command::cargo_bin("spinexec").unwrap()
}

#[test]
fn help() {
    spinexec()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--timeout"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn true_exits_zero() {
    spinexec()
        .arg("true")
        .assert()
        .code(0)
        .stdout(predicate::str::ends_with("\x1b[?25h"));
}

#[test]
fn child_status_is_passed_through() {
    spinexec()
        .args(&["--", "sh", "-c", "exit 7"])
        .assert()
        .code(7);
}

#[test]
fn child_killed_by_signal() {
    spinexec()
        .args(&["sh", "-c", "kill -TERM $$"])
        .assert()
        .code(128 + 15);
}

#[test]
fn missing_program_exits_127() {
    spinexec()
        .arg("/nonexistent/binary")
        .assert()
        .code(127)
        .stderr(predicate::str::contains(
            "Failed to execute '/nonexistent/binary'",
        ));
}

#[test]
fn default_message_is_shown() {
    spinexec()
        .args(&["sleep", "0.3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Running: sleep 0.3 -"));
}

#[test]
fn custom_message_is_shown() {
    spinexec()
        .args(&["-m", "Hold on", "sleep", "0.3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hold on -"))
        .stdout(predicate::str::contains("Running:").not());
}

#[test]
fn quiet_writes_nothing() {
    spinexec()
        .args(&["-q", "sleep", "0.3"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn timeout_exits_124() {
    let started = Instant::now();
    spinexec()
        .args(&["-t", "1", "sleep", "10"])
        .assert()
        .code(124)
        .stderr(predicate::str::contains("Process timed out after 1 seconds"));
    assert!(started.elapsed() < Duration::from_secs(8));
}

#[test]
fn stubborn_timeout_prints_a_single_line() {
    spinexec()
        .args(&["-t", "1", "-g", "1", "--", "sh", "-c", "trap '' TERM; exec sleep 5"])
        .assert()
        .code(124)
        .stderr("Process timed out after 1 seconds\n");
}

#[test]
fn unwaitable_child_exits_1() {
    let mut cmd = StdCommand::cargo_bin("spinexec").unwrap();
    cmd.args(&["-q", "true"]);
    // With SIGCHLD ignored the kernel reaps the child before we can.
    unsafe {
        cmd.pre_exec(|| {
            signal(Signal::SIGCHLD, SigHandler::SigIgn)
                .map(drop)
                .map_err(io::Error::from)
        });
    }

    let output = cmd.output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stderr.lines().count(), 1, "{}", stderr);
    assert!(stderr.starts_with("Wait error: couldn't query child status"));
}

#[test]
fn interrupt_is_forwarded() {
    let mut child = StdCommand::cargo_bin("spinexec")
        .unwrap()
        .args(&["sleep", "10"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .unwrap();

    thread::sleep(Duration::from_millis(500));
    kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).unwrap();

    let started = Instant::now();
    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(130));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Interrupted by SIGINT"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn empty_command_is_rejected() {
    spinexec().assert().failure();
}
