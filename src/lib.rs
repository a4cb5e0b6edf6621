//! Spinexec: the library
//!
//! This is the library behind the `spinexec` CLI tool, which runs a command
//! behind a spinner, forwards interruption signals to it, and stops it when a
//! timeout elapses. The entry point is [`run`], fed by a [`config::Config`].
//!
//! Signal handling is process-wide: only one supervised run may be in flight
//! per process at any time. Sequential runs are fine.

#![deny(unsafe_code)]
#![allow(clippy::default_trait_access, clippy::cognitive_complexity)]

#[cfg(not(unix))]
compile_error!("spinexec relies on POSIX signals and process control, and only builds on unix");

#[macro_use]
extern crate clap;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate log;
#[cfg(test)]
#[macro_use]
extern crate lazy_static;

pub mod cli;
pub mod config;
pub mod error;
pub mod escalate;
pub mod process;
pub mod run;
pub mod signal;
pub mod spinner;

pub use run::run;
