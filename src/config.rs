//! Configuration for a supervised run.
//!
//! The [`Config`] struct is not constructable, use [`ConfigBuilder`].
//!
//! # Examples
//!
//! ```
//! # use spinexec::config::ConfigBuilder;
//! # use std::time::Duration;
//! let config = ConfigBuilder::default()
//!     .cmd(vec!["sleep".to_string(), "1".to_string()])
//!     .timeout(Duration::from_secs(5))
//!     .build()
//!     .expect("mission failed");
//! assert_eq!(config.message(), "Running: sleep 1");
//! ```

use std::time::Duration;

use crate::escalate::Escalation;

/// Arguments to the supervisor
#[derive(Builder, Clone, Debug)]
#[builder(setter(into, strip_option))]
#[builder(build_fn(validate = "Self::validate"))]
#[non_exhaustive]
pub struct Config {
    /// Command to execute in execvp format (first program, rest arguments).
    pub cmd: Vec<String>,
    /// Text shown next to the spinner. Defaults to [`default_message`].
    #[builder(default)]
    pub message: Option<String>,
    /// Give up on the command after this long. Zero waits forever.
    #[builder(default)]
    pub timeout: Duration,
    /// How long a timed-out command gets between SIGTERM and SIGKILL.
    #[builder(default = "Duration::from_secs(1)")]
    pub grace: Duration,
    /// Time between two spinner frames.
    #[builder(default = "Duration::from_millis(200)")]
    pub frame_interval: Duration,
    /// Time between two completion polls.
    #[builder(default = "Duration::from_millis(50)")]
    pub poll_interval: Duration,
    /// Delay given to a forwarded interruption before reaping the command.
    #[builder(default = "Duration::from_millis(100)")]
    pub interrupt_grace: Duration,
    /// Draw the spinner. When false, wait silently.
    #[builder(default = "true")]
    pub animate: bool,
}

impl Config {
    /// The text to display while the command runs.
    pub fn message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| default_message(&self.cmd))
    }

    pub fn escalation(&self) -> Escalation {
        Escalation {
            grace: self.grace,
            ..Escalation::default()
        }
    }
}

impl ConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.cmd.as_ref().map_or(true, Vec::is_empty) {
            return Err("cmd must not be empty".into());
        }

        Ok(())
    }
}

/// `Running:` followed by the space-joined command.
pub fn default_message(cmd: &[String]) -> String {
    std::iter::once("Running:")
        .chain(cmd.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{default_message, ConfigBuilder};
    use nix::sys::signal::Signal;
    use std::time::Duration;

    #[test]
    fn default_message_joins_tokens() {
        assert_eq!(
            default_message(&["sh".to_string(), "-c".to_string(), "exit 7".to_string()]),
            "Running: sh -c exit 7"
        );
        assert_eq!(default_message(&[]), "Running:");
    }

    #[test]
    fn builds_with_defaults() {
        let config = ConfigBuilder::default()
            .cmd(vec!["true".to_string()])
            .build()
            .expect("build");

        assert_eq!(config.message(), "Running: true");
        assert_eq!(config.timeout, Duration::from_secs(0));
        assert_eq!(config.frame_interval, Duration::from_millis(200));
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.interrupt_grace, Duration::from_millis(100));
        assert!(config.animate);

        let escalation = config.escalation();
        assert_eq!(escalation.soft, Signal::SIGTERM);
        assert_eq!(escalation.hard, Signal::SIGKILL);
        assert_eq!(escalation.grace, Duration::from_secs(1));
    }

    #[test]
    fn explicit_values_win() {
        let config = ConfigBuilder::default()
            .cmd(vec!["sleep".to_string(), "10".to_string()])
            .message("Please wait")
            .timeout(Duration::from_secs(3))
            .grace(Duration::from_millis(250))
            .animate(false)
            .build()
            .expect("build");

        assert_eq!(config.message(), "Please wait");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.escalation().grace, Duration::from_millis(250));
        assert!(!config.animate);
    }

    #[test]
    fn rejects_missing_or_empty_command() {
        assert_eq!(
            ConfigBuilder::default().build().unwrap_err(),
            "cmd must not be empty"
        );
        assert_eq!(
            ConfigBuilder::default()
                .cmd(Vec::<String>::new())
                .build()
                .unwrap_err(),
            "cmd must not be empty"
        );
    }
}
