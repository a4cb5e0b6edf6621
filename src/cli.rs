use std::ffi::OsString;
use std::time::Duration;

use clap::{App, AppSettings, Arg, ArgMatches};

use crate::config::{Config, ConfigBuilder};
use crate::error::Result;

#[derive(Debug)]
pub struct Args {
    pub config: Config,
    pub debug: bool,
}

pub fn get_args() -> Result<Args> {
    get_args_from(std::env::args_os())
}

pub fn get_args_from<I, T>(from: I) -> Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = app().get_matches_from(from);
    build(&args)
}

fn app() -> App<'static, 'static> {
    App::new("spinexec")
        .version(crate_version!())
        .about("Run a command behind a spinner, forwarding signals and enforcing a timeout")
        .setting(AppSettings::TrailingVarArg)
        .arg(Arg::with_name("command")
                 .help("Command to run")
                 .multiple(true)
                 .required(true))
        .arg(Arg::with_name("message")
                 .help("Text shown next to the spinner [default: Running: <command>]")
                 .short("m")
                 .long("message")
                 .takes_value(true)
                 .value_name("text"))
        .arg(Arg::with_name("timeout")
                 .help("Stop the command after this many seconds, 0 waits forever")
                 .short("t")
                 .long("timeout")
                 .takes_value(true)
                 .value_name("seconds"))
        .arg(Arg::with_name("grace")
                 .help("Seconds between SIGTERM and SIGKILL when the timeout is hit, defaults to 1")
                 .short("g")
                 .long("grace")
                 .takes_value(true)
                 .value_name("seconds"))
        .arg(Arg::with_name("quiet")
                 .help("Wait without drawing the spinner")
                 .short("q")
                 .long("quiet"))
        .arg(Arg::with_name("verbose")
                 .help("Print debugging messages to stderr")
                 .short("v")
                 .long("verbose"))
}

fn build(args: &ArgMatches) -> Result<Args> {
    let cmd = values_t!(args.values_of("command"), String).unwrap_or_else(|e| e.exit());

    let timeout = if args.occurrences_of("timeout") > 0 {
        value_t!(args.value_of("timeout"), u64).unwrap_or_else(|e| e.exit())
    } else {
        0
    };

    let grace = if args.occurrences_of("grace") > 0 {
        value_t!(args.value_of("grace"), u64).unwrap_or_else(|e| e.exit())
    } else {
        1
    };

    let mut builder = ConfigBuilder::default();
    builder
        .cmd(cmd)
        .timeout(Duration::from_secs(timeout))
        .grace(Duration::from_secs(grace))
        .animate(!args.is_present("quiet"));
    if let Some(message) = args.value_of("message") {
        builder.message(message);
    }

    Ok(Args {
        config: builder.build()?,
        debug: args.is_present("verbose"),
    })
}

#[cfg(test)]
mod tests {
    use super::get_args_from;
    use std::time::Duration;

    #[test]
    fn command_only() {
        let args = get_args_from(&["spinexec", "sleep", "10"]).expect("args");

        assert_eq!(args.config.cmd, vec!["sleep", "10"]);
        assert_eq!(args.config.message(), "Running: sleep 10");
        assert_eq!(args.config.timeout, Duration::from_secs(0));
        assert_eq!(args.config.grace, Duration::from_secs(1));
        assert!(args.config.animate);
        assert!(!args.debug);
    }

    #[test]
    fn options_before_command() {
        let args = get_args_from(&[
            "spinexec", "-t", "5", "-g", "2", "-m", "Building", "-q", "-v", "make", "all",
        ])
        .expect("args");

        assert_eq!(args.config.cmd, vec!["make", "all"]);
        assert_eq!(args.config.message(), "Building");
        assert_eq!(args.config.timeout, Duration::from_secs(5));
        assert_eq!(args.config.grace, Duration::from_secs(2));
        assert!(!args.config.animate);
        assert!(args.debug);
    }

    #[test]
    fn command_keeps_its_own_flags() {
        let args = get_args_from(&["spinexec", "--timeout", "3", "ls", "-la", "-t"])
            .expect("args");

        assert_eq!(args.config.cmd, vec!["ls", "-la", "-t"]);
        assert_eq!(args.config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn double_dash_separates_command() {
        let args = get_args_from(&["spinexec", "--", "sh", "-c", "exit 7"]).expect("args");
        assert_eq!(args.config.cmd, vec!["sh", "-c", "exit 7"]);
    }
}
