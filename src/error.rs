use nix::errno::Errno;
use std::{error::Error as StdError, fmt};

pub type Result<T> = ::std::result::Result<T, Error>;

pub enum Error {
    Config(String),
    Signal(Errno),
    Spawn(Errno),
    Wait(Errno),
}

impl Error {
    /// Exit code reported when supervision fails for infrastructure reasons.
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Config(_) => None,
            Error::Signal(errno) | Error::Spawn(errno) | Error::Wait(errno) => Some(errno),
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Config(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} error: {}",
            match self {
                Error::Config(_) => "Config",
                Error::Signal(_) => "Signal",
                Error::Spawn(_) => "Spawn",
                Error::Wait(_) => "Wait",
            },
            match self {
                Error::Config(msg) => msg.clone(),
                Error::Signal(errno) => format!("couldn't set up or deliver signal: {}", errno),
                Error::Spawn(errno) => format!("couldn't create child process: {}", errno),
                Error::Wait(errno) => format!("couldn't query child status: {}", errno),
            }
        )
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
