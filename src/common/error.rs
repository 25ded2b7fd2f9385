use std::{fmt, io, path::PathBuf};

use crate::system::interface::ProcessId;

#[derive(Debug)]
pub enum Error {
    /// The job table has no free slot left.
    TooManyJobs,
    /// A second job was about to be put in the foreground.
    ForegroundBusy(ProcessId),
    /// `fg`/`bg` was called without an argument.
    MissingJobArgument(&'static str),
    /// `fg`/`bg` got an argument that is neither a PID nor a `%jobid`.
    InvalidJobArgument(&'static str),
    /// The `%jobid` as typed by the user does not name a live job.
    NoSuchJob(String),
    NoSuchProcess(ProcessId),
    CommandNotFound(String),
    /// A `<` or `>` without a file name after it.
    MissingRedirectTarget(&'static str),
    Options(String),
    /// Process creation failed, nothing was launched.
    Fork(io::Error),
    /// Installing handlers or changing the signal mask failed.
    SignalSetup(io::Error),
    /// Reading from the signal stream failed, the state of the jobs is unknown from here on.
    SignalStream(io::Error),
    Io(Option<PathBuf>, io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooManyJobs => f.write_str("Tried to create too many jobs"),
            Error::ForegroundBusy(pid) => {
                write!(f, "job ({pid}) already occupies the foreground")
            }
            Error::MissingJobArgument(builtin) => {
                write!(f, "{builtin} command requires PID or %jobid argument")
            }
            Error::InvalidJobArgument(builtin) => {
                write!(f, "{builtin}: argument must be a PID or %jobid")
            }
            Error::NoSuchJob(job) => write!(f, "{job}: No such job"),
            Error::NoSuchProcess(pid) => write!(f, "({pid}): No such process"),
            Error::CommandNotFound(program) => write!(f, "{program}: Command not found"),
            Error::MissingRedirectTarget(token) => {
                write!(f, "syntax error: expected a file name after '{token}'")
            }
            Error::Options(e) => write!(f, "{e}"),
            Error::Fork(e) => write!(f, "fork error: {e}"),
            Error::SignalSetup(e) => write!(f, "cannot set up signal handling: {e}"),
            Error::SignalStream(e) => write!(f, "lost track of signals: {e}"),
            Error::Io(location, e) => {
                if let Some(path) = location {
                    write!(f, "{}: {e}", path.display())
                } else {
                    write!(f, "IO error: {e}")
                }
            }
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(None, err)
    }
}

impl Error {
    /// Returns `true` if the shell cannot keep going after this error.
    ///
    /// Everything else is reported to the user and control returns to the prompt.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SignalSetup(_) | Self::SignalStream(_))
    }
}
