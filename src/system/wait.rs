//! Collecting the state changes of jobs with `waitpid(2)`.
use std::{fmt, io};

use libc::{
    c_int, WEXITSTATUS, WIFEXITED, WIFSIGNALED, WIFSTOPPED, WNOHANG, WSTOPSIG, WTERMSIG, WUNTRACED,
};

use crate::{
    cutils::cerr,
    system::{
        interface::ProcessId,
        signal::{signal_name, SignalNumber},
    },
};

/// How a child changed state.
///
/// Continued children are never asked for, so resuming a job is not a state change here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildState {
    /// Called `exit` with this status.
    Exited(c_int),
    /// Ended by this signal.
    Killed(SignalNumber),
    /// Stopped by this signal and still around.
    Stopped(SignalNumber),
}

impl ChildState {
    fn decode(status: c_int) -> Option<Self> {
        if WIFEXITED(status) {
            Some(Self::Exited(WEXITSTATUS(status)))
        } else if WIFSIGNALED(status) {
            Some(Self::Killed(WTERMSIG(status)))
        } else if WIFSTOPPED(status) {
            Some(Self::Stopped(WSTOPSIG(status)))
        } else {
            None
        }
    }

    /// Whether the child is gone and its job should leave the table.
    pub(crate) fn is_final(&self) -> bool {
        !matches!(self, Self::Stopped(_))
    }
}

impl fmt::Display for ChildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |signal| signal_name(signal).unwrap_or("unknown signal");
        match *self {
            Self::Exited(code) => write!(f, "exited with status {code}"),
            Self::Killed(signal) => write!(f, "killed by {}", name(signal)),
            Self::Stopped(signal) => write!(f, "stopped by {}", name(signal)),
        }
    }
}

#[derive(Debug)]
pub(crate) enum WaitError {
    /// The child did not change state. Only with [`WaitOptions::no_hang`].
    NotReady,
    Io(io::Error),
}

/// Flags for [`Wait::wait`]. By default it blocks until the child ends.
#[derive(Clone, Copy)]
pub(crate) struct WaitOptions {
    flags: c_int,
}

impl WaitOptions {
    pub(crate) const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Report [`WaitError::NotReady`] instead of blocking.
    pub(crate) const fn no_hang(mut self) -> Self {
        self.flags |= WNOHANG;
        self
    }

    /// Report stopped children as well.
    pub(crate) const fn untraced(mut self) -> Self {
        self.flags |= WUNTRACED;
        self
    }
}

pub(crate) trait Wait {
    /// Wait for this child to change state.
    fn wait(self, options: WaitOptions) -> Result<ChildState, WaitError>;
}

impl Wait for ProcessId {
    fn wait(self, options: WaitOptions) -> Result<ChildState, WaitError> {
        let mut status: c_int = 0;

        let pid = cerr(unsafe { libc::waitpid(self.get(), &mut status, options.flags) })
            .map_err(WaitError::Io)?;
        if pid == 0 {
            return Err(WaitError::NotReady);
        }

        ChildState::decode(status).ok_or_else(|| {
            WaitError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unexpected wait status {status:#x} for {self}"),
            ))
        })
    }
}
