use std::{fmt::Display, num::ParseIntError, str::FromStr};

/// An OS process identifier.
///
/// Every job is the leader of its own process group, so the same value doubles as the
/// process group ID of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(libc::pid_t);

impl ProcessId {
    pub fn new(id: libc::pid_t) -> Self {
        Self(id)
    }

    pub fn get(&self) -> libc::pid_t {
        self.0
    }

    /// Whether this ID can name a live process, `0` and negative values are selectors for
    /// `kill`/`waitpid` rather than processes.
    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProcessId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<libc::pid_t>().map(ProcessId::new)
    }
}
