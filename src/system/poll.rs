use std::{
    collections::BTreeMap,
    io,
    os::fd::{AsRawFd, RawFd},
    time::Duration,
};

use crate::cutils::cerr;
use libc::{c_int, c_short, pollfd, POLLHUP, POLLIN};

/// The kind of event that will be monitored for a file descriptor.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// Data may be read without blocking.
    Readable,
}

/// A set of indexed file descriptors to be polled using the [`poll`](https://manpage.me/?q=poll) system call.
pub struct PollSet<K> {
    fds: BTreeMap<K, (RawFd, c_short)>,
}

impl<K: Eq + PartialEq + Ord + PartialOrd + Clone> PollSet<K> {
    /// Create an empty set of file descriptors.
    pub const fn new() -> Self {
        Self {
            fds: BTreeMap::new(),
        }
    }

    /// Add a file descriptor under the provided key. This descriptor will be checked for the given
    /// poll event.
    ///
    /// If the provided key is already in the set, calling this function will overwrite the file
    /// descriptor for that key.
    pub fn add_fd<F: AsRawFd>(&mut self, key: K, fd: &F, event: PollEvent) {
        let event = match event {
            PollEvent::Readable => POLLIN,
        };
        self.fds.insert(key, (fd.as_raw_fd(), event));
    }

    /// Poll the set of file descriptors and return the key of the descriptors that are ready to be
    /// read or written.
    ///
    /// Calling this function will block until one of the file descriptors in the set is ready or,
    /// if a `timeout` is given, until it elapses, in which case the returned list is empty. A
    /// descriptor whose peer hung up counts as readable so that end-of-file can be observed.
    pub fn poll(&mut self, timeout: Option<Duration>) -> io::Result<Vec<K>> {
        let mut fds: Vec<pollfd> = self
            .fds
            .values()
            .map(|&(fd, events)| pollfd {
                fd,
                events,
                revents: 0,
            })
            .collect();

        let timeout = match timeout {
            Some(duration) => c_int::try_from(duration.as_millis()).unwrap_or(c_int::MAX),
            None => -1,
        };

        let n = cerr(unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as _, timeout) })?;

        let mut keys = Vec::with_capacity(n as usize);

        for (key, fd) in self.fds.keys().zip(fds) {
            let events = (fd.events | POLLHUP) & fd.revents;

            if events != 0 {
                keys.push(key.clone());
            }
        }

        Ok(keys)
    }
}
