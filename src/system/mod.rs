use std::{
    ffi::c_uint,
    io,
    os::fd::{AsRawFd, RawFd},
};

use crate::cutils::cerr;
use interface::ProcessId;
use libc::STDERR_FILENO;

use self::signal::SignalNumber;

// generalized traits for when we want to hide implementations
pub mod interface;

pub mod poll;

pub mod signal;

pub mod wait;

/// Terminate the current process without running any exit handlers or flushing buffers that
/// belong to the parent.
pub(crate) fn _exit(status: libc::c_int) -> ! {
    unsafe { libc::_exit(status) }
}

/// Close every file descriptor that is not one of the IO streams.
///
/// Used by freshly forked children so that the shell's signal socket and any other descriptor
/// it holds do not leak into the executed program.
pub(crate) fn close_non_stdio_fds() -> io::Result<()> {
    close_range(STDERR_FILENO as c_uint + 1, c_uint::MAX)
}

fn close_range(min_fd: c_uint, max_fd: c_uint) -> io::Result<()> {
    if min_fd <= max_fd {
        cerr(unsafe { libc::syscall(libc::SYS_close_range, min_fd, max_fd, 0 as c_uint) })?;
    }

    Ok(())
}

/// Write all of `buf` to standard output, bypassing the locked and buffered [`std::io::Stdout`].
///
/// A forked child of a multi-threaded process cannot rely on the `Stdout` lock being free.
pub(crate) fn write_stdout_raw(mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match cerr(unsafe { libc::write(libc::STDOUT_FILENO, buf.as_ptr().cast(), buf.len()) }) {
            Ok(written) => buf = &buf[written as usize..],
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

pub(crate) enum ForkResult {
    // Parent process branch with the child process' PID.
    Parent(ProcessId),
    // Child process branch.
    Child,
}

unsafe fn inner_fork() -> io::Result<ForkResult> {
    let pid = cerr(unsafe { libc::fork() })?;
    if pid == 0 {
        Ok(ForkResult::Child)
    } else {
        Ok(ForkResult::Parent(ProcessId::new(pid)))
    }
}

/// Create a new process.
///
/// The child keeps running regular Rust code, allocations included, until it replaces its
/// image. In the shell nothing else runs at the time of the fork. The unit tests fork from the
/// multi-threaded test harness: there the child only takes locks that no test holds across a
/// fork, and the C library hands it a usable allocator.
pub(crate) fn fork() -> io::Result<ForkResult> {
    // SAFETY: the child never waits on a lock that another thread could have held at the time
    // of the fork, see above.
    unsafe { inner_fork() }
}

/// Send a signal to a process group with the specified ID.
pub fn killpg(pgid: ProcessId, signal: SignalNumber) -> io::Result<()> {
    // SAFETY: This function cannot cause UB even if `pgid` is not a valid process ID or if
    // `signal` is not a valid signal code.
    cerr(unsafe { libc::killpg(pgid.get(), signal) }).map(|_| ())
}

/// Get a process group ID.
#[cfg(test)]
pub fn getpgid(pid: ProcessId) -> io::Result<ProcessId> {
    // SAFETY: This function cannot cause UB even if `pid` is not a valid process ID
    cerr(unsafe { libc::getpgid(pid.get()) }).map(ProcessId::new)
}

/// Set a process group ID. A `pid` or `pgid` of zero stands for the calling process.
pub fn setpgid(pid: ProcessId, pgid: ProcessId) -> io::Result<()> {
    cerr(unsafe { libc::setpgid(pid.get(), pgid.get()) }).map(|_| ())
}

/// Make `dst` refer to the same open file description as `src`.
pub fn dup2<F: AsRawFd>(src: &F, dst: RawFd) -> io::Result<()> {
    cerr(unsafe { libc::dup2(src.as_raw_fd(), dst) }).map(|_| ())
}

pub fn make_zeroed_sigaction() -> libc::sigaction {
    // SAFETY: since sigaction is a C struct, all-zeroes is a valid representation
    // We cannot use a "literal struct" initialization method since the exact representation
    // of libc::sigaction is not fixed.
    unsafe { std::mem::zeroed() }
}
