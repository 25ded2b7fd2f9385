use std::{io, io::Write, time::Duration};

use crate::{
    common::Error,
    jobs::{JobState, JobTable},
    log::{dev_info, dev_warn},
    system::{
        interface::ProcessId,
        killpg,
        poll::{PollEvent, PollSet},
        signal::{
            consts::*, signal_name, stream_signals, SignalHandler, SignalHandlerBehavior, SignalInfo,
            SignalNumber, SignalStream,
        },
        wait::{ChildState, Wait, WaitError, WaitOptions},
    },
};

/// Signals whose arrival is streamed to the main flow.
const STREAMED: [SignalNumber; 4] = [SIGCHLD, SIGINT, SIGTSTP, SIGQUIT];

/// The boundary between asynchronous signal delivery and the shell.
///
/// The OS-level handler only writes the signal information into the [`SignalStream`]. Everything
/// that touches the job table runs in the main flow once the stream is drained, so the table
/// needs no locking.
pub(crate) struct SignalRelay {
    stream: &'static SignalStream,
    _handlers: Vec<SignalHandler>,
}

impl SignalRelay {
    /// Install the handlers of an interactive shell.
    pub(crate) fn install() -> Result<Self, Error> {
        let stream = SignalStream::init().map_err(Error::SignalSetup)?;

        let mut handlers = stream_signals(&STREAMED).map_err(Error::SignalSetup)?;
        for signal in [SIGTTIN, SIGTTOU] {
            handlers.push(
                SignalHandler::register(signal, SignalHandlerBehavior::Ignore)
                    .map_err(Error::SignalSetup)?,
            );
        }

        Ok(Self {
            stream,
            _handlers: handlers,
        })
    }

    /// A relay that leaves signal dispositions alone. Its stream only carries what a test queues
    /// by hand, state changes of children are picked up by polling.
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self {
            stream: SignalStream::detached().expect("cannot create signal stream"),
            _handlers: Vec::new(),
        }
    }

    pub(crate) fn stream(&self) -> &'static SignalStream {
        self.stream
    }

    /// Wait up to `timeout` for the next signal.
    pub(crate) fn next(&self, timeout: Duration) -> io::Result<Option<SignalInfo>> {
        let mut set = PollSet::new();
        set.add_fd((), self.stream, PollEvent::Readable);

        match set.poll(Some(timeout)) {
            Ok(ready) if ready.is_empty() => Ok(None),
            Ok(_) => self.stream.recv().map(Some),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Collect the state changes of the tracked children.
///
/// Each job is asked once without blocking, so a single pass is bounded by the table capacity
/// and never collects children the shell does not track.
pub(crate) fn reap_children<W: Write>(jobs: &mut JobTable, out: &mut W) {
    for pid in jobs.pids().into_iter().flatten() {
        let state = match pid.wait(WaitOptions::new().no_hang().untraced()) {
            Ok(state) => state,
            Err(WaitError::NotReady) => continue,
            Err(WaitError::Io(err)) => {
                if err.raw_os_error() == Some(libc::ECHILD) {
                    // reaped behind our back, nothing left to report on
                    dev_warn!("{pid} is not a child of the shell anymore");
                    jobs.remove(pid);
                } else {
                    dev_warn!("cannot wait for {pid}: {err}");
                }
                continue;
            }
        };

        let Some(jid) = jobs.get(pid).map(|job| job.jid()) else {
            continue;
        };
        dev_info!("job [{jid}] {pid} {state}");

        match state {
            ChildState::Exited(_) => {}
            ChildState::Killed(signal) => {
                let _ = writeln!(out, "Job [{jid}] ({pid}) terminated by signal {signal}");
            }
            ChildState::Stopped(signal) => {
                let _ = writeln!(out, "Job [{jid}] ({pid}) stopped by signal {signal}");
            }
        }

        if state.is_final() {
            jobs.remove(pid);
        } else if let Err(err) = jobs.set_state(pid, JobState::Stopped) {
            dev_warn!("cannot mark {pid} as stopped: {err}");
        }
    }
}

/// Deliver `signal` to the whole process group of the foreground job, if there is one.
pub(crate) fn forward_to_foreground(jobs: &JobTable, signal: SignalNumber) {
    let Some(pid) = jobs.foreground_pid() else {
        dev_info!("no foreground job to send {} to", describe(signal));
        return;
    };

    if let Err(err) = killpg(pid, signal) {
        dev_warn!("cannot send {} to job {pid}: {err}", describe(signal));
    }
}

/// Log where a signal came from.
pub(crate) fn trace(info: &SignalInfo) {
    let origin = if info.is_user_signaled() {
        info.pid()
    } else {
        ProcessId::new(0)
    };
    dev_info!("received {} from {origin}", describe(info.signal()));
}

fn describe(signal: SignalNumber) -> &'static str {
    signal_name(signal).unwrap_or("unknown signal")
}
