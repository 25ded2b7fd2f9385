//! The job control engine: built-in commands, job launches and the reaction to signals.
mod builtin;
mod relay;

use std::{fmt::Display, io::Write, time::Duration};

pub(crate) use relay::SignalRelay;

use self::builtin::{Builtin, JobRef};
use crate::{
    common::{CommandLine, Error},
    exec::{self, Redirections},
    jobs::{Job, JobState, JobTable},
    log::{dev_debug, dev_info},
    system::{
        interface::ProcessId,
        killpg,
        signal::{consts::*, SignalInfo},
    },
};

/// How often the foreground wait checks on the job when no signal arrives.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What the shell should do after a command or a signal was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Continue,
    Exit(i32),
}

/// The context that owns the job table. Every mutation of the table goes through here.
pub(crate) struct JobControl<W: Write> {
    jobs: JobTable,
    relay: SignalRelay,
    out: W,
}

impl<W: Write> JobControl<W> {
    pub(crate) fn new(relay: SignalRelay, out: W) -> Self {
        Self {
            jobs: JobTable::new(),
            relay,
            out,
        }
    }

    pub(crate) fn relay(&self) -> &SignalRelay {
        &self.relay
    }

    #[cfg(test)]
    pub(crate) fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    fn emit(&mut self, line: impl Display) {
        let _ = writeln!(self.out, "{line}");
    }

    /// Evaluate one line of input.
    ///
    /// Errors that only concern this line are reported on the output and evaluation carries on,
    /// the returned error is always fatal.
    pub(crate) fn evaluate(&mut self, line: &str) -> Result<Control, Error> {
        match self.dispatch(line) {
            Err(err) if !err.is_fatal() => {
                self.emit(&err);
                Ok(Control::Continue)
            }
            result => result,
        }
    }

    fn dispatch(&mut self, line: &str) -> Result<Control, Error> {
        let command = CommandLine::parse(line);
        let Some(program) = command.program() else {
            return Ok(Control::Continue);
        };

        match Builtin::from_name(program) {
            Some(Builtin::Quit) => {
                self.terminate_all();
                Ok(Control::Exit(0))
            }
            Some(Builtin::Jobs) => {
                self.list_jobs();
                Ok(Control::Continue)
            }
            Some(builtin @ (Builtin::Foreground | Builtin::Background)) => {
                let job = JobRef::parse(builtin, command.argv.get(1).map(String::as_str))?;
                self.resume(builtin, job)
            }
            None => self.launch(command, line),
        }
    }

    fn launch(&mut self, mut command: CommandLine, line: &str) -> Result<Control, Error> {
        let redirections = Redirections::extract(&mut command.argv)?;
        if command.is_empty() {
            return Ok(Control::Continue);
        }

        let pid = exec::launch(&mut self.jobs, &command, &redirections, line)?;

        if command.background {
            self.announce(pid);
            Ok(Control::Continue)
        } else {
            self.wait_for_foreground(pid)
        }
    }

    fn announce(&mut self, pid: ProcessId) {
        if let Some(job) = self.jobs.get(pid) {
            let _ = writeln!(self.out, "{}", job.announcement());
        }
    }

    /// Print every live job with its state.
    pub(crate) fn list_jobs(&mut self) {
        for job in self.jobs.iter() {
            let _ = writeln!(self.out, "{job}");
        }
    }

    fn resolve(&self, job: JobRef) -> Result<&Job, Error> {
        match job {
            JobRef::Job(jid) => self
                .jobs
                .by_jid(jid)
                .ok_or_else(|| Error::NoSuchJob(format!("%{jid}"))),
            JobRef::Process(pid) => self.jobs.get(pid).ok_or(Error::NoSuchProcess(pid)),
        }
    }

    /// `fg` and `bg`: continue a job if it is stopped and move it to the requested state.
    fn resume(&mut self, builtin: Builtin, job: JobRef) -> Result<Control, Error> {
        let job = self.resolve(job)?;
        let (pid, state) = (job.pid(), job.state());

        let target = match builtin {
            Builtin::Foreground => JobState::Foreground,
            _ => JobState::Background,
        };

        if state == JobState::Stopped {
            killpg(pid, SIGCONT).map_err(|err| match err.raw_os_error() {
                Some(libc::ESRCH) => Error::NoSuchProcess(pid),
                _ => Error::Io(None, err),
            })?;
        }

        self.jobs.set_state(pid, target)?;
        dev_info!("{} moved {pid} from {state} to {target}", builtin.name());

        match target {
            JobState::Foreground => self.wait_for_foreground(pid),
            _ => {
                self.announce(pid);
                Ok(Control::Continue)
            }
        }
    }

    /// Block until `pid` no longer occupies the foreground, because it ended or was stopped.
    ///
    /// Signals are handled as they arrive. Without any, the job is checked on every
    /// [`POLL_INTERVAL`]. A failing signal stream is fatal: the job still holds the foreground.
    pub(crate) fn wait_for_foreground(&mut self, pid: ProcessId) -> Result<Control, Error> {
        dev_debug!("waiting for foreground job {pid}");

        while self.jobs.foreground_pid() == Some(pid) {
            match self.relay.next(POLL_INTERVAL).map_err(Error::SignalStream)? {
                Some(info) => {
                    if let Control::Exit(code) = self.on_signal(&info) {
                        return Ok(Control::Exit(code));
                    }
                }
                None => self.reap_children(),
            }
        }

        Ok(Control::Continue)
    }

    /// React to a signal that came in through the relay.
    pub(crate) fn on_signal(&mut self, info: &SignalInfo) -> Control {
        relay::trace(info);

        match info.signal() {
            SIGCHLD => self.reap_children(),
            signal @ (SIGINT | SIGTSTP) => relay::forward_to_foreground(&self.jobs, signal),
            SIGQUIT => {
                self.emit("Terminating after receipt of SIGQUIT signal");
                return Control::Exit(1);
            }
            _ => {}
        }

        Control::Continue
    }

    pub(crate) fn reap_children(&mut self) {
        relay::reap_children(&mut self.jobs, &mut self.out);
    }

    /// Ask every job to end: hang up, terminate, and continue the stopped ones so they notice.
    pub(crate) fn terminate_all(&mut self) {
        for pid in self.jobs.pids().into_iter().flatten() {
            dev_info!("terminating job {pid}");
            for signal in [SIGHUP, SIGTERM, SIGCONT] {
                killpg(pid, signal).ok();
            }
        }
    }
}
