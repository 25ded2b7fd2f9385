#![deny(unsafe_code)]

mod redirect;

use std::{os::unix::process::CommandExt, process::Command};

pub(crate) use redirect::Redirections;

use crate::{
    common::{CommandLine, Error},
    jobs::{JobState, JobTable},
    log::{dev_info, dev_warn},
    system::{
        _exit, close_non_stdio_fds, fork,
        interface::ProcessId,
        killpg, setpgid,
        signal::{consts::*, SignalHandler, SignalNumber, SignalSet},
        wait::{Wait, WaitOptions},
        write_stdout_raw, ForkResult,
    },
};

/// Signals that could report on or act upon a job before it is in the job table.
const LAUNCH_BLOCKED: &[SignalNumber] = &[SIGCHLD, SIGINT, SIGTSTP];

/// Run `command` as a new job in its own process group and register it in `jobs`.
///
/// `line` is the text the job is listed with. The command must not be empty and must no longer
/// contain any redirection tokens.
pub(crate) fn launch(
    jobs: &mut JobTable,
    command: &CommandLine,
    redirections: &Redirections,
    line: &str,
) -> Result<ProcessId, Error> {
    debug_assert!(!command.is_empty());

    let state = if command.background {
        JobState::Background
    } else {
        JobState::Foreground
    };

    // Refuse before forking, a child that cannot be tracked must not exist.
    if jobs.is_full() {
        return Err(Error::TooManyJobs);
    }
    if state == JobState::Foreground {
        if let Some(pid) = jobs.foreground_pid() {
            return Err(Error::ForegroundBusy(pid));
        }
    }

    let original_set = SignalSet::with(LAUNCH_BLOCKED)
        .and_then(|set| set.block())
        .map_err(Error::SignalSetup)?;

    let ForkResult::Parent(pid) = fork().map_err(|err| {
        dev_warn!("unable to fork command process: {err}");
        if let Err(err) = original_set.set_mask() {
            dev_warn!("cannot restore signal mask: {err}");
        }
        Error::Fork(err)
    })?
    else {
        exec_child(command, redirections, &original_set)
    };

    // Both sides set the process group so it is in place whichever runs first. Once the child
    // has called `exec` this fails with `EACCES`, but by then the child did it itself.
    if let Err(err) = setpgid(pid, pid) {
        dev_info!("cannot move {pid} to its own process group: {err}");
    }

    let registered = jobs.add(pid, state, line);

    original_set.set_mask().map_err(Error::SignalSetup)?;

    match registered {
        Ok(jid) => {
            dev_info!("launched job [{jid}] with pid {pid}");
            Ok(pid)
        }
        Err(err) => {
            // Only reachable if the checks above are out of sync with the table.
            killpg(pid, SIGKILL).ok();
            pid.wait(WaitOptions::new()).ok();
            Err(err)
        }
    }
}

/// The child side of [`launch`]. Never returns to shell logic.
fn exec_child(command: &CommandLine, redirections: &Redirections, original_set: &SignalSet) -> ! {
    if let Err(err) = setpgid(ProcessId::new(0), ProcessId::new(0)) {
        dev_warn!("cannot create process group: {err}");
    }

    if let Err(err) = close_non_stdio_fds() {
        dev_warn!("cannot close file descriptors: {err}");
    }

    // The shell ignores these, the job must not inherit that.
    for signal in [SIGTTIN, SIGTTOU] {
        if let Err(err) = SignalHandler::reset_to_default(signal) {
            dev_warn!("cannot reset signal action: {err}");
        }
    }

    let program = &command.argv[0];
    let mut process = Command::new(program);
    process.args(&command.argv[1..]);

    if !redirections.is_empty() {
        if let Err(err) = redirections.apply(&mut process) {
            write_stdout_raw(format!("{err}\n").as_bytes()).ok();
            _exit(1);
        }
    }

    if let Err(err) = original_set.set_mask() {
        dev_warn!("cannot restore signal mask: {err}");
    }

    let err = process.exec();

    dev_warn!("failed to execute {program}: {err}");
    let message = format!("{}\n", Error::CommandNotFound(program.clone()));
    write_stdout_raw(message.as_bytes()).ok();

    _exit(1)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::{launch, Redirections};
    use crate::{
        common::{CommandLine, Error},
        jobs::{JobState, JobTable, MAX_JOBS},
        system::{
            getpgid,
            interface::ProcessId,
            killpg,
            signal::consts::SIGKILL,
            wait::{ChildState, Wait, WaitOptions},
        },
    };

    fn run(jobs: &mut JobTable, line: &str) -> Result<ProcessId, Error> {
        let mut command = CommandLine::parse(line);
        let redirections = Redirections::extract(&mut command.argv)?;
        launch(jobs, &command, &redirections, line)
    }

    #[test]
    fn background_job_gets_own_process_group() {
        let mut jobs = JobTable::new();
        let pid = run(&mut jobs, "sleep 10 &").unwrap();

        let job = jobs.get(pid).unwrap();
        assert_eq!(job.state(), JobState::Background);
        assert_eq!(job.jid().get(), 1);
        assert_eq!(job.command_line(), "sleep 10 &");
        assert_eq!(getpgid(pid).unwrap(), pid);

        killpg(pid, SIGKILL).unwrap();
        assert_eq!(
            pid.wait(WaitOptions::new()).unwrap(),
            ChildState::Killed(SIGKILL)
        );
    }

    #[test]
    fn foreground_job_is_registered() {
        let mut jobs = JobTable::new();
        let pid = run(&mut jobs, "sleep 0").unwrap();

        assert_eq!(jobs.foreground_pid(), Some(pid));

        assert_eq!(pid.wait(WaitOptions::new()).unwrap(), ChildState::Exited(0));
    }

    #[test]
    fn second_foreground_job_is_refused() {
        let mut jobs = JobTable::new();
        jobs.add(ProcessId::new(i32::MAX), JobState::Foreground, "fake").unwrap();

        let err = run(&mut jobs, "sleep 0").unwrap_err();
        assert!(matches!(err, Error::ForegroundBusy(_)));
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn unknown_program_exits_with_failure() {
        let mut jobs = JobTable::new();
        let pid = run(&mut jobs, "./no-such-program-for-tsh &").unwrap();

        assert_eq!(pid.wait(WaitOptions::new()).unwrap(), ChildState::Exited(1));
    }

    #[test]
    fn full_table_launches_nothing() {
        let mut jobs = JobTable::new();
        for n in 0..MAX_JOBS as i32 {
            jobs.add(ProcessId::new(i32::MAX - n), JobState::Background, "fake")
                .unwrap();
        }

        let err = run(&mut jobs, "sleep 0 &").unwrap_err();
        assert!(matches!(err, Error::TooManyJobs));
        assert_eq!(jobs.len(), MAX_JOBS);
    }

    #[test]
    fn output_is_redirected() {
        let path = std::env::temp_dir().join(format!("tsh-exec-{}", std::process::id()));
        let line = format!("sh -c 'echo redirected' > {}", path.display());

        let mut jobs = JobTable::new();
        let pid = run(&mut jobs, &line).unwrap();
        assert_eq!(pid.wait(WaitOptions::new()).unwrap(), ChildState::Exited(0));

        assert_eq!(fs::read_to_string(&path).unwrap(), "redirected\n");
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn unopenable_input_exits_with_failure() {
        let mut jobs = JobTable::new();
        let pid = run(&mut jobs, "cat < /no/such/dir/input").unwrap();

        assert_eq!(pid.wait(WaitOptions::new()).unwrap(), ChildState::Exited(1));
    }
}
