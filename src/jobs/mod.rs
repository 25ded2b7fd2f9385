//! The job table: a fixed-capacity registry of the children the shell tracks.
#![forbid(unsafe_code)]
use std::{fmt, num::ParseIntError, str::FromStr};

use crate::{common::Error, log::job_info, system::interface::ProcessId};

/// Maximum number of jobs tracked at any point in time.
pub(crate) const MAX_JOBS: usize = 16;

/// Job IDs wrap back to 1 once they would exceed this value.
pub(crate) const MAX_JOB_ID: u32 = MAX_JOBS as u32;

/// The shell-visible handle of a job, `%<n>` on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u32);

impl JobId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[cfg(test)]
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(JobId::new)
    }
}

/// Jobs states and the actions that move between them:
///
/// ```text
/// Foreground -> Stopped     : ctrl-z, once the OS reports the stop
/// Stopped    -> Foreground  : fg
/// Stopped    -> Background  : bg
/// Background -> Foreground  : fg
/// ```
///
/// An empty slot in the table plays the role of the undefined state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Foreground,
    Background,
    Stopped,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobState::Foreground => "Foreground",
            JobState::Background => "Running",
            JobState::Stopped => "Stopped",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pid: ProcessId,
    jid: JobId,
    state: JobState,
    command_line: String,
}

impl Job {
    /// The process ID of the job, which is also the ID of its process group.
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn jid(&self) -> JobId {
        self.jid
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// The line as the user typed it, without the trailing newline.
    #[cfg(test)]
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// The `[<jid>] (<pid>) <command line>` form used to announce background jobs.
    pub fn announcement(&self) -> Announcement<'_> {
        Announcement(self)
    }
}

pub struct Announcement<'a>(&'a Job);

impl fmt::Display for Announcement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let job = self.0;
        write!(f, "[{}] ({}) {}", job.jid, job.pid, job.command_line)
    }
}

/// `jobs` listing form: `[<jid>] (<pid>) <state> <command line>`.
impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] ({}) {} {}",
            self.jid, self.pid, self.state, self.command_line
        )
    }
}

pub struct JobTable {
    slots: [Option<Job>; MAX_JOBS],
    next_jid: u32,
    max_jid: u32,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self::with_max_job_id(MAX_JOB_ID)
    }

    /// Create a table whose job IDs wrap after `max_jid`.
    ///
    /// # Panics
    ///
    /// If `max_jid` is smaller than the capacity, as a full table could then hold every ID.
    pub fn with_max_job_id(max_jid: u32) -> Self {
        assert!(
            max_jid as usize >= MAX_JOBS,
            "job IDs must not wrap before the table is full"
        );

        Self {
            slots: Default::default(),
            next_jid: 1,
            max_jid,
        }
    }

    fn wrap(&self, jid: u32) -> u32 {
        if jid > self.max_jid {
            1
        } else {
            jid
        }
    }

    /// Register a freshly launched child and return the job ID assigned to it.
    pub fn add(
        &mut self,
        pid: ProcessId,
        state: JobState,
        command_line: &str,
    ) -> Result<JobId, Error> {
        debug_assert!(pid.is_valid(), "cannot track process {pid}");

        if state == JobState::Foreground {
            if let Some(current) = self.foreground_pid() {
                return Err(Error::ForegroundBusy(current));
            }
        }

        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(Error::TooManyJobs)?;

        // there is a free slot, so at most `MAX_JOBS - 1` IDs are taken and this terminates
        let mut jid = self.next_jid;
        while self.by_jid(JobId(jid)).is_some() {
            jid = self.wrap(jid + 1);
        }
        self.next_jid = self.wrap(jid + 1);

        self.slots[slot] = Some(Job {
            pid,
            jid: JobId(jid),
            state,
            command_line: command_line.trim_end_matches('\n').to_string(),
        });
        job_info!("Added job [{jid}] {pid} {}", command_line.trim_end_matches('\n'));

        Ok(JobId(jid))
    }

    /// Forget the job of `pid`. Returns whether there was such a job.
    pub fn remove(&mut self, pid: ProcessId) -> bool {
        let Some(slot) = self
            .slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|job| job.pid == pid))
        else {
            return false;
        };

        if let Some(job) = slot.take() {
            job_info!("Deleted job [{}] {pid}", job.jid);
        }
        self.next_jid = self.wrap(self.max_job_id() + 1);

        true
    }

    pub fn get(&self, pid: ProcessId) -> Option<&Job> {
        self.iter().find(|job| job.pid == pid)
    }

    pub fn by_jid(&self, jid: JobId) -> Option<&Job> {
        self.iter().find(|job| job.jid == jid)
    }

    /// Move the job of `pid` to `state`.
    ///
    /// Fails if the job would become a second foreground job, or if there is no such job.
    pub fn set_state(&mut self, pid: ProcessId, state: JobState) -> Result<(), Error> {
        if state == JobState::Foreground {
            if let Some(current) = self.foreground_pid().filter(|&current| current != pid) {
                return Err(Error::ForegroundBusy(current));
            }
        }

        let job = self
            .slots
            .iter_mut()
            .flatten()
            .find(|job| job.pid == pid)
            .ok_or(Error::NoSuchProcess(pid))?;
        job.state = state;
        job_info!("Job [{}] {pid} is now {state}", job.jid);

        Ok(())
    }

    /// The process ID of the foreground job, if any.
    pub fn foreground_pid(&self) -> Option<ProcessId> {
        self.iter()
            .find(|job| job.state == JobState::Foreground)
            .map(Job::pid)
    }

    /// The largest job ID in use, `0` for an empty table.
    pub fn max_job_id(&self) -> u32 {
        self.iter().map(|job| job.jid.0).max().unwrap_or(0)
    }

    /// The process IDs of all live jobs, in slot order.
    ///
    /// Returned by value so the caller can mutate the table while going through them.
    pub fn pids(&self) -> [Option<ProcessId>; MAX_JOBS] {
        std::array::from_fn(|i| self.slots[i].as_ref().map(Job::pid))
    }

    /// Live jobs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == MAX_JOBS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pid(n: i32) -> ProcessId {
        ProcessId::new(n)
    }

    fn jids(table: &JobTable) -> Vec<u32> {
        table.iter().map(|job| job.jid().get()).collect()
    }

    #[test]
    fn add_and_lookup() {
        let mut table = JobTable::new();
        assert!(table.is_empty());

        let jid = table.add(pid(100), JobState::Background, "sleep 5 &\n").unwrap();
        assert_eq!(jid, JobId::new(1));

        let job = table.get(pid(100)).unwrap();
        assert_eq!(job.jid(), jid);
        assert_eq!(job.state(), JobState::Background);
        assert_eq!(job.command_line(), "sleep 5 &");
        assert_eq!(table.by_jid(jid), Some(job));

        assert_eq!(table.get(pid(101)), None);
        assert_eq!(table.by_jid(JobId::new(2)), None);
        assert_eq!(table.foreground_pid(), None);
        assert_eq!(table.max_job_id(), 1);
    }

    #[test]
    fn display_forms() {
        let mut table = JobTable::new();
        table.add(pid(100), JobState::Background, "sleep 5 &").unwrap();
        table.add(pid(200), JobState::Stopped, "sleep 6").unwrap();
        table.add(pid(300), JobState::Foreground, "sleep 7").unwrap();

        let listing: Vec<String> = table.iter().map(ToString::to_string).collect();
        assert_eq!(
            listing,
            vec![
                "[1] (100) Running sleep 5 &",
                "[2] (200) Stopped sleep 6",
                "[3] (300) Foreground sleep 7",
            ]
        );

        let job = table.get(pid(100)).unwrap();
        assert_eq!(job.announcement().to_string(), "[1] (100) sleep 5 &");
    }

    #[test]
    fn job_ids_increase() {
        let mut table = JobTable::new();
        for n in 1..=5 {
            let jid = table.add(pid(n), JobState::Background, "x").unwrap();
            assert_eq!(jid.get(), n as u32);
        }
        assert_eq!(jids(&table), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn remove_recomputes_next_job_id() {
        let mut table = JobTable::new();
        table.add(pid(1), JobState::Background, "a").unwrap();
        table.add(pid(2), JobState::Background, "b").unwrap();
        table.add(pid(3), JobState::Background, "c").unwrap();

        assert!(table.remove(pid(3)));
        assert!(!table.remove(pid(3)));
        assert_eq!(table.get(pid(3)), None);

        // 3 was the largest, so it is handed out again
        assert_eq!(table.add(pid(4), JobState::Background, "d").unwrap().get(), 3);

        // removing from the middle keeps the IDs going up
        assert!(table.remove(pid(2)));
        assert_eq!(table.add(pid(5), JobState::Background, "e").unwrap().get(), 4);

        // an empty table starts over
        for n in [1, 4, 5] {
            assert!(table.remove(pid(n)));
        }
        assert!(table.is_empty());
        assert_eq!(table.add(pid(6), JobState::Background, "f").unwrap().get(), 1);
    }

    #[test]
    fn full_table_is_reported() {
        let mut table = JobTable::new();
        for n in 1..=MAX_JOBS as i32 {
            table.add(pid(n), JobState::Background, "x").unwrap();
        }
        assert!(table.is_full());

        let err = table.add(pid(99), JobState::Background, "x").unwrap_err();
        assert!(matches!(err, Error::TooManyJobs));
        assert_eq!(table.get(pid(99)), None);
        assert_eq!(table.len(), MAX_JOBS);
    }

    #[test]
    fn wrapped_ids_skip_live_jobs() {
        let mut table = JobTable::new();
        for n in 1..=MAX_JOBS as i32 {
            table.add(pid(n), JobState::Background, "x").unwrap();
        }

        // free the slot of job 5; the largest ID (16) is still live so the next ID wraps
        assert!(table.remove(pid(5)));
        let jid = table.add(pid(100), JobState::Background, "x").unwrap();
        assert_eq!(jid.get(), 5);

        let mut seen = jids(&table);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), MAX_JOBS);
    }

    #[test]
    fn single_foreground_job() {
        let mut table = JobTable::new();
        table.add(pid(1), JobState::Foreground, "a").unwrap();
        table.add(pid(2), JobState::Stopped, "b").unwrap();

        assert!(matches!(
            table.add(pid(3), JobState::Foreground, "c"),
            Err(Error::ForegroundBusy(p)) if p == pid(1)
        ));
        assert!(matches!(
            table.set_state(pid(2), JobState::Foreground),
            Err(Error::ForegroundBusy(_))
        ));
        assert_eq!(table.foreground_pid(), Some(pid(1)));

        // re-asserting the current foreground job is fine
        table.set_state(pid(1), JobState::Foreground).unwrap();

        table.set_state(pid(1), JobState::Stopped).unwrap();
        assert_eq!(table.foreground_pid(), None);
        table.set_state(pid(2), JobState::Foreground).unwrap();
        assert_eq!(table.foreground_pid(), Some(pid(2)));

        let foreground = table
            .iter()
            .filter(|job| job.state() == JobState::Foreground)
            .count();
        assert_eq!(foreground, 1);
    }

    #[test]
    fn set_state_of_unknown_job() {
        let mut table = JobTable::new();
        assert!(matches!(
            table.set_state(pid(7), JobState::Stopped),
            Err(Error::NoSuchProcess(p)) if p == pid(7)
        ));
    }

    #[test]
    fn pids_snapshot() {
        let mut table = JobTable::new();
        table.add(pid(10), JobState::Background, "a").unwrap();
        table.add(pid(20), JobState::Background, "b").unwrap();
        table.remove(pid(10));

        let pids: Vec<ProcessId> = table.pids().into_iter().flatten().collect();
        assert_eq!(pids, vec![pid(20)]);
    }

    #[test]
    #[should_panic(expected = "job IDs must not wrap before the table is full")]
    fn max_job_id_below_capacity() {
        let _ = JobTable::with_max_job_id(MAX_JOBS as u32 - 1);
    }
}
