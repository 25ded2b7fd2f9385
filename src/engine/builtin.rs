use crate::{common::Error, jobs::JobId, system::interface::ProcessId};

/// Commands the shell runs itself, without forking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Quit,
    Jobs,
    Foreground,
    Background,
}

impl Builtin {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "quit" => Some(Builtin::Quit),
            "jobs" => Some(Builtin::Jobs),
            "fg" => Some(Builtin::Foreground),
            "bg" => Some(Builtin::Background),
            _ => None,
        }
    }

    pub(crate) const fn name(self) -> &'static str {
        match self {
            Builtin::Quit => "quit",
            Builtin::Jobs => "jobs",
            Builtin::Foreground => "fg",
            Builtin::Background => "bg",
        }
    }
}

/// The argument of `fg` and `bg`: a PID, or a job ID prefixed by `%`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum JobRef {
    Job(JobId),
    Process(ProcessId),
}

impl JobRef {
    pub(crate) fn parse(builtin: Builtin, arg: Option<&str>) -> Result<Self, Error> {
        let arg = arg.ok_or(Error::MissingJobArgument(builtin.name()))?;

        if let Some(jid) = arg.strip_prefix('%') {
            // anything after `%` that is not a number cannot name a job either
            jid.parse()
                .map(JobRef::Job)
                .map_err(|_| Error::NoSuchJob(arg.to_string()))
        } else if arg.starts_with(|c: char| c.is_ascii_digit()) {
            arg.parse()
                .map(JobRef::Process)
                .map_err(|_| Error::InvalidJobArgument(builtin.name()))
        } else {
            Err(Error::InvalidJobArgument(builtin.name()))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Builtin, JobRef};
    use crate::{common::Error, jobs::JobId, system::interface::ProcessId};

    #[test]
    fn builtin_names() {
        for builtin in [
            Builtin::Quit,
            Builtin::Jobs,
            Builtin::Foreground,
            Builtin::Background,
        ] {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::from_name("exit"), None);
        assert_eq!(Builtin::from_name("/bin/jobs"), None);
    }

    #[test]
    fn job_and_process_references() {
        assert_eq!(
            JobRef::parse(Builtin::Foreground, Some("%2")).unwrap(),
            JobRef::Job(JobId::new(2))
        );
        assert_eq!(
            JobRef::parse(Builtin::Background, Some("4242")).unwrap(),
            JobRef::Process(ProcessId::new(4242))
        );
    }

    #[test]
    fn bad_references() {
        let message = |arg| {
            JobRef::parse(Builtin::Foreground, arg)
                .unwrap_err()
                .to_string()
        };

        assert_eq!(message(None), "fg command requires PID or %jobid argument");
        assert_eq!(message(Some("%x")), "%x: No such job");
        assert_eq!(message(Some("abc")), "fg: argument must be a PID or %jobid");
        assert_eq!(message(Some("-3")), "fg: argument must be a PID or %jobid");
        assert_eq!(message(Some("12a")), "fg: argument must be a PID or %jobid");

        assert!(matches!(
            JobRef::parse(Builtin::Background, None),
            Err(Error::MissingJobArgument("bg"))
        ));
    }
}
