pub(crate) const USAGE_MSG: &str = "usage: tsh [-hvp]";

const DESCRIPTOR: &str = "tsh - a tiny shell with job control";

const HELP_MSG: &str = "Options:
  -h, --help               display help message and exit
  -v, --verbose            print additional diagnostic information
  -p, --no-prompt          do not emit a command prompt

Built-in commands:
  quit                     terminate all jobs and exit
  jobs                     list the running and stopped jobs
  bg <pid|%jobid>          continue a job in the background
  fg <pid|%jobid>          continue a job in the foreground

A line ending in '&' runs in the background. '< file' and '> file' redirect
the standard input and output of a command.
";

pub(crate) fn long_help_message() -> String {
    format!("{USAGE_MSG}\n\n{DESCRIPTOR}\n\n{HELP_MSG}")
}
