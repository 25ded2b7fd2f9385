use std::{
    fs::{File, OpenOptions},
    os::unix::fs::OpenOptionsExt,
    path::PathBuf,
    process::Command,
};

use crate::common::Error;

/// Permissions of a file created by `>`, before the umask is applied.
const OUTPUT_MODE: u32 = 0o666;

/// The standard streams of a command that are bound to files.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Redirections {
    stdin: Option<PathBuf>,
    stdout: Option<PathBuf>,
}

impl Redirections {
    /// Take the `<`/`>` tokens and the file names following them out of `argv`.
    ///
    /// When a stream is redirected more than once the last file wins.
    pub(crate) fn extract(argv: &mut Vec<String>) -> Result<Self, Error> {
        let mut redirections = Self::default();

        let mut i = 0;
        while i < argv.len() {
            let (token, target) = match argv[i].as_str() {
                "<" => ("<", &mut redirections.stdin),
                ">" => (">", &mut redirections.stdout),
                _ => {
                    i += 1;
                    continue;
                }
            };

            let path = argv
                .get(i + 1)
                .ok_or(Error::MissingRedirectTarget(token))?;
            *target = Some(PathBuf::from(path));
            argv.drain(i..i + 2);
        }

        Ok(redirections)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.stdin.is_none() && self.stdout.is_none()
    }

    /// Open the redirection files and bind them to the standard streams of `command`.
    pub(crate) fn apply(&self, command: &mut Command) -> Result<(), Error> {
        if let Some(path) = &self.stdin {
            let file = File::open(path).map_err(|err| Error::Io(Some(path.clone()), err))?;
            command.stdin(file);
        }

        if let Some(path) = &self.stdout {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(OUTPUT_MODE)
                .open(path)
                .map_err(|err| Error::Io(Some(path.clone()), err))?;
            command.stdout(file);
        }

        Ok(())
    }
}
