/// A tokenized line of input.
#[derive(Debug, Default)]
#[cfg_attr(test, derive(PartialEq))]
pub struct CommandLine {
    pub(crate) argv: Vec<String>,
    pub(crate) background: bool,
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

impl CommandLine {
    /// Split `line` into arguments.
    ///
    /// Arguments are separated by blanks. An argument that starts with a single quote runs up to
    /// the next single quote (or the end of the line) and may contain blanks. When the last
    /// argument starts with `&` the job is meant to run in the background and the argument is
    /// dropped.
    pub fn parse(line: &str) -> Self {
        let mut argv = Vec::new();
        let mut rest = line.trim_end_matches(['\n', '\r']);

        loop {
            rest = rest.trim_start_matches(is_blank);
            if rest.is_empty() {
                break;
            }

            let (arg, tail) = if let Some(quoted) = rest.strip_prefix('\'') {
                quoted.split_once('\'').unwrap_or((quoted, ""))
            } else {
                rest.split_once(is_blank).unwrap_or((rest, ""))
            };

            argv.push(arg.to_string());
            rest = tail;
        }

        let background = argv.last().is_some_and(|arg| arg.starts_with('&'));
        if background {
            argv.pop();
        }

        Self { argv, background }
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}
