use std::{
    io::{self, Stderr, Stdout, Write},
    sync::Mutex,
};

#[cfg(feature = "dev")]
use std::{fs::File, path::Path};

use log::Log;

/// Writes each record as one line, with `prefix` in front.
pub struct SimpleLogger<W: Write + Send> {
    target: Mutex<W>,
    prefix: &'static str,
}

impl<W: Write + Send> SimpleLogger<W> {
    fn new(target: W, prefix: &'static str) -> Self {
        Self {
            target: Mutex::new(target),
            prefix,
        }
    }
}

impl<W: Write + Send> Log for SimpleLogger<W> {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if let Ok(mut target) = self.target.lock() {
            let _ = writeln!(target, "{}{}", self.prefix, record.args());
        }
    }

    fn flush(&self) {
        if let Ok(mut target) = self.target.lock() {
            let _ = target.flush();
        }
    }
}

impl SimpleLogger<Stderr> {
    /// Messages meant for the person at the prompt.
    pub fn user(prefix: &'static str) -> Self {
        Self::new(io::stderr(), prefix)
    }
}

impl SimpleLogger<Stdout> {
    /// The `-v` job trace, on standard output so it stays in order with job reports.
    pub fn job_trace() -> Self {
        Self::new(io::stdout(), "")
    }
}

#[cfg(feature = "dev")]
impl SimpleLogger<File> {
    pub fn dev_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)?;
        Ok(Self::new(file, ""))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use log::{LevelFilter, Log};
    use pretty_assertions::assert_eq;

    use super::SimpleLogger;

    /// Records the flushes in between the lines.
    struct Transcript(Vec<u8>);

    impl Write for Transcript {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.0.extend_from_slice(b"<flushed>");
            Ok(())
        }
    }

    fn transcript(logger: &SimpleLogger<Transcript>) -> String {
        String::from_utf8(logger.target.lock().unwrap().0.clone()).unwrap()
    }

    #[test]
    fn follows_the_global_level() {
        let logger = SimpleLogger::user("tsh: ");
        let trace = log::Metadata::builder().level(log::Level::Trace).build();

        log::set_max_level(LevelFilter::Trace);
        assert!(logger.enabled(&trace));

        log::set_max_level(LevelFilter::Info);
        assert!(!logger.enabled(&trace));
    }

    #[test]
    fn one_prefixed_line_per_record() {
        let logger = SimpleLogger::new(Transcript(Vec::new()), "tsh: ");
        let record = log::Record::builder()
            .args(format_args!("Added job [1] 4242 sleep 5 &"))
            .level(log::Level::Info)
            .build();

        logger.log(&record);
        logger.log(&record);
        assert_eq!(
            transcript(&logger),
            "tsh: Added job [1] 4242 sleep 5 &\ntsh: Added job [1] 4242 sleep 5 &\n"
        );

        logger.flush();
        assert!(transcript(&logger).ends_with("&\n<flushed>"));
    }
}
