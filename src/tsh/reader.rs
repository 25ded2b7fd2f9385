use std::{
    io::{self, Read},
    os::fd::{AsRawFd, RawFd},
};

/// Bytes read at once when the input is ready.
const CHUNK_SIZE: usize = 8192;

/// Splits the bytes of a non-blocking friendly reader into lines.
///
/// Every call to [`LineReader::read_lines`] performs a single `read`, so it never blocks once
/// the descriptor was reported readable.
pub(crate) struct LineReader<R> {
    input: R,
    pending: Vec<u8>,
    eof: bool,
}

impl<R: Read> LineReader<R> {
    pub(crate) fn new(input: R) -> Self {
        Self {
            input,
            pending: Vec::new(),
            eof: false,
        }
    }

    /// Read once and return the lines completed by it, each with its trailing newline.
    ///
    /// At end of input a last line without newline is returned as is.
    pub(crate) fn read_lines(&mut self) -> io::Result<Vec<String>> {
        let mut chunk = [0; CHUNK_SIZE];
        let read = loop {
            match self.input.read(&mut chunk) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                result => break result?,
            }
        };

        if read == 0 {
            self.eof = true;
            if self.pending.is_empty() {
                return Ok(Vec::new());
            }
            let rest = std::mem::take(&mut self.pending);
            return Ok(vec![String::from_utf8_lossy(&rest).into_owned()]);
        }

        self.pending.extend_from_slice(&chunk[..read]);

        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|&byte| byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }

        Ok(lines)
    }

    /// Whether the input reached its end.
    pub(crate) fn is_eof(&self) -> bool {
        self.eof
    }
}

impl<R: AsRawFd> AsRawFd for LineReader<R> {
    fn as_raw_fd(&self) -> RawFd {
        self.input.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};

    use pretty_assertions::assert_eq;

    use super::LineReader;

    /// Hands out one chunk per `read` call.
    struct Chunks(Vec<Vec<u8>>);

    impl Read for Chunks {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() {
                return Ok(0);
            }
            let chunk = self.0.remove(0);
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    fn chunks(parts: &[&str]) -> Chunks {
        Chunks(parts.iter().map(|part| part.as_bytes().to_vec()).collect())
    }

    #[test]
    fn complete_lines() {
        let mut reader = LineReader::new(chunks(&["jobs\nfg %1\n"]));
        assert_eq!(reader.read_lines().unwrap(), vec!["jobs\n", "fg %1\n"]);
        assert!(!reader.is_eof());

        assert!(reader.read_lines().unwrap().is_empty());
        assert!(reader.is_eof());
    }

    #[test]
    fn lines_split_over_reads() {
        let mut reader = LineReader::new(chunks(&["sle", "ep 1 &\njo", "bs\n"]));
        assert!(reader.read_lines().unwrap().is_empty());
        assert_eq!(reader.read_lines().unwrap(), vec!["sleep 1 &\n"]);
        assert_eq!(reader.read_lines().unwrap(), vec!["jobs\n"]);
    }

    #[test]
    fn unterminated_last_line() {
        let mut reader = LineReader::new(chunks(&["jobs\nquit"]));
        assert_eq!(reader.read_lines().unwrap(), vec!["jobs\n"]);
        assert_eq!(reader.read_lines().unwrap(), vec!["quit"]);
        assert!(reader.is_eof());
    }

    #[test]
    fn interrupted_reads_are_retried() {
        struct InterruptOnce(bool);

        impl Read for InterruptOnce {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.0 {
                    self.0 = true;
                    return Err(io::ErrorKind::Interrupted.into());
                }
                buf[..5].copy_from_slice(b"jobs\n");
                Ok(5)
            }
        }

        let mut reader = LineReader::new(InterruptOnce(false));
        assert_eq!(reader.read_lines().unwrap(), vec!["jobs\n"]);
    }
}
