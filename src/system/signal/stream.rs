use std::{
    io,
    mem::MaybeUninit,
    os::{
        fd::{AsRawFd, RawFd},
        unix::net::UnixStream,
    },
    sync::OnceLock,
};

use crate::{cutils::cerr, log::dev_error};

use super::{
    handler::{SignalHandler, SignalHandlerBehavior},
    info::SignalInfo,
    signal_name, SignalNumber,
};

/// The stream fed by the installed handlers.
static INSTALLED: OnceLock<SignalStream> = OnceLock::new();

/// Queue the `siginfo_t` of a caught signal for the main flow.
///
/// Runs in signal context: a single non-blocking `send` and nothing else. If the queue is full
/// the signal is dropped, a pending `SIGCHLD` already makes the next reap pass see every child.
pub(super) unsafe fn send_siginfo(
    _signal: SignalNumber,
    info: *const SignalInfo,
    _context: *const libc::c_void,
) {
    if let Some(stream) = INSTALLED.get() {
        let fd = stream.sender.as_raw_fd();
        unsafe { libc::send(fd, info.cast(), SignalInfo::SIZE, libc::MSG_DONTWAIT) };
    }
}

/// The receiving end of the signals the shell relays.
///
/// Readable whenever a signal is queued, so it can sit in a poll set next to the input.
pub(crate) struct SignalStream {
    receiver: UnixStream,
    sender: UnixStream,
}

impl SignalStream {
    fn open() -> io::Result<Self> {
        let (receiver, sender) = UnixStream::pair().map_err(|err| {
            dev_error!("cannot open the signal stream: {err}");
            err
        })?;

        Ok(Self { receiver, sender })
    }

    /// The stream the handlers write to, opened on first use.
    pub(crate) fn init() -> io::Result<&'static Self> {
        match INSTALLED.get() {
            Some(stream) => Ok(stream),
            None => {
                let stream = Self::open()?;
                Ok(INSTALLED.get_or_init(|| stream))
            }
        }
    }

    /// A stream of its own that no handler writes to.
    #[cfg(test)]
    pub(crate) fn detached() -> io::Result<&'static Self> {
        Self::open().map(|stream| &*Box::leak(Box::new(stream)))
    }

    /// The writing end, for queueing data by hand.
    #[cfg(test)]
    pub(crate) fn sender(&self) -> &UnixStream {
        &self.sender
    }

    /// Take the next queued signal off the stream.
    ///
    /// Blocks while nothing is queued, so only call this once a poll reported the stream
    /// readable. A partial record means the stream can no longer be trusted.
    pub(crate) fn recv(&self) -> io::Result<SignalInfo> {
        let mut info = MaybeUninit::<SignalInfo>::uninit();
        let fd = self.receiver.as_raw_fd();

        let received =
            cerr(unsafe { libc::recv(fd, info.as_mut_ptr().cast(), SignalInfo::SIZE, 0) })?;
        if received as usize != SignalInfo::SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("signal stream yielded {received} of {} bytes", SignalInfo::SIZE),
            ));
        }

        // SAFETY: `recv` filled all of `info` and any bit pattern is a valid `siginfo_t`.
        Ok(unsafe { info.assume_init() })
    }
}

impl AsRawFd for SignalStream {
    fn as_raw_fd(&self) -> RawFd {
        self.receiver.as_raw_fd()
    }
}

/// Route each of `signals` into the installed [`SignalStream`].
///
/// The previous actions come back once the returned handlers are dropped.
pub(crate) fn stream_signals(signals: &[SignalNumber]) -> io::Result<Vec<SignalHandler>> {
    signals
        .iter()
        .map(|&signal| {
            SignalHandler::register(signal, SignalHandlerBehavior::Stream).map_err(|err| {
                let name = signal_name(signal).unwrap_or("unknown signal");
                dev_error!("cannot stream {name}: {err}");
                err
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{io::Write, time::Duration};

    use super::SignalStream;
    use crate::system::{
        poll::{PollEvent, PollSet},
        signal::{consts::SIGCHLD, SignalInfo},
    };

    fn readable(stream: &SignalStream) -> bool {
        let mut set = PollSet::new();
        set.add_fd((), stream, PollEvent::Readable);
        !set.poll(Some(Duration::from_millis(10))).unwrap().is_empty()
    }

    #[test]
    fn init_is_idempotent() {
        let first = SignalStream::init().unwrap() as *const SignalStream;
        let second = SignalStream::init().unwrap() as *const SignalStream;
        assert_eq!(first, second);
    }

    #[test]
    fn queued_signal_is_received() {
        let stream = SignalStream::detached().unwrap();
        assert!(!readable(stream));

        let info = SignalInfo::from_signal(SIGCHLD);
        stream.sender().write_all(info.as_bytes()).unwrap();

        assert!(readable(stream));
        assert_eq!(stream.recv().unwrap().signal(), SIGCHLD);
        assert!(!readable(stream));
    }

    #[test]
    fn partial_record_is_an_error() {
        let stream = SignalStream::detached().unwrap();
        stream.sender().write_all(&[0; 3]).unwrap();

        let err = stream.recv().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
