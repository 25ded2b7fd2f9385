use crate::{cutils::cerr, system::make_zeroed_sigaction};

use super::{handler::SignalHandlerBehavior, SignalNumber};

use std::{io, mem::MaybeUninit};

#[repr(transparent)]
pub(super) struct SignalAction {
    raw: libc::sigaction,
}

impl SignalAction {
    pub(super) fn new(behavior: SignalHandlerBehavior) -> io::Result<Self> {
        // Interrupted reads of the prompt loop are resumed instead of failing with `EINTR`.
        let mut sa_flags = libc::SA_RESTART;

        // Streaming needs a full `sa_mask` so `send_siginfo` cannot be interrupted by another
        // signal half-way through writing the information.
        let (sa_sigaction, sa_mask) = match behavior {
            SignalHandlerBehavior::Default => (libc::SIG_DFL, SignalSet::empty()?),
            SignalHandlerBehavior::Ignore => (libc::SIG_IGN, SignalSet::empty()?),
            SignalHandlerBehavior::Stream => {
                // Specify that we want to pass a signal-catching function in `sa_sigaction`.
                sa_flags |= libc::SA_SIGINFO;
                (
                    super::stream::send_siginfo as libc::sighandler_t,
                    SignalSet::full()?,
                )
            }
        };

        let mut raw: libc::sigaction = make_zeroed_sigaction();
        raw.sa_sigaction = sa_sigaction;
        raw.sa_mask = sa_mask.raw;
        raw.sa_flags = sa_flags;

        Ok(Self { raw })
    }

    pub(super) fn register(&self, signal: SignalNumber) -> io::Result<Self> {
        let mut original_action = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigaction(signal, &self.raw, original_action.as_mut_ptr().cast()) })?;

        Ok(unsafe { original_action.assume_init() })
    }
}

/// A signal set that can be used to mask signals.
#[repr(transparent)]
pub(crate) struct SignalSet {
    raw: libc::sigset_t,
}

impl SignalSet {
    /// Create an empty set.
    pub(crate) fn empty() -> io::Result<Self> {
        let mut set = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigemptyset(set.as_mut_ptr().cast()) })?;

        Ok(unsafe { set.assume_init() })
    }

    /// Create a set containing all the signals.
    pub(crate) fn full() -> io::Result<Self> {
        let mut set = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigfillset(set.as_mut_ptr().cast()) })?;

        Ok(unsafe { set.assume_init() })
    }

    /// Create a set containing exactly the given signals.
    pub(crate) fn with(signals: &[SignalNumber]) -> io::Result<Self> {
        let mut set = Self::empty()?;

        for &signal in signals {
            cerr(unsafe { libc::sigaddset(&mut set.raw, signal) })?;
        }

        Ok(set)
    }

    /// Return whether `signal` is a member of this set.
    #[cfg(test)]
    pub(crate) fn contains(&self, signal: SignalNumber) -> io::Result<bool> {
        cerr(unsafe { libc::sigismember(&self.raw, signal) }).map(|member| member == 1)
    }

    fn sigprocmask(&self, how: libc::c_int) -> io::Result<Self> {
        let mut original_set = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigprocmask(how, &self.raw, original_set.as_mut_ptr().cast()) })?;

        Ok(unsafe { original_set.assume_init() })
    }

    /// Block all the signals in this set and return the previous set of blocked signals.
    ///
    /// After calling this function successfully, the set of blocked signals will be the union of
    /// the previous set of blocked signals and this set.
    pub(crate) fn block(&self) -> io::Result<Self> {
        self.sigprocmask(libc::SIG_BLOCK)
    }

    /// Block only the signals that are in this set and return the previous set of blocked signals.
    ///
    /// After calling this function successfully, the set of blocked signals will be the exactly
    /// this set.
    pub(crate) fn set_mask(&self) -> io::Result<Self> {
        self.sigprocmask(libc::SIG_SETMASK)
    }
}

#[cfg(test)]
mod tests {
    use super::SignalSet;
    use crate::system::signal::consts::*;

    #[test]
    fn membership() {
        let set = SignalSet::with(&[SIGCHLD, SIGINT]).unwrap();
        assert!(set.contains(SIGCHLD).unwrap());
        assert!(set.contains(SIGINT).unwrap());
        assert!(!set.contains(SIGTSTP).unwrap());

        assert!(!SignalSet::empty().unwrap().contains(SIGINT).unwrap());
        assert!(SignalSet::full().unwrap().contains(SIGTSTP).unwrap());
    }

    #[test]
    fn block_and_restore() {
        // The signal mask is per thread, so this does not interfere with other tests.
        let original = SignalSet::with(&[SIGTSTP]).unwrap().block().unwrap();
        let blocked = SignalSet::empty().unwrap().block().unwrap();
        assert!(blocked.contains(SIGTSTP).unwrap());

        original.set_mask().unwrap();
        let restored = SignalSet::empty().unwrap().block().unwrap();
        assert_eq!(
            restored.contains(SIGTSTP).unwrap(),
            original.contains(SIGTSTP).unwrap()
        );
    }
}
