use crate::system::interface::ProcessId;

use super::SignalNumber;

/// Information related to the arrival of a signal.
#[derive(Debug)]
#[repr(transparent)]
pub(crate) struct SignalInfo {
    info: libc::siginfo_t,
}

impl SignalInfo {
    pub(super) const SIZE: usize = std::mem::size_of::<Self>();

    /// Returns whether the signal was sent by the user or not.
    pub(crate) fn is_user_signaled(&self) -> bool {
        // `SI_USER` is not exported by libc for every target, every user-originated code is
        // non-positive.
        self.info.si_code <= 0
    }

    /// Gets the PID that sent the signal.
    pub(crate) fn pid(&self) -> ProcessId {
        // SAFETY: `si_pid` is part of every `siginfo_t` layout on the supported targets, for
        // signals that do not set it the value is zero.
        unsafe { ProcessId::new(self.info.si_pid()) }
    }

    /// Information as if `signal` was sent by the kernel.
    #[cfg(test)]
    pub(crate) fn from_signal(signal: SignalNumber) -> Self {
        // SAFETY: `siginfo_t` is a C struct, all-zeroes is a valid representation.
        let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
        info.si_signo = signal;
        info.si_code = 0x80;
        Self { info }
    }

    /// The raw bytes, as the OS-level handler queues them.
    #[cfg(test)]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        // SAFETY: `siginfo_t` is a plain C struct of `SIZE` bytes.
        unsafe { std::slice::from_raw_parts((self as *const Self).cast::<u8>(), Self::SIZE) }
    }

    /// Gets the signal number.
    pub(crate) fn signal(&self) -> SignalNumber {
        self.info.si_signo
    }
}
