use std::io;

use crate::log::dev_warn;

use super::{set::SignalAction, signal_name, SignalNumber};

/// What happens when a signal arrives.
pub(crate) enum SignalHandlerBehavior {
    /// The action the OS takes for a process that never touched the signal.
    Default,
    Ignore,
    /// Queue the signal into the [`super::SignalStream`] for the main flow.
    Stream,
}

/// A signal action installed by the shell.
///
/// Dropping it puts back whatever action was in place before.
pub(crate) struct SignalHandler {
    signal: SignalNumber,
    previous: SignalAction,
}

impl SignalHandler {
    /// Install `behavior` for `signal`. Fails for `SIGKILL` and `SIGSTOP`.
    pub(crate) fn register(
        signal: SignalNumber,
        behavior: SignalHandlerBehavior,
    ) -> io::Result<Self> {
        let previous = SignalAction::new(behavior)?.register(signal)?;
        Ok(Self { signal, previous })
    }

    /// Put `signal` back to its default action for good.
    ///
    /// Used by a job between `fork` and `exec`, where nothing is left to restore afterwards.
    pub(crate) fn reset_to_default(signal: SignalNumber) -> io::Result<()> {
        SignalAction::new(SignalHandlerBehavior::Default)?
            .register(signal)
            .map(drop)
    }
}

impl Drop for SignalHandler {
    fn drop(&mut self) {
        if let Err(err) = self.previous.register(self.signal) {
            let name = signal_name(self.signal).unwrap_or("unknown signal");
            dev_warn!("cannot restore the action for {name}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SignalHandler, SignalHandlerBehavior};
    use crate::system::signal::consts::{SIGKILL, SIGSTOP};

    #[test]
    fn uncatchable_signals_are_refused() {
        for signal in [SIGKILL, SIGSTOP] {
            let err = SignalHandler::register(signal, SignalHandlerBehavior::Ignore)
                .err()
                .unwrap();
            assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
        }
    }
}
