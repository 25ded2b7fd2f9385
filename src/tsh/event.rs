use std::{collections::BTreeMap, io, os::fd::AsRawFd};

use crate::system::poll::{PollEvent, PollSet};

pub(super) trait Process: Sized {
    /// IO Events that this process should handle.
    type Event: Copy + Eq;
    /// Reason why the event loop should exit.
    ///
    /// See [`EventRegistry::set_exit`] for more information.
    type Exit;
    /// Handle the corresponding event.
    fn on_event(&mut self, event: Self::Event, registry: &mut EventRegistry<Self>);
}

#[derive(PartialEq, Eq, Hash, Ord, PartialOrd, Clone, Copy)]
struct EventId(usize);

/// A type able to register file descriptors to be polled.
pub(super) struct EventRegistry<T: Process> {
    seed: usize,
    poll_set: PollSet<EventId>,
    events: BTreeMap<EventId, T::Event>,
    exit: Option<T::Exit>,
}

impl<T: Process> EventRegistry<T> {
    /// Create a new and empty registry.
    pub(super) fn new() -> Self {
        Self {
            seed: 0,
            poll_set: PollSet::new(),
            events: BTreeMap::new(),
            exit: None,
        }
    }

    fn next_id(&mut self) -> EventId {
        let id = EventId(self.seed);
        self.seed += 1;
        id
    }

    /// Set the `fd` descriptor to be polled for read events and dispatch `event` when `fd` is
    /// ready.
    pub(super) fn register_read_event<F: AsRawFd>(&mut self, fd: &F, event: T::Event) {
        let id = self.next_id();
        self.poll_set.add_fd(id, fd, PollEvent::Readable);
        self.events.insert(id, event);
    }

    /// Stop the event loop as soon as the current callback is done and set a reason for it.
    pub(super) fn set_exit(&mut self, reason: T::Exit) {
        self.exit = Some(reason);
    }

    /// Run the event loop for this handler.
    ///
    /// The event loop will continue indefinitely unless you call [`EventRegistry::set_exit`].
    /// Interrupted polls are retried, any other polling error ends the loop.
    pub(super) fn event_loop(&mut self, process: &mut T) -> io::Result<T::Exit> {
        let mut event_queue = Vec::with_capacity(self.events.len());

        loop {
            let ids = match self.poll_set.poll(None) {
                Ok(ids) => ids,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };

            for id in ids {
                event_queue.push(self.events[&id]);
            }

            for event in event_queue.drain(..) {
                process.on_event(event, self);

                if let Some(reason) = self.exit.take() {
                    return Ok(reason);
                }
            }
        }
    }
}
