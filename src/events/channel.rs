//! Crossbeam-backed event channel.
//!
//! Scans and transfers report through an [`EventSender`]; whoever renders
//! progress holds the matching [`EventReceiver`].

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

use super::Event;

/// Default capacity of a bounded channel created by [`EventChannel::default_bounded`].
pub const DEFAULT_CAPACITY: usize = 256;

/// Producer half, cloned into every worker that reports progress.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Wrap an existing crossbeam sender
    pub fn new(sender: Sender<Event>) -> Self {
        Self { inner: sender }
    }

    /// Send an event.
    ///
    /// Intermediate events are dropped when a bounded channel is full, so a
    /// slow observer never stalls a run. Terminal events block until there is
    /// room. If the receiver is dropped the event is silently discarded.
    pub fn send(&self, event: Event) {
        if event.is_terminal() {
            let _ = self.inner.send(event);
            return;
        }

        match self.inner.try_send(event) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => {
                tracing::trace!("event channel full, dropping intermediate event");
            }
        }
    }
}

/// Consumer half, held by the UI layer.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Next event; `None` once every sender is gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Next event if one is already queued
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Blocking iterator that ends when every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Drains the events already queued without blocking
    pub fn try_iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.try_iter()
    }
}

/// Constructors for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel; nothing is ever dropped.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Channel holding at most `capacity` events.
    ///
    /// When the observer falls behind, intermediate progress is dropped
    /// and terminal events are kept.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Bounded channel with [`DEFAULT_CAPACITY`].
    pub fn default_bounded() -> (EventSender, EventReceiver) {
        Self::bounded(DEFAULT_CAPACITY)
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        EventChannel
    }
}

/// Sender whose receiver is already gone; every event is discarded.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}
