//! Event emitter with named channels of synchronous listeners.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{EmitterError, EmitterResult};
use crate::listener::{Listener, ListenerSpec};

/// Version of the emitter crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A registered listener plus its one-shot flag.
struct ListenerRecord<A> {
    listener: Listener<A>,
    once: bool,
}

impl<A> Clone for ListenerRecord<A> {
    fn clone(&self) -> Self {
        Self {
            listener: self.listener.clone(),
            once: self.once,
        }
    }
}

/// Publish/subscribe dispatcher keyed by event name.
///
/// Each event name owns a channel: an ordered list of listeners. Delivery
/// follows registration order. A given [`Listener`] appears at most once per
/// channel.
///
/// The emitter is single-threaded. All methods take `&self`, so listeners
/// can register, unregister, or emit re-entrantly through the emitter they
/// are handed. `emit` iterates over a snapshot of the channel, so such
/// changes apply from the next `emit` call onwards.
///
/// `A` is the argument type forwarded to listeners. It defaults to
/// [`serde_json::Value`] for heterogeneous payloads.
pub struct EventEmitter<A = Value> {
    channels: RefCell<HashMap<String, Vec<ListenerRecord<A>>>>,
}

impl<A: 'static> EventEmitter<A> {
    /// Version of the emitter crate.
    pub const VERSION: &'static str = VERSION;

    /// Create an emitter with no channels.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: RefCell::new(HashMap::new()),
        }
    }

    /// Register a persistent listener for `event_name`.
    ///
    /// `listener` may be a [`Listener`], a [`ListenerSpec`] (including a
    /// tagged one-shot spec), an `Option<Listener>`, or a `Box<dyn Any>`
    /// holding one of these.
    ///
    /// Does nothing when `event_name` is empty, when the spec is empty, or
    /// when the same listener is already registered for `event_name`.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidListener`] if the spec does not
    /// resolve to a callable. No channel is modified in that case.
    pub fn on(
        &self,
        event_name: &str,
        listener: impl Into<ListenerSpec<A>>,
    ) -> EmitterResult<&Self> {
        if event_name.is_empty() {
            trace!("Ignoring registration without event name");
            return Ok(self);
        }

        let Some((listener, once)) = listener.into().resolve()? else {
            trace!(event = event_name, "Ignoring empty listener");
            return Ok(self);
        };

        let mut channels = self.channels.borrow_mut();
        let channel = channels.entry(event_name.to_string()).or_default();

        if channel.iter().any(|record| record.listener == listener) {
            trace!(
                event = event_name,
                listener_id = %listener.id(),
                "Listener already registered"
            );
            return Ok(self);
        }

        debug!(
            event = event_name,
            listener_id = %listener.id(),
            once,
            "Listener registered"
        );
        channel.push(ListenerRecord { listener, once });

        Ok(self)
    }

    /// Register a listener that is removed after its first invocation.
    ///
    /// Removal happens once the callback returns. A one-shot listener that
    /// emits its own event from inside the callback is therefore invoked again
    /// by each nested [`EventEmitter::emit`].
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidListener`] if the spec does not
    /// resolve to a callable.
    pub fn once(
        &self,
        event_name: &str,
        listener: impl Into<ListenerSpec<A>>,
    ) -> EmitterResult<&Self> {
        self.on(event_name, ListenerSpec::tagged(listener, true))
    }

    /// Deliver `args` to every listener of `event_name`, in registration order.
    ///
    /// Each listener receives this emitter and `args`. One-shot listeners are
    /// removed right after they return, so a nested `emit` of the same event
    /// from inside one still reaches it. Emitting an event with no listeners is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Listener`] as soon as a listener fails.
    /// Listeners after the failing one are not invoked for this call.
    pub fn emit(&self, event_name: &str, args: &[A]) -> EmitterResult<&Self> {
        let snapshot = match self.channels.borrow().get(event_name) {
            Some(channel) if !channel.is_empty() => channel.clone(),
            _ => {
                trace!(event = event_name, "No listeners for event");
                return Ok(self);
            },
        };

        trace!(
            event = event_name,
            listener_count = snapshot.len(),
            "Emitting event"
        );

        for record in &snapshot {
            trace!(
                event = event_name,
                listener_id = %record.listener.id(),
                "Invoking listener"
            );

            record
                .listener
                .call(self, args)
                .map_err(|source| EmitterError::Listener {
                    event: event_name.to_string(),
                    source,
                })?;

            if record.once {
                self.off(event_name, &record.listener);
            }
        }

        Ok(self)
    }

    /// Emit `event_name` with no arguments.
    ///
    /// # Errors
    ///
    /// Same as [`EventEmitter::emit`].
    pub fn emit_empty(&self, event_name: &str) -> EmitterResult<&Self> {
        self.emit(event_name, &[])
    }

    /// Remove `listener` from `event_name`.
    ///
    /// At most one record is removed. Unknown events and listeners are ignored.
    pub fn off(&self, event_name: &str, listener: &Listener<A>) -> &Self {
        let mut channels = self.channels.borrow_mut();

        if let Some(channel) = channels.get_mut(event_name)
            && let Some(index) = channel
                .iter()
                .position(|record| record.listener == *listener)
        {
            channel.remove(index);
            debug!(
                event = event_name,
                listener_id = %listener.id(),
                "Listener removed"
            );
        }

        self
    }

    /// Remove listeners in bulk.
    ///
    /// With a name, only that channel is emptied and a name with no channel is
    /// ignored. With `None` or an empty name, every channel is dropped.
    pub fn all_off(&self, event_name: Option<&str>) {
        let mut channels = self.channels.borrow_mut();

        match event_name.filter(|name| !name.is_empty()) {
            Some(name) => {
                if let Some(channel) = channels.get_mut(name) {
                    channel.clear();
                    debug!(event = name, "Channel cleared");
                }
            },
            None => {
                channels.clear();
                debug!("All channels cleared");
            },
        }
    }

    /// Number of listeners registered for `event_name`.
    #[must_use]
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.channels
            .borrow()
            .get(event_name)
            .map_or(0, Vec::len)
    }

    /// Returns `true` if `event_name` has at least one listener.
    #[must_use]
    pub fn has_listeners(&self, event_name: &str) -> bool {
        self.listener_count(event_name) > 0
    }

    /// Names of events that currently have listeners, in no particular order.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        self.channels
            .borrow()
            .iter()
            .filter(|(_, channel)| !channel.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl<A: 'static> Default for EventEmitter<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for EventEmitter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (channel_count, listener_count) = self
            .channels
            .try_borrow()
            .map(|channels| {
                (
                    channels.len(),
                    channels.values().map(Vec::len).sum::<usize>(),
                )
            })
            .unwrap_or_default();

        f.debug_struct("EventEmitter")
            .field("channel_count", &channel_count)
            .field("listener_count", &listener_count)
            .finish()
    }
}
