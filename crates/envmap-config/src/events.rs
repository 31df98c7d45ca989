//! # Config Events
//!
//! A per-accessor listener registry. Handlers run synchronously inside the
//! call that emits, in registration order; there is no queue and no global
//! bus.

use std::fmt;

/// Event emitted by a [`Config`](crate::Config).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    /// Whole-tree validation failed.
    Invalid {
        /// Aggregated violations followed by a rendering of the data tree.
        message: String,
    },
}

impl ConfigEvent {
    /// The kind handlers subscribe to.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Invalid { .. } => EventKind::Invalid,
        }
    }
}

/// Discriminant of [`ConfigEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// See [`ConfigEvent::Invalid`].
    Invalid,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Invalid => "invalid",
        })
    }
}

/// Handle returned by [`Listeners::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = Box<dyn FnMut(&ConfigEvent) + Send>;

struct Listener {
    id: ListenerId,
    kind: EventKind,
    handler: Handler,
}

/// Registration-ordered handler list.
#[derive(Default)]
pub struct Listeners {
    listeners: Vec<Listener>,
    next_id: u64,
}

impl Listeners {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> ListenerId
    where
        F: FnMut(&ConfigEvent) + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            kind,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to every handler of its kind. Returns how many ran.
    pub fn emit(&mut self, event: &ConfigEvent) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        for listener in self.listeners.iter_mut().filter(|l| l.kind == kind) {
            (listener.handler)(event);
            delivered += 1;
        }
        delivered
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn invalid(message: &str) -> ConfigEvent {
        ConfigEvent::Invalid {
            message: message.to_string(),
        }
    }

    #[test]
    fn test_emit_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();
        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            listeners.subscribe(EventKind::Invalid, move |_| seen.lock().unwrap().push(tag));
        }

        assert_eq!(listeners.emit(&invalid("boom")), 3);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let count = Arc::new(Mutex::new(0));
        let mut listeners = Listeners::new();
        let id = {
            let count = Arc::clone(&count);
            listeners.subscribe(EventKind::Invalid, move |_| *count.lock().unwrap() += 1)
        };

        listeners.emit(&invalid("a"));
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit(&invalid("b"));

        assert_eq!(*count.lock().unwrap(), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_handler_receives_payload() {
        let seen = Arc::new(Mutex::new(None));
        let mut listeners = Listeners::new();
        {
            let seen = Arc::clone(&seen);
            listeners.subscribe(EventKind::Invalid, move |event| {
                *seen.lock().unwrap() = Some(event.clone());
            });
        }
        listeners.emit(&invalid("payload"));
        assert_eq!(*seen.lock().unwrap(), Some(invalid("payload")));
        assert_eq!(EventKind::Invalid.to_string(), "invalid");
    }
}
