//! Push delivery: events handed to application code as they are ingested.

use std::collections::HashMap;
use std::fmt;

use crate::client::Commands;
use crate::sansio::{Event, EventKind};

/// Receives events in arrival order.
///
/// `commands` allows replying from inside the handler, e.g. logging in on
/// `Hello`. Handlers run with the session locked and must not block.
pub trait EventHandler {
    fn handle_event(&mut self, event: Event, commands: &mut Commands<'_>);
}

impl<F> EventHandler for F
where
    F: FnMut(Event, &mut Commands<'_>),
{
    fn handle_event(&mut self, event: Event, commands: &mut Commands<'_>) {
        self(event, commands)
    }
}

type Callback = Box<dyn FnMut(&Event, &mut Commands<'_>) + Send>;

/// Per-kind callbacks.
///
/// ```
/// use warhorse::{EventKind, Handlers};
///
/// let handlers = Handlers::new()
///     .on(EventKind::Hello, |_, commands| {
///         commands.login("alice", "password");
///     })
///     .on(EventKind::ChatMessage, |event, _| println!("{}", event.payload()));
/// assert!(handlers.handles(EventKind::Hello));
/// assert!(!handlers.handles(EventKind::FriendsList));
/// ```
#[derive(Default)]
pub struct Handlers {
    callbacks: HashMap<EventKind, Callback>,
    fallback: Option<Callback>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the callback for `kind`, replacing any earlier one.
    pub fn on<F>(mut self, kind: EventKind, callback: F) -> Self
    where
        F: FnMut(&Event, &mut Commands<'_>) + Send + 'static,
    {
        self.callbacks.insert(kind, Box::new(callback));
        self
    }

    /// Called for kinds without their own callback.
    pub fn otherwise<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Event, &mut Commands<'_>) + Send + 'static,
    {
        self.fallback = Some(Box::new(callback));
        self
    }

    pub fn handles(&self, kind: EventKind) -> bool {
        self.callbacks.contains_key(&kind)
    }
}

impl EventHandler for Handlers {
    fn handle_event(&mut self, event: Event, commands: &mut Commands<'_>) {
        match self.callbacks.get_mut(&event.kind()) {
            Some(callback) => callback(&event, commands),
            None => {
                if let Some(fallback) = self.fallback.as_mut() {
                    fallback(&event, commands)
                }
            }
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("kinds", &self.callbacks.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
