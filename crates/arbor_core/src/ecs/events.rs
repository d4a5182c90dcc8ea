//! # Registry Events
//!
//! Synchronous multicast notifications. Listeners run inline, in
//! subscription order, before the mutating call returns.
//!
//! A listener only sees the event. It cannot reach the registry while it
//! runs, so it can not destroy the object it was notified about or change
//! a component mask under an iteration in progress. Listeners that need to
//! react structurally should queue the work and apply it after the call.

use super::component::ComponentUid;
use super::object::ObjectId;

/// Something that happened to the registry.
#[derive(Clone, Debug, PartialEq)]
pub enum RegistryEvent {
    /// An object was created.
    ObjectCreated(ObjectId),
    /// An object was destroyed. Its slot is already dead.
    ObjectDestroyed(ObjectId),
    /// An object's world transform changed.
    ObjectMoved(ObjectId),
    /// A component was attached.
    ComponentAdded(ComponentUid),
    /// A component was detached.
    ComponentDestroyed(ComponentUid),
}

impl RegistryEvent {
    /// The kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ObjectCreated(_) => EventKind::ObjectCreated,
            Self::ObjectDestroyed(_) => EventKind::ObjectDestroyed,
            Self::ObjectMoved(_) => EventKind::ObjectMoved,
            Self::ComponentAdded(_) => EventKind::ComponentAdded,
            Self::ComponentDestroyed(_) => EventKind::ComponentDestroyed,
        }
    }
}

/// Event kinds, one listener list each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    /// See [`RegistryEvent::ObjectCreated`].
    ObjectCreated = 0,
    /// See [`RegistryEvent::ObjectDestroyed`].
    ObjectDestroyed = 1,
    /// See [`RegistryEvent::ObjectMoved`].
    ObjectMoved = 2,
    /// See [`RegistryEvent::ComponentAdded`].
    ComponentAdded = 3,
    /// See [`RegistryEvent::ComponentDestroyed`].
    ComponentDestroyed = 4,
}

impl EventKind {
    /// Number of event kinds.
    pub const COUNT: usize = 5;

    /// Every kind, in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::ObjectCreated,
        Self::ObjectDestroyed,
        Self::ObjectMoved,
        Self::ComponentAdded,
        Self::ComponentDestroyed,
    ];
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// A registered callback.
pub type Listener = Box<dyn FnMut(&RegistryEvent) + Send + Sync>;

/// Listener lists for every event kind.
#[derive(Default)]
pub struct EventBus {
    lists: [Vec<(ListenerId, Listener)>; EventKind::COUNT],
    next_id: u32,
}

impl EventBus {
    /// Creates a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener` to the list for `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&RegistryEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.lists[kind as usize].push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        for list in &mut self.lists {
            if let Some(position) = list.iter().position(|(listener_id, _)| *listener_id == id) {
                drop(list.remove(position));
                return true;
            }
        }
        false
    }

    /// Number of listeners subscribed to `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.lists[kind as usize].len()
    }

    /// Delivers `event` to every listener of its kind.
    pub fn emit(&mut self, event: &RegistryEvent) {
        for (_, listener) in &mut self.lists[event.kind() as usize] {
            listener(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for kind in EventKind::ALL {
            map.entry(&kind, &self.listener_count(kind));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_emit_reaches_only_matching_kind() {
        let mut bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        bus.subscribe(EventKind::ObjectCreated, move |event| sink.lock().push(event.clone()));

        bus.emit(&RegistryEvent::ObjectCreated(ObjectId::new(1)));
        bus.emit(&RegistryEvent::ObjectMoved(ObjectId::new(1)));

        assert_eq!(*seen.lock(), vec![RegistryEvent::ObjectCreated(ObjectId::new(1))]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let id = bus.subscribe(EventKind::ObjectMoved, |_| {});
        assert_eq!(bus.listener_count(EventKind::ObjectMoved), 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.listener_count(EventKind::ObjectMoved), 0);
    }

    #[test]
    fn test_unsubscribed_listener_is_dropped() {
        let mut bus = EventBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let ids: Vec<_> = (0..3)
            .map(|n| {
                let sink = Arc::clone(&calls);
                bus.subscribe(EventKind::ObjectCreated, move |_| sink.lock().push(n))
            })
            .collect();
        assert_eq!(Arc::strong_count(&calls), 4);

        assert!(bus.unsubscribe(ids[1]));
        // the boxed closure and its captured sink are gone
        assert_eq!(Arc::strong_count(&calls), 3);

        bus.emit(&RegistryEvent::ObjectCreated(ObjectId::new(0)));
        assert_eq!(*calls.lock(), vec![0, 2]);
    }
}
