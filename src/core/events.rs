//! Engine events and the subscription bus
//!
//! Two layers live here:
//!
//! - [`EventQueue`]: a double-buffered queue. Events pushed during frame N
//!   are delivered during frame N+1, so delivery order never depends on the
//!   order systems run in.
//! - [`EventBus`]: owned callback registration on top of the queue. A
//!   subscriber gets a [`Subscription`] handle back; dropping or cancelling
//!   the handle removes the callback.
//!
//! Everything is single-threaded. The bus is a cheap `Rc` handle that can be
//! cloned into whichever system needs to publish.
//!
//! # Example
//!
//! ```ignore
//! let bus = EventBus::new();
//! let sub = bus.subscribe(EventKind::WorldUnloaded, |_| log::info!("gone"));
//!
//! bus.emit(EngineEvent::WorldUnloaded); // delivered now
//! bus.push(EngineEvent::WorldUnloaded); // delivered on next flush()
//! bus.flush();
//!
//! sub.cancel();
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::core::engine::EngineMode;

// ============================================================================
// Event Types
// ============================================================================

/// Engine-level notifications.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EngineEvent {
    /// A world finished loading.
    WorldLoaded {
        /// World name
        name: String,
    },

    /// The active world was unloaded; every entity id from it is now stale.
    WorldUnloaded,

    /// The engine switched modes.
    ModeChanged {
        /// Mode before the switch
        from: EngineMode,
        /// Mode after the switch
        to: EngineMode,
    },
}

impl EngineEvent {
    /// The subscription key for this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::WorldLoaded { .. } => EventKind::WorldLoaded,
            Self::WorldUnloaded => EventKind::WorldUnloaded,
            Self::ModeChanged { .. } => EventKind::ModeChanged,
        }
    }
}

/// Discriminant used to subscribe to a family of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    WorldLoaded,
    WorldUnloaded,
    ModeChanged,
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue for frame-consistent event processing.
///
/// Events pushed during frame N are available for reading during frame N+1.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this frame
    pending: VecDeque<EngineEvent>,
    /// Events from previous frame, ready for processing
    processing: VecDeque<EngineEvent>,
}

impl EventQueue {
    /// Default initial capacity for event queues.
    const DEFAULT_CAPACITY: usize = 16;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event to be processed next frame.
    ///
    /// Events are not immediately visible to iterators. Call `swap()`
    /// at the frame boundary to make them available.
    #[inline]
    pub fn push(&mut self, event: EngineEvent) {
        self.pending.push_back(event);
    }

    /// Swap the pending and processing queues.
    ///
    /// Call this once per frame. After swapping `iter()` returns events from
    /// the previous frame and `push()` writes to a fresh pending queue.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events from the previous frame.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &EngineEvent> {
        self.processing.iter()
    }

    /// Drain all events from the previous frame.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = EngineEvent> + '_ {
        self.processing.drain(..)
    }

    /// Check if there are any events ready to process.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Get the number of events ready for processing.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Get the number of events pending for next frame.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Clear all events (both pending and processing).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Event Bus
// ============================================================================

type Handler = Rc<RefCell<dyn FnMut(&EngineEvent)>>;

struct Subscriber {
    id: u64,
    kind: EventKind,
    handler: Handler,
}

#[derive(Default)]
struct BusState {
    queue: EventQueue,
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

/// Publish/subscribe bus for [`EngineEvent`]s.
///
/// Handlers run synchronously on the caller's thread. A handler must not
/// emit an event it is itself subscribed to; pushing to the queue is fine.
#[derive(Clone, Default)]
pub struct EventBus {
    state: Rc<RefCell<BusState>>,
}

impl EventBus {
    /// Create an empty bus
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every event of `kind`.
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// cancelled or dropped.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;

        let handler: Handler = Rc::new(RefCell::new(handler));
        state.subscribers.push(Subscriber { id, kind, handler });

        Subscription {
            id,
            kind,
            bus: Rc::downgrade(&self.state),
        }
    }

    /// Deliver an event to its subscribers right now.
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&self, event: EngineEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .state
            .borrow()
            .subscribers
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| Rc::clone(&s.handler))
            .collect();

        for handler in &handlers {
            let mut handler = handler.borrow_mut();
            (&mut *handler)(&event);
        }
        handlers.len()
    }

    /// Queue an event for delivery on the next [`flush`](Self::flush).
    pub fn push(&self, event: EngineEvent) {
        self.state.borrow_mut().queue.push(event);
    }

    /// Swap the queue and deliver everything pushed since the last flush.
    ///
    /// Returns the number of events delivered.
    pub fn flush(&self) -> usize {
        let events: Vec<EngineEvent> = {
            let mut state = self.state.borrow_mut();
            state.queue.swap();
            state.queue.drain().collect()
        };

        let count = events.len();
        for event in events {
            self.emit(event);
        }
        count
    }

    /// Number of events waiting for the next flush
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.borrow().queue.pending_count()
    }

    /// Number of live subscriptions for `kind`
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.state
            .borrow()
            .subscribers
            .iter()
            .filter(|s| s.kind == kind)
            .count()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventBus")
            .field("subscribers", &state.subscribers.len())
            .field("pending", &state.queue.pending_count())
            .finish()
    }
}

/// Handle to a registered callback.
///
/// The callback is removed when the handle is cancelled or dropped. If the
/// bus itself is gone first, the handle is inert.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    kind: EventKind,
    bus: Weak<RefCell<BusState>>,
}

impl Subscription {
    /// The event family this subscription listens to
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Whether the callback is still registered on a live bus
    #[must_use]
    pub fn is_active(&self) -> bool {
        let Some(state) = self.bus.upgrade() else {
            return false;
        };
        let state = state.borrow();
        state.subscribers.iter().any(|s| s.id == self.id)
    }

    /// Remove the callback from the bus.
    ///
    /// Returns `true` if a registered callback was removed.
    pub fn cancel(mut self) -> bool {
        self.detach()
    }

    fn detach(&mut self) -> bool {
        let Some(state) = std::mem::take(&mut self.bus).upgrade() else {
            return false;
        };
        let Ok(mut state) = state.try_borrow_mut() else {
            log::warn!("Event bus busy, subscription {} not removed", self.id);
            return false;
        };
        let before = state.subscribers.len();
        state.subscribers.retain(|s| s.id != self.id);
        state.subscribers.len() != before
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_event_queue_push_and_swap() {
        let mut queue = EventQueue::new();

        queue.push(EngineEvent::WorldUnloaded);
        assert!(queue.is_empty(), "Events should not be visible before swap");

        queue.swap();
        assert_eq!(queue.len(), 1);

        let events: Vec<_> = queue.iter().collect();
        assert!(matches!(events[0], EngineEvent::WorldUnloaded));
    }

    #[test]
    fn test_event_queue_double_buffer_isolation() {
        let mut queue = EventQueue::new();

        queue.push(EngineEvent::WorldLoaded { name: "a".into() });
        queue.swap();

        queue.push(EngineEvent::WorldLoaded { name: "b".into() });

        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], &EngineEvent::WorldLoaded { name: "a".into() });

        queue.swap();
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], &EngineEvent::WorldLoaded { name: "b".into() });
    }

    #[test]
    fn test_event_queue_clear() {
        let mut queue = EventQueue::new();

        queue.push(EngineEvent::WorldUnloaded);
        queue.swap();
        queue.push(EngineEvent::WorldUnloaded);

        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_emit_reaches_only_matching_kind() {
        let bus = EventBus::new();
        let unloads = Rc::new(Cell::new(0));
        let loads = Rc::new(Cell::new(0));

        let u = Rc::clone(&unloads);
        let _a = bus.subscribe(EventKind::WorldUnloaded, move |_| u.set(u.get() + 1));
        let l = Rc::clone(&loads);
        let _b = bus.subscribe(EventKind::WorldLoaded, move |_| l.set(l.get() + 1));

        assert_eq!(bus.emit(EngineEvent::WorldUnloaded), 1);
        assert_eq!(unloads.get(), 1);
        assert_eq!(loads.get(), 0);
    }

    #[test]
    fn test_push_is_deferred_until_flush() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = bus.subscribe(EventKind::WorldUnloaded, move |_| h.set(h.get() + 1));

        bus.push(EngineEvent::WorldUnloaded);
        assert_eq!(hits.get(), 0);
        assert_eq!(bus.pending_count(), 1);

        assert_eq!(bus.flush(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(bus.flush(), 0);
    }

    #[test]
    fn test_cancel_removes_handler() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = bus.subscribe(EventKind::WorldUnloaded, move |_| h.set(h.get() + 1));

        assert!(sub.is_active());
        assert!(sub.cancel());
        assert_eq!(bus.subscriber_count(EventKind::WorldUnloaded), 0);

        bus.emit(EngineEvent::WorldUnloaded);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_drop_removes_handler() {
        let bus = EventBus::new();
        {
            let _sub = bus.subscribe(EventKind::ModeChanged, |_| {});
            assert_eq!(bus.subscriber_count(EventKind::ModeChanged), 1);
        }
        assert_eq!(bus.subscriber_count(EventKind::ModeChanged), 0);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventKind::WorldUnloaded, |_| {});
        drop(bus);
        assert!(!sub.is_active());
        assert!(!sub.cancel());
    }

    #[test]
    fn test_handler_may_push_during_emit() {
        let bus = EventBus::new();
        let inner = bus.clone();
        let _sub = bus.subscribe(EventKind::WorldUnloaded, move |_| {
            inner.push(EngineEvent::WorldLoaded { name: "next".into() });
        });

        bus.emit(EngineEvent::WorldUnloaded);
        assert_eq!(bus.pending_count(), 1);
    }
}
