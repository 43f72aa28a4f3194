//! MessageBroker: topic/subscriber registry for property change events.
//!
//! Single-threaded and synchronous. Every thread owns a default broker reachable
//! through [`MessageBroker::current`]; independent brokers can be created with
//! [`MessageBroker::new`] and handed to style properties explicitly.
//!
//! Listeners are allowed to call back into the broker while an event is being
//! delivered (subscribe, unsubscribe, destroy topics, send more events). No
//! `RefCell` borrow is held while user code runs, and listener closures are
//! always dropped outside of a borrow because dropping one may tear down a
//! style property, which destroys its topic.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// IDs
// ---------------------------------------------------------------------------

/// Identifies a topic inside a [`MessageBroker`].
///
/// Topic and callback ids come from one counter, so no value is ever handed
/// out twice by the same broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicId(u64);

impl TopicId {
    /// Raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Identifies one subscription (a stored listener) inside a [`MessageBroker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

impl CallbackId {
    /// Raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Registry internals
// ---------------------------------------------------------------------------

type Listener = Rc<dyn Fn()>;

#[derive(Default)]
struct Registry {
    last_id: u64,
    topics: HashMap<TopicId, BTreeSet<CallbackId>>,
    callback_topics: HashMap<CallbackId, TopicId>,
    listeners: HashMap<CallbackId, Listener>,
}

impl Registry {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

thread_local! {
    static CURRENT: Rc<MessageBroker> = Rc::new(MessageBroker::new());
}

// ---------------------------------------------------------------------------
// MessageBroker
// ---------------------------------------------------------------------------

/// Registry of topics and the listeners subscribed to them.
pub struct MessageBroker {
    registry: RefCell<Registry>,
}

impl MessageBroker {
    /// Create an empty, independent broker.
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(Registry::default()),
        }
    }

    /// The default broker of the calling thread.
    pub fn current() -> Rc<MessageBroker> {
        CURRENT.with(Rc::clone)
    }

    /// Allocate a fresh topic with no subscribers.
    pub fn create_topic(&self) -> TopicId {
        let mut reg = self.registry.borrow_mut();
        let topic = TopicId(reg.next_id());
        reg.topics.insert(topic, BTreeSet::new());
        tracing::trace!(topic = topic.0, "created topic");
        topic
    }

    /// Remove a topic together with every listener still subscribed to it.
    ///
    /// Unknown topics are ignored.
    pub fn destroy_topic(&self, topic: TopicId) {
        let dropped: Vec<Listener> = {
            let mut reg = self.registry.borrow_mut();
            let Some(callbacks) = reg.topics.remove(&topic) else {
                return;
            };
            callbacks
                .iter()
                .filter_map(|id| {
                    reg.callback_topics.remove(id);
                    reg.listeners.remove(id)
                })
                .collect()
        };
        tracing::trace!(topic = topic.0, listeners = dropped.len(), "destroyed topic");
        drop(dropped);
    }

    /// Register `listener` on `topic` and return its subscription id.
    ///
    /// Topics are never created implicitly: for an unknown or destroyed topic
    /// the listener is dropped and the returned id is not subscribed.
    pub fn subscribe(&self, topic: TopicId, listener: impl Fn() + 'static) -> CallbackId {
        let mut reg = self.registry.borrow_mut();
        let id = CallbackId(reg.next_id());
        let Some(callbacks) = reg.topics.get_mut(&topic) else {
            tracing::trace!(topic = topic.0, callback = id.0, "ignored subscription to unknown topic");
            return id;
        };
        callbacks.insert(id);
        reg.callback_topics.insert(id, topic);
        reg.listeners.insert(id, Rc::new(listener));
        tracing::trace!(topic = topic.0, callback = id.0, "subscribed");
        id
    }

    /// Remove a subscription. Unknown ids (including ids whose topic was
    /// already destroyed) are ignored.
    pub fn unsubscribe(&self, id: CallbackId) {
        let dropped = {
            let mut reg = self.registry.borrow_mut();
            let Some(listener) = reg.listeners.remove(&id) else {
                return;
            };
            if let Some(topic) = reg.callback_topics.remove(&id) {
                if let Some(callbacks) = reg.topics.get_mut(&topic) {
                    callbacks.remove(&id);
                }
            }
            listener
        };
        tracing::trace!(callback = id.0, "unsubscribed");
        drop(dropped);
    }

    /// Synchronously invoke every listener subscribed to `topic`.
    ///
    /// The subscriber set is snapshotted first. Listeners removed by an earlier
    /// listener of the same delivery are skipped; listeners added during the
    /// delivery only hear the next event.
    pub fn send_event(&self, topic: TopicId) {
        let snapshot: Vec<CallbackId> = {
            let reg = self.registry.borrow();
            match reg.topics.get(&topic) {
                Some(callbacks) if !callbacks.is_empty() => callbacks.iter().copied().collect(),
                _ => return,
            }
        };

        for id in snapshot {
            let listener = self.registry.borrow().listeners.get(&id).cloned();
            if let Some(listener) = listener {
                listener();
            }
        }
    }

    /// Whether `topic` is currently registered.
    pub fn has_topic(&self, topic: TopicId) -> bool {
        self.registry.borrow().topics.contains_key(&topic)
    }

    /// Whether `id` is a live subscription.
    pub fn is_subscribed(&self, id: CallbackId) -> bool {
        self.registry.borrow().listeners.contains_key(&id)
    }

    /// Number of listeners subscribed to `topic`.
    pub fn subscriber_count(&self, topic: TopicId) -> usize {
        self.registry
            .borrow()
            .topics
            .get(&topic)
            .map_or(0, BTreeSet::len)
    }
}

impl Default for MessageBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reg = self.registry.borrow();
        f.debug_struct("MessageBroker")
            .field("last_id", &reg.last_id)
            .field("topics", &reg.topics.len())
            .field("listeners", &reg.listeners.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
