//! StyleProperty<T>: one styleable attribute with a value per visual state.
//!
//! Each property owns a topic on a [`MessageBroker`]. Every mutation publishes
//! one event on that topic, which cached component state uses to refresh.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::message::{CallbackId, MessageBroker, TopicId};
use crate::style::state::{ComponentState, STATE_SLOTS};

// ---------------------------------------------------------------------------
// StyleProperty
// ---------------------------------------------------------------------------

/// A value that can differ per [`ComponentState`], falling back to a default.
///
/// Cloning produces an independent property with the same values and a new
/// topic; listeners of the original are not carried over.
pub struct StyleProperty<T> {
    default: T,
    values: [Option<T>; STATE_SLOTS],
    /// Bit `i` is set iff `values[i]` is `Some`.
    stored: u16,
    broker: Rc<MessageBroker>,
    topic: TopicId,
}

impl<T> StyleProperty<T> {
    /// Create a property on the calling thread's broker.
    pub fn new(default: T) -> Self {
        Self::with_broker(MessageBroker::current(), default)
    }

    /// Create a property whose change events go through `broker`.
    pub fn with_broker(broker: Rc<MessageBroker>, default: T) -> Self {
        let topic = broker.create_topic();
        Self {
            default,
            values: std::array::from_fn(|_| None),
            stored: 0,
            broker,
            topic,
        }
    }

    /// Store `value` for exactly `state` and publish a change.
    pub fn set_value(&mut self, value: T, state: ComponentState) {
        self.values[state.index()] = Some(value);
        self.stored |= state.bit();
        self.notify();
    }

    /// Store `value` when present, otherwise remove the entry for `state`.
    pub fn set_optional_value(&mut self, value: Option<T>, state: ComponentState) {
        match value {
            Some(value) => self.set_value(value, state),
            None => self.unset_value(state),
        }
    }

    /// Remove the explicit value for `state` and publish a change.
    pub fn unset_value(&mut self, state: ComponentState) {
        self.values[state.index()] = None;
        self.stored &= !state.bit();
        self.notify();
    }

    /// Remove every explicit value and publish a single change.
    pub fn unset_all(&mut self) {
        self.clear();
        self.notify();
    }

    /// Replace all explicit values by `value` in the Normal state, publishing once.
    pub fn assign(&mut self, value: T) {
        self.clear();
        self.values[ComponentState::Normal.index()] = Some(value);
        self.stored = ComponentState::Normal.bit();
        self.notify();
    }

    /// Resolve the effective value for a requested state.
    ///
    /// Lookup order: Disabled (with Active), Active (with Hover and Focused
    /// variants), Hover (with Focused), Focused, then Normal, then the default.
    /// A property whose only explicit value is Normal returns it for every state.
    pub fn get(&self, state: ComponentState) -> &T {
        use ComponentState::*;

        if self.stored == 0 {
            return &self.default;
        }
        if self.stored == Normal.bit() {
            if let Some(value) = self.stored_value(Normal) {
                return value;
            }
        }

        if state.includes(Disabled) {
            if state.includes(Active) {
                if let Some(value) = self.stored_value(DisabledActive) {
                    return value;
                }
            }
            if let Some(value) = self.stored_value(Disabled) {
                return value;
            }
        }

        if state.includes(Active) {
            if state.includes(Hover) {
                if state.includes(Focused) {
                    if let Some(value) = self.stored_value(FocusedActiveHover) {
                        return value;
                    }
                }
                if let Some(value) = self.stored_value(ActiveHover) {
                    return value;
                }
            }
            if state.includes(Focused) {
                if let Some(value) = self.stored_value(FocusedActive) {
                    return value;
                }
            }
            if let Some(value) = self.stored_value(Active) {
                return value;
            }
        }

        if state.includes(Hover) {
            if state.includes(Focused) {
                if let Some(value) = self.stored_value(FocusedHover) {
                    return value;
                }
            }
            if let Some(value) = self.stored_value(Hover) {
                return value;
            }
        }

        if state.includes(Focused) {
            if let Some(value) = self.stored_value(Focused) {
                return value;
            }
        }

        // Reached with e.g. Normal + Disabled stored while the widget is enabled,
        // or with only a Disabled value while enabled (then the default wins).
        self.stored_value(Normal).unwrap_or(&self.default)
    }

    /// Whether an explicit value is stored for exactly `state`.
    pub fn has_value(&self, state: ComponentState) -> bool {
        self.stored & state.bit() != 0
    }

    /// Presence mask: bit `i` set iff state `i` has an explicit value.
    pub fn stored_states(&self) -> u16 {
        self.stored
    }

    /// The value returned when no explicit value applies.
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// The topic this property publishes its changes on.
    pub fn topic(&self) -> TopicId {
        self.topic
    }

    /// The broker this property publishes through.
    pub fn broker(&self) -> &Rc<MessageBroker> {
        &self.broker
    }

    /// Subscribe `listener` to changes of this property.
    pub fn connect_callback(&self, listener: impl Fn() + 'static) -> CallbackId {
        self.broker.subscribe(self.topic, listener)
    }

    /// Remove a listener registered with [`connect_callback`](Self::connect_callback).
    pub fn disconnect_callback(&self, id: CallbackId) {
        self.broker.unsubscribe(id);
    }

    fn stored_value(&self, state: ComponentState) -> Option<&T> {
        self.values[state.index()].as_ref()
    }

    fn clear(&mut self) {
        for slot in &mut self.values {
            *slot = None;
        }
        self.stored = 0;
    }

    fn notify(&self) {
        self.broker.send_event(self.topic);
    }
}

impl<T: Clone> Clone for StyleProperty<T> {
    fn clone(&self) -> Self {
        Self {
            default: self.default.clone(),
            values: self.values.clone(),
            stored: self.stored,
            broker: Rc::clone(&self.broker),
            topic: self.broker.create_topic(),
        }
    }
}

impl<T: Default> Default for StyleProperty<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Drop for StyleProperty<T> {
    fn drop(&mut self) {
        self.broker.destroy_topic(self.topic);
    }
}

impl<T: fmt::Debug> fmt::Debug for StyleProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut values = f.debug_map();
        for state in ComponentState::ALL {
            if let Some(value) = self.stored_value(state) {
                values.entry(&state, value);
            }
        }
        values.finish()?;
        f.debug_struct("StyleProperty")
            .field("default", &self.default)
            .field("topic", &self.topic.as_u64())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Type-erased access
// ---------------------------------------------------------------------------

/// Object-safe view of a [`StyleProperty`] of any value type.
///
/// Lets differently typed properties live in one collection and be downcast
/// back when the concrete type is known.
pub trait AnyStyleProperty {
    /// Upcast to `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Upcast to `&mut dyn Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The topic the property publishes on.
    fn topic(&self) -> TopicId;

    /// Presence mask of explicitly stored states.
    fn stored_states(&self) -> u16;

    /// Remove every explicit value.
    fn unset_all(&mut self);
}

impl<T: 'static> AnyStyleProperty for StyleProperty<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn topic(&self) -> TopicId {
        self.topic
    }

    fn stored_states(&self) -> u16 {
        self.stored
    }

    fn unset_all(&mut self) {
        StyleProperty::unset_all(self);
    }
}

impl dyn AnyStyleProperty {
    /// Attempt to view this property as a `StyleProperty<T>`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&StyleProperty<T>> {
        self.as_any().downcast_ref::<StyleProperty<T>>()
    }

    /// Attempt to view this property mutably as a `StyleProperty<T>`.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut StyleProperty<T>> {
        self.as_any_mut().downcast_mut::<StyleProperty<T>>()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
