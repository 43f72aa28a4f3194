//! Change notification: topics, subscriptions, synchronous delivery.
//!
//! - [`MessageBroker::create_topic`] / [`MessageBroker::destroy_topic`]: topic lifecycle.
//! - [`MessageBroker::subscribe`] / [`MessageBroker::unsubscribe`]: listener lifecycle.
//! - [`MessageBroker::send_event`]: invoke every listener of a topic, re-entrancy safe.

pub mod broker;

pub use broker::{CallbackId, MessageBroker, TopicId};
