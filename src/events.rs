//! Caller-visible events.

use serde_json::Value;

use crate::push::CallerRef;

/// An event delivered to the caller that owns a push.
///
/// Every caller that registers with the session (see
/// [`crate::Session::register_caller`]) receives these on its own mailbox;
/// no shared mutable state crosses the boundary (SPEC_FULL.md §5).
#[derive(Debug, Clone)]
pub enum CallerEvent {
    /// One per sync or ref-tagged async push, delivered exactly once
    /// (suppressed on replays).
    Reply {
        /// The wire event name of the push this reply answers (`"doc"` or
        /// `"unsubscribe"`).
        event: &'static str,
        /// Whether the push succeeded.
        status: ReplyStatus,
        /// The reply payload (`response.data`/`response.errors`, or the
        /// raw `response` for an unsubscribe).
        payload: Value,
        /// The caller-chosen reference this reply answers, if any.
        caller_ref: Option<CallerRef>,
        /// The wire `server_push_ref` this reply arrived on.
        push_ref: String,
    },
    /// One per server data frame for an active subscription.
    Message {
        /// The subscription id this data frame was addressed to.
        topic: String,
        /// Always `"subscription:data"`.
        event: &'static str,
        /// The `{ result: { data, errors } }` payload.
        payload: Value,
        /// The caller-chosen reference of the push that created this
        /// subscription, if any.
        caller_ref: Option<CallerRef>,
    },
}

/// Whether a [`CallerEvent::Reply`] represents success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// The push succeeded.
    Ok,
    /// The push failed; `payload` carries the server's error detail.
    Error,
}

/// The outcome of a [`crate::Session::push_sync`] call.
#[derive(Debug, Clone)]
pub enum PushOutcome {
    /// A reply was received before the deadline.
    Reply {
        /// Whether the push succeeded.
        status: ReplyStatus,
        /// The reply payload.
        payload: Value,
    },
    /// No reply arrived within the deadline; the push is abandoned (if a
    /// reply arrives later it is still forwarded to the caller's mailbox
    /// as a late [`CallerEvent::Reply`], provided a `caller_ref` was set).
    Timeout,
    /// The join-wait retries were exhausted before the control channel
    /// became joined.
    NotJoined,
}
