//! Push records: the unit of bookkeeping for every outbound document or
//! control message. See SPEC_FULL.md §3.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::events::CallerEvent;
use crate::wire::{DocPayload, UnsubscribePayload};

/// A session-local identity for a registered caller.
///
/// Used as the key for the per-caller index (SPEC_FULL.md §3's
/// `per_caller_index`); the caller's own [`CallerRef`] is never used for
/// indexing, only round-tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallerId(pub(crate) u64);

/// An opaque, caller-chosen token attached to a push, used to correlate
/// replies and subscription data frames back to the originator. Absent for
/// fire-and-forget pushes.
pub type CallerRef = Value;

/// What a push record does once transmitted: submit a document, or tear
/// down a subscription.
#[derive(Debug, Clone)]
pub enum PushEvent {
    /// `{ query, variables }`.
    Doc { query: String, variables: Value },
    /// `{ subscriptionId }`.
    Unsubscribe { subscription_id: String },
}

impl PushEvent {
    /// The wire event name for this push.
    pub fn wire_event(&self) -> &'static str {
        match self {
            PushEvent::Doc { .. } => crate::wire::DOC_EVENT,
            PushEvent::Unsubscribe { .. } => crate::wire::UNSUBSCRIBE_EVENT,
        }
    }

    /// The JSON payload for this push.
    pub fn payload(&self) -> Value {
        match self {
            PushEvent::Doc { query, variables } => {
                serde_json::to_value(DocPayload {
                    query: query.clone(),
                    variables: variables.clone(),
                })
                .expect("DocPayload always serializes")
            }
            PushEvent::Unsubscribe { subscription_id } => {
                serde_json::to_value(UnsubscribePayload {
                    subscription_id: subscription_id.clone(),
                })
                .expect("UnsubscribePayload always serializes")
            }
        }
    }
}

/// Where a sync push's caller is waiting for its first reply.
pub type SyncWaiter = oneshot::Sender<crate::PushOutcome>;

/// An outbound document or control message, plus the bookkeeping needed to
/// route its reply and any subscription data it creates.
///
/// A push record is in exactly one of `pending`, `in_flight`, or (if it
/// created a subscription) `active_subscriptions` at any time — see
/// Invariant 1 in SPEC_FULL.md §3.
#[derive(Debug, Clone)]
pub struct PushRecord {
    /// What this push does.
    pub event: PushEvent,
    /// The caller that owns this push.
    pub owner: CallerId,
    /// The caller's mailbox, used to deliver `Reply`/`Message` events.
    pub mailbox: mpsc::UnboundedSender<CallerEvent>,
    /// The caller-chosen correlation token, if any.
    pub caller_ref: Option<CallerRef>,
    /// Number of times this push has been transmitted on the wire. Bumped
    /// on every send; a reply is only forwarded to the caller when this was
    /// `1` at reply time (replays are silent).
    pub transmit_count: u32,
    /// Key into the actor's sync-waiter table, if a `push_sync` call is
    /// suspended on this push's first reply. Survives replay (the key is
    /// stable even though `push_ref` is reassigned on retransmission).
    pub waiter_id: Option<u64>,
}

impl PushRecord {
    /// Create a push record that has not yet been transmitted
    /// (`transmit_count == 0`, per Invariant 5).
    pub fn new(
        event: PushEvent,
        owner: CallerId,
        mailbox: mpsc::UnboundedSender<CallerEvent>,
        caller_ref: Option<CallerRef>,
    ) -> Self {
        Self {
            event,
            owner,
            mailbox,
            caller_ref,
            transmit_count: 0,
            waiter_id: None,
        }
    }

    /// Attach a sync-waiter key, for a push made through `push_sync`.
    pub fn with_waiter_id(mut self, waiter_id: u64) -> Self {
        self.waiter_id = Some(waiter_id);
        self
    }

    /// Whether this is a `doc` push (as opposed to `unsubscribe`).
    pub fn is_doc(&self) -> bool {
        matches!(self.event, PushEvent::Doc { .. })
    }
}
