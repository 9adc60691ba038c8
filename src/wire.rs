//! The JSON envelope used on the wire, and the fixed control topic.
//!
//! Every outbound document or control message travels on [`CONTROL_TOPIC`];
//! see SPEC_FULL.md §4.2 and §6.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The single topic joined once per (re)connect. All outbound documents and
/// control messages travel on it.
pub const CONTROL_TOPIC: &str = "__absinthe__:control";

/// The event name used to join [`CONTROL_TOPIC`].
pub const JOIN_EVENT: &str = "phx_join";

/// The event name for a push that submits a GraphQL document.
pub const DOC_EVENT: &str = "doc";

/// The event name for a push that tears down an active subscription.
pub const UNSUBSCRIBE_EVENT: &str = "unsubscribe";

/// The event name the server uses for inbound replies.
pub const REPLY_EVENT: &str = "phx_reply";

/// The event name the server uses for inbound subscription data frames.
pub const SUBSCRIPTION_DATA_EVENT: &str = "subscription:data";

/// An outbound frame: `{ join_ref, push_ref, topic, event, payload }`.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundFrame {
    pub join_ref: String,
    #[serde(rename = "ref")]
    pub push_ref: String,
    pub topic: String,
    pub event: String,
    pub payload: Value,
}

/// An inbound frame in the same envelope shape.
///
/// Replies arrive on the `push_ref` the client assigned when transmitting;
/// server-pushed subscription data arrives on a `topic` equal to the
/// `subscriptionId`, with `event = "subscription:data"`.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    #[allow(dead_code)]
    pub join_ref: Option<String>,
    #[serde(rename = "ref")]
    pub push_ref: Option<String>,
    pub topic: String,
    pub event: String,
    pub payload: Value,
}

/// The `payload` of a `phx_reply` frame.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyPayload {
    pub status: ReplyStatus,
    #[serde(default)]
    pub response: Value,
}

/// The `status` field of a reply payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Error,
}

/// The `doc` push payload: `{ query, variables }`.
#[derive(Debug, Clone, Serialize)]
pub struct DocPayload {
    pub query: String,
    pub variables: Value,
}

/// The `unsubscribe` push payload: `{ subscriptionId }`.
#[derive(Debug, Clone, Serialize)]
pub struct UnsubscribePayload {
    #[serde(rename = "subscriptionId")]
    pub subscription_id: String,
}

/// Extract `response.subscriptionId` from a successful `doc` reply, if any.
pub fn subscription_id_of(response: &Value) -> Option<String> {
    response.get("subscriptionId")?.as_str().map(str::to_owned)
}
