//! The error type returned by this crate.

/// Errors that can occur while driving an [`crate::Session`].
///
/// Connection-layer failures (lost sockets, rejected upgrades) are recovered
/// internally by reconnecting and replaying subscriptions; they never reach
/// a caller as an [`Error`]. Correlation failures (an inbound frame whose
/// push-ref or subscription id is no longer known) are logged at `warn` and
/// dropped. Only the variants below are ever surfaced to callers.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A synchronous push exhausted its join-wait retries before the
    /// control channel became joined.
    #[error("push not sent: control channel is not joined")]
    NotJoined,

    /// A synchronous push received no reply within its deadline.
    #[error("push timed out waiting for a reply")]
    Timeout,

    /// The supplied `uri`/`connect_params` could not be turned into a valid
    /// connection configuration. The session refuses to start.
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),

    /// The owner of this session has terminated; the session is shutting
    /// down and will accept no further pushes.
    #[error("session owner has terminated")]
    OwnerDown,

    /// The session has been explicitly shut down.
    #[error("session is shut down")]
    ShutDown,

    /// An error from the underlying WebSocket transport.
    #[error("transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync + 'static>),

    /// A payload could not be deserialized from JSON.
    #[error("cannot deserialize payload: {0}")]
    Deserialization(#[from] serde_json::Error),
}
