//! The public handle onto a subscription session. SPEC_FULL.md §4.8.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::config::Config;
use crate::events::{CallerEvent, PushOutcome};
use crate::push::{CallerId, CallerRef, PushEvent};
use crate::Error;

/// An opaque handle returned by [`Session::push_async`], identifying the
/// push for diagnostic purposes. It does not need to be presented again —
/// replies and data are delivered to the caller's mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushToken(pub(crate) u64);

/// A caller registered with a [`Session`]: an owner identity plus the
/// mailbox that `Reply`/`Message` events for its pushes are delivered on.
#[derive(Debug, Clone)]
pub struct CallerHandle {
    id: CallerId,
    mailbox: mpsc::UnboundedSender<CallerEvent>,
}

impl CallerHandle {
    pub(crate) fn id(&self) -> CallerId {
        self.id
    }

    pub(crate) fn mailbox(&self) -> mpsc::UnboundedSender<CallerEvent> {
        self.mailbox.clone()
    }
}

/// Messages sent from [`Session`] handles to the session actor.
pub(crate) enum Command {
    Push {
        token: PushToken,
        event: PushEvent,
        owner: CallerId,
        mailbox: mpsc::UnboundedSender<CallerEvent>,
        caller_ref: Option<CallerRef>,
    },
    PushSync {
        event: PushEvent,
        owner: CallerId,
        mailbox: mpsc::UnboundedSender<CallerEvent>,
        caller_ref: Option<CallerRef>,
        attempts_remaining: u32,
        reply: oneshot::Sender<PushOutcome>,
    },
    UnsubscribeAll {
        owner: CallerId,
        caller_ref: Option<CallerRef>,
    },
    Shutdown,
}

/// A handle onto a running subscription session.
///
/// Cheaply `Clone`-able: every clone shares the same underlying actor task.
/// Dropping every [`Session`] handle (and every [`CallerHandle`]'s mailbox
/// receiver) does not itself stop the actor — only owner-down or an
/// explicit [`Session::shutdown`] does, per SPEC_FULL.md §4.8.
#[derive(Clone)]
pub struct Session {
    cmd_tx: mpsc::UnboundedSender<Command>,
    next_token: Arc<AtomicU64>,
    next_caller_id: Arc<AtomicU64>,
    receive_timeout: Duration,
    join_wait_attempts: u32,
}

impl Session {
    /// Connect and start the session actor.
    ///
    /// `owner_done` resolves when the owning caller terminates; once it
    /// resolves the session shuts down (SPEC_FULL.md §4.8's owner-down
    /// handler). Pass `std::future::pending()` for a session with no
    /// owner lifecycle to track.
    pub async fn connect(
        config: Config,
        owner_done: impl Future<Output = ()> + Send + 'static,
    ) -> Result<Self, Error> {
        let receive_timeout = config.receive_timeout();
        let join_wait_attempts = config.join_wait_attempts();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        crate::actor::spawn(config, cmd_rx, cmd_tx.clone(), Box::pin(owner_done));

        Ok(Self {
            cmd_tx,
            next_token: Arc::new(AtomicU64::new(1)),
            next_caller_id: Arc::new(AtomicU64::new(1)),
            receive_timeout,
            join_wait_attempts,
        })
    }

    /// Register a new caller with this session, returning its handle and
    /// the receiver end of its event mailbox.
    pub fn register_caller(&self) -> (CallerHandle, mpsc::UnboundedReceiver<CallerEvent>) {
        let id = CallerId(self.next_caller_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        (CallerHandle { id, mailbox: tx }, rx)
    }

    /// Submit a document asynchronously: the push is enqueued or
    /// transmitted immediately, and this call returns without waiting for
    /// a reply. If `caller_ref` is set, the eventual reply (and any
    /// subscription data it spawns) is delivered to `caller`'s mailbox.
    pub fn push_async(
        &self,
        caller: &CallerHandle,
        query: impl Into<String>,
        variables: Option<Value>,
        caller_ref: Option<CallerRef>,
    ) -> Result<PushToken, Error> {
        let token = PushToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let event = PushEvent::Doc {
            query: query.into(),
            variables: variables.unwrap_or(Value::Null),
        };
        self.cmd_tx
            .send(Command::Push {
                token,
                event,
                owner: caller.id(),
                mailbox: caller.mailbox(),
                caller_ref,
            })
            .map_err(|_| Error::ShutDown)?;
        Ok(token)
    }

    /// Submit a document and suspend until the first reply arrives, or
    /// `timeout` elapses (defaulting to the session's configured
    /// `receive_timeout`).
    ///
    /// If the control channel is not yet joined, retries a fixed number of
    /// times (5 attempts, 150ms apart) before failing with
    /// [`PushOutcome::NotJoined`].
    pub async fn push_sync(
        &self,
        caller: &CallerHandle,
        query: impl Into<String>,
        variables: Option<Value>,
        caller_ref: Option<CallerRef>,
        timeout: Option<Duration>,
    ) -> PushOutcome {
        let event = PushEvent::Doc {
            query: query.into(),
            variables: variables.unwrap_or(Value::Null),
        };
        let (reply_tx, reply_rx) = oneshot::channel();

        if self
            .cmd_tx
            .send(Command::PushSync {
                event,
                owner: caller.id(),
                mailbox: caller.mailbox(),
                caller_ref,
                attempts_remaining: self.join_wait_attempts,
                reply: reply_tx,
            })
            .is_err()
        {
            return PushOutcome::Timeout;
        }

        let timeout = timeout.unwrap_or(self.receive_timeout);
        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => PushOutcome::Timeout,
            Err(_) => PushOutcome::Timeout,
        }
    }

    /// Emit one `unsubscribe` push per subscription currently owned by
    /// `caller`, and drop local state for those subscriptions. A repeated
    /// call with nothing left to unsubscribe is a no-op.
    ///
    /// If `caller_ref` is set, the unsubscribe replies carry it so the
    /// caller can correlate them (delivered via `caller`'s mailbox).
    pub fn unsubscribe_all(
        &self,
        caller: &CallerHandle,
        caller_ref: Option<CallerRef>,
    ) -> Result<(), Error> {
        self.cmd_tx
            .send(Command::UnsubscribeAll {
                owner: caller.id(),
                caller_ref,
            })
            .map_err(|_| Error::ShutDown)
    }

    /// Shut the session down: cancels everything outstanding without any
    /// server-side cleanup guarantee.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
    }
}

// A couple of small convenience wrappers, layered directly on push_sync/
// push_async (SPEC_FULL.md §4.8's "ADDED" note) — not new core behavior.
impl Session {
    /// Run a query or mutation synchronously and return its reply.
    pub async fn query(
        &self,
        caller: &CallerHandle,
        query: impl Into<String>,
        variables: Option<Value>,
    ) -> PushOutcome {
        self.push_sync(caller, query, variables, None, None).await
    }

    /// Start a subscription, tagging it with `caller_ref` so its eventual
    /// data frames can be told apart from other subscriptions on the same
    /// caller.
    pub fn subscribe(
        &self,
        caller: &CallerHandle,
        query: impl Into<String>,
        variables: Option<Value>,
        caller_ref: Value,
    ) -> Result<PushToken, Error> {
        self.push_async(caller, query, variables, Some(caller_ref))
    }

    /// Turn a caller's mailbox into a [`Stream`], for callers that prefer
    /// combinator-style consumption (`StreamExt::filter_map`, `take_while`,
    /// ...) over polling `recv()` directly. The stream ends once the
    /// session drops the mailbox's sender, i.e. once the caller is
    /// unregistered or the session shuts down.
    pub fn events_stream(
        events: mpsc::UnboundedReceiver<CallerEvent>,
    ) -> impl Stream<Item = CallerEvent> {
        UnboundedReceiverStream::new(events)
    }
}
