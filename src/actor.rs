//! The session actor: a single task that owns the socket, the join state,
//! and every registry, driven by one `tokio::select!` over inbound frames,
//! caller commands, and the owner-down future. SPEC_FULL.md §4.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::connection::{self, Sink, Source};
use crate::events::{CallerEvent, PushOutcome, ReplyStatus as CallerReplyStatus};
use crate::push::{CallerId, PushRecord, SyncWaiter};
use crate::registry::{InFlight, Pending, Subscriptions};
use crate::session::Command;
use crate::wire::{self, InboundFrame, OutboundFrame};

type OwnerDone = Pin<Box<dyn Future<Output = ()> + Send>>;
type ConnectFut = Pin<Box<dyn Future<Output = Result<(Sink, Source, String), crate::Error>> + Send>>;

/// Spawn the actor task. Returns immediately; the task runs until the
/// owner-down future resolves, a [`Command::Shutdown`] arrives, or every
/// [`crate::Session`]/command sender is dropped.
pub(crate) fn spawn(
    config: Config,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    owner_done: OwnerDone,
) {
    let actor = Actor {
        config,
        cmd_rx,
        cmd_tx,
        owner_done,
        sink: None,
        source: None,
        connect_fut: None,
        channel_joined: false,
        join_ref: String::new(),
        next_push_ref: 1,
        reconnect_count: 0,
        in_flight: InFlight::default(),
        subs: Subscriptions::default(),
        pending: Pending::default(),
        sync_waiters: HashMap::new(),
        next_waiter_id: 1,
    };
    tokio::spawn(actor.run());
}

struct Actor {
    config: Config,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    owner_done: OwnerDone,
    sink: Option<Sink>,
    source: Option<Source>,
    connect_fut: Option<ConnectFut>,
    channel_joined: bool,
    join_ref: String,
    next_push_ref: u64,
    reconnect_count: u64,
    in_flight: InFlight,
    subs: Subscriptions,
    pending: Pending,
    sync_waiters: HashMap<u64, SyncWaiter>,
    next_waiter_id: u64,
}

impl Actor {
    async fn run(mut self) {
        loop {
            // Kick off (or keep driving) a connect attempt whenever there is
            // no live socket. This is a branch in the select below rather
            // than a blocking await up front, so caller commands — in
            // particular a `push_sync`'s bounded join-wait retry — are still
            // serviced while the control channel is not yet joined, instead
            // of starving behind a single blocking connect call.
            if self.source.is_none() && self.connect_fut.is_none() {
                self.connect_fut = Some(Box::pin(connection::connect_with_backoff(
                    self.config.clone(),
                    self.reconnect_count,
                )));
            }

            tokio::select! {
                biased;

                _ = &mut self.owner_done => {
                    tracing::debug!("owner terminated, shutting down session");
                    return;
                }

                result = Self::poll_connecting(&mut self.connect_fut) => {
                    self.connect_fut = None;
                    match result {
                        Ok((sink, source, join_ref)) => {
                            tracing::debug!(join_ref = %join_ref, "control channel joined");
                            self.sink = Some(sink);
                            self.source = Some(source);
                            self.join_ref = join_ref;
                            self.channel_joined = true;
                            self.next_push_ref = 1;
                            self.reconnect_count = 0;
                            self.rejoin().await;
                        }
                        Err(err) => {
                            // connect_with_backoff only returns an Err for a
                            // fatal, non-retryable failure (e.g. invalid
                            // configuration); it otherwise retries forever
                            // internally. Such a failure surfaces here once
                            // and ends the actor rather than looping forever.
                            tracing::error!(error = %err, "session cannot connect, shutting down");
                            return;
                        }
                    }
                }

                frame = Self::recv_frame(&mut self.source) => {
                    match frame {
                        Ok(Some(frame)) => self.dispatch(frame),
                        Ok(None) => self.handle_disconnect(),
                        Err(err) => {
                            tracing::warn!(error = %err, "transport error, reconnecting");
                            self.handle_disconnect();
                        }
                    }
                }

                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(Command::Shutdown) => {
                            tracing::debug!("shutdown requested");
                            return;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            tracing::debug!("every session handle dropped, shutting down");
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn recv_frame(source: &mut Option<Source>) -> Result<Option<InboundFrame>, crate::Error> {
        match source {
            Some(source) => source.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Drive the in-flight connect attempt, if any, or block forever so this
    /// branch never wins the `select!` while there is nothing to connect.
    /// The future itself lives in `self.connect_fut` and is polled again on
    /// each call, so earlier progress (backoff timers, partial handshakes)
    /// is preserved across loop iterations instead of being restarted.
    async fn poll_connecting(connect_fut: &mut Option<ConnectFut>) -> Result<(Sink, Source, String), crate::Error> {
        match connect_fut {
            Some(fut) => fut.as_mut().await,
            None => std::future::pending().await,
        }
    }

    fn handle_disconnect(&mut self) {
        self.sink = None;
        self.source = None;
        self.channel_joined = false;

        // Anything still in-flight never confirmed a subscription, so it is
        // not replayed; its sync waiter (if any) just times out here rather
        // than leaking in the table forever.
        for stale in self.in_flight.drain() {
            if let Some(waiter_id) = stale.waiter_id {
                if let Some(waiter) = self.sync_waiters.remove(&waiter_id) {
                    let _ = waiter.send(PushOutcome::Timeout);
                }
            }
        }

        let replayed = self.subs.drain_for_replay();
        tracing::warn!(count = replayed.len(), "disconnected, requeuing active subscriptions");
        for record in replayed {
            self.pending.push(record);
        }
    }

    /// Drain the pending queue onto the freshly joined channel (SPEC_FULL.md
    /// §4.5/§4.6).
    async fn rejoin(&mut self) {
        let queued = self.pending.drain();
        tracing::debug!(count = queued.len(), "transmitting queued pushes");
        for record in queued {
            self.transmit(record).await;
        }
    }

    fn next_ref(&mut self) -> String {
        let push_ref = self.next_push_ref.to_string();
        self.next_push_ref += 1;
        push_ref
    }

    async fn transmit(&mut self, mut record: PushRecord) {
        let Some(sink) = self.sink.as_mut() else {
            self.pending.push(record);
            return;
        };

        let push_ref = self.next_ref();
        let frame = OutboundFrame {
            join_ref: self.join_ref.clone(),
            push_ref: push_ref.clone(),
            topic: wire::CONTROL_TOPIC.to_string(),
            event: record.event.wire_event().to_string(),
            payload: record.event.payload(),
        };

        record.transmit_count += 1;
        if let Err(err) = sink.send(&frame).await {
            tracing::warn!(error = %err, "send failed, requeuing and reconnecting");
            record.transmit_count -= 1;
            self.pending.push(record);
            self.handle_disconnect();
            return;
        }

        self.in_flight.insert(push_ref, record);
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Push {
                token,
                event,
                owner,
                mailbox,
                caller_ref,
            } => {
                tracing::trace!(token = token.0, "push_async");
                let record = PushRecord::new(event, owner, mailbox, caller_ref);
                if self.channel_joined {
                    self.transmit(record).await;
                } else {
                    self.pending.push(record);
                }
            }

            Command::PushSync {
                event,
                owner,
                mailbox,
                caller_ref,
                attempts_remaining,
                reply,
            } => {
                if self.channel_joined {
                    let waiter_id = self.next_waiter_id;
                    self.next_waiter_id += 1;
                    self.sync_waiters.insert(waiter_id, reply);
                    let record =
                        PushRecord::new(event, owner, mailbox, caller_ref).with_waiter_id(waiter_id);
                    self.transmit(record).await;
                } else if attempts_remaining == 0 {
                    let _ = reply.send(PushOutcome::NotJoined);
                } else {
                    let cmd_tx = self.cmd_tx.clone();
                    let interval = self.config.join_wait_interval();
                    tokio::spawn(async move {
                        tokio::time::sleep(interval).await;
                        let _ = cmd_tx.send(Command::PushSync {
                            event,
                            owner,
                            mailbox,
                            caller_ref,
                            attempts_remaining: attempts_remaining - 1,
                            reply,
                        });
                    });
                }
            }

            Command::UnsubscribeAll { owner, caller_ref } => {
                self.unsubscribe_all(owner, caller_ref).await;
            }

            // Intercepted in `run`'s select before reaching here.
            Command::Shutdown => unreachable!(),
        }
    }

    async fn unsubscribe_all(&mut self, owner: CallerId, caller_ref: Option<crate::push::CallerRef>) {
        let owned = self.subs.remove_all_for_owner(owner);
        for (subscription_id, record) in owned {
            let unsub = PushRecord::new(
                crate::push::PushEvent::Unsubscribe { subscription_id },
                record.owner,
                record.mailbox,
                caller_ref.clone(),
            );
            if self.channel_joined {
                self.transmit(unsub).await;
            } else {
                self.pending.push(unsub);
            }
        }
    }

    fn dispatch(&mut self, frame: InboundFrame) {
        if frame.topic == wire::CONTROL_TOPIC && frame.event == wire::REPLY_EVENT {
            self.dispatch_reply(frame);
        } else if frame.event == wire::SUBSCRIPTION_DATA_EVENT {
            self.dispatch_subscription_data(frame);
        } else {
            tracing::trace!(topic = %frame.topic, event = %frame.event, "ignoring unrecognized frame");
        }
    }

    fn dispatch_reply(&mut self, frame: InboundFrame) {
        let Some(push_ref) = frame.push_ref else {
            tracing::trace!("phx_reply with no ref, ignoring");
            return;
        };
        let Some(record) = self.in_flight.remove(&push_ref) else {
            tracing::warn!(push_ref = %push_ref, "reply for unknown push-ref, dropping");
            return;
        };

        let payload: wire::ReplyPayload = match serde_json::from_value(frame.payload) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "malformed reply payload, dropping");
                return;
            }
        };

        let status = match payload.status {
            wire::ReplyStatus::Ok => CallerReplyStatus::Ok,
            wire::ReplyStatus::Error => CallerReplyStatus::Error,
        };

        if payload.status == wire::ReplyStatus::Ok && record.is_doc() {
            if let Some(subscription_id) = wire::subscription_id_of(&payload.response) {
                tracing::debug!(subscription_id = %subscription_id, "subscription created");
                self.subs.insert(subscription_id, record.clone());
            }
        }

        if record.transmit_count == 1 {
            self.forward_reply(&record, status, payload.response, push_ref);
        } else {
            tracing::trace!(push_ref = %push_ref, "suppressing reply for replayed push");
        }
    }

    fn forward_reply(
        &mut self,
        record: &PushRecord,
        status: CallerReplyStatus,
        payload: serde_json::Value,
        push_ref: String,
    ) {
        if let Some(waiter_id) = record.waiter_id {
            if let Some(waiter) = self.sync_waiters.remove(&waiter_id) {
                let _ = waiter.send(PushOutcome::Reply {
                    status,
                    payload: payload.clone(),
                });
            }
        }
        if record.caller_ref.is_some() {
            let _ = record.mailbox.send(CallerEvent::Reply {
                event: record.event.wire_event(),
                status,
                payload,
                caller_ref: record.caller_ref.clone(),
                push_ref,
            });
        }
    }

    fn dispatch_subscription_data(&mut self, frame: InboundFrame) {
        let Some(record) = self.subs.get(&frame.topic) else {
            tracing::warn!(subscription_id = %frame.topic, "data for unknown subscription, dropping");
            return;
        };
        let _ = record.mailbox.send(CallerEvent::Message {
            topic: frame.topic,
            event: wire::SUBSCRIPTION_DATA_EVENT,
            payload: frame.payload,
            caller_ref: record.caller_ref.clone(),
        });
    }
}
