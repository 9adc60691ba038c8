//! The connection driver: owns the single underlying WebSocket and the
//! control-channel join, with exponential-backoff reconnect. SPEC_FULL.md
//! §4.1/§4.2.

use finito::ExponentialBackoff;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::config::Config;
use crate::wire::{InboundFrame, OutboundFrame, CONTROL_TOPIC, JOIN_EVENT};
use crate::Error;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// The sending half of an established socket.
pub(crate) struct Sink {
    inner: SplitSink<WsStream, WsMessage>,
}

/// The receiving half of an established socket.
pub(crate) struct Source {
    inner: SplitStream<WsStream>,
}

impl Sink {
    /// Serialize and send a single outbound frame.
    pub(crate) async fn send(&mut self, frame: &OutboundFrame) -> Result<(), Error> {
        let text = serde_json::to_string(frame).expect("OutboundFrame always serializes");
        self.inner
            .send(WsMessage::Text(text))
            .await
            .map_err(|e| Error::Transport(Box::new(e)))
    }
}

impl Source {
    /// Receive and parse the next inbound frame. Returns `Ok(None)` when
    /// the socket closed without error.
    pub(crate) async fn recv(&mut self) -> Result<Option<InboundFrame>, Error> {
        loop {
            let msg = match self.inner.next().await {
                None => return Ok(None),
                Some(Ok(msg)) => msg,
                Some(Err(e)) => return Err(Error::Transport(Box::new(e))),
            };

            match msg {
                WsMessage::Text(text) => {
                    let frame: InboundFrame = serde_json::from_str(&text)?;
                    return Ok(Some(frame));
                }
                WsMessage::Close(_) => return Ok(None),
                // Pings/pongs/binary frames carry no protocol meaning here.
                _ => continue,
            }
        }
    }
}

/// Whether the upgrade was refused with an authentication-level status,
/// distinguished from any other transport failure (SPEC_FULL.md §7's
/// `UnauthorizedUpgrade`).
pub(crate) fn is_unauthorized_upgrade(err: &tokio_tungstenite::tungstenite::Error) -> bool {
    use tokio_tungstenite::tungstenite::Error as WsError;
    matches!(
        err,
        WsError::Http(resp) if resp.status() == 401 || resp.status() == 403
    )
}

/// The outcome of a single dial attempt, distinguishing an authentication
/// failure (which warrants an immediate `connect_params` refresh) from any
/// other transport error (which just waits out the backoff).
pub(crate) enum DialError {
    /// The upgrade was refused with a 401/403.
    Unauthorized,
    /// Any other failure.
    Other(Error),
}

impl From<Error> for DialError {
    fn from(e: Error) -> Self {
        DialError::Other(e)
    }
}

/// Dial the endpoint once, attaching configured headers, and join the
/// control channel. Returns the split socket halves plus the `join_ref`
/// that was used, so the caller can correlate the join reply.
pub(crate) async fn connect_and_join(
    config: &Config,
    reconnect_count: u64,
) -> Result<(Sink, Source, String), DialError> {
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    let uri = config.resolve_uri(reconnect_count)?;

    let mut request = uri
        .as_str()
        .into_client_request()
        .map_err(|e| Error::ConfigurationInvalid(e.to_string()))?;
    for header in config.headers() {
        use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};

        let name: HeaderName = header
            .name
            .parse()
            .map_err(|_| Error::ConfigurationInvalid(format!("invalid header name: {}", header.name)))?;
        let value: HeaderValue = header
            .value
            .parse()
            .map_err(|_| Error::ConfigurationInvalid(format!("invalid header value: {}", header.value)))?;
        request.headers_mut().insert(name, value);
    }

    let stream = match tokio_tungstenite::connect_async(request).await {
        Ok((stream, _response)) => stream,
        Err(e) if is_unauthorized_upgrade(&e) => return Err(DialError::Unauthorized),
        Err(e) => return Err(Error::Transport(Box::new(e)).into()),
    };

    let (sink_half, source_half) = stream.split();
    let mut sink = Sink { inner: sink_half };
    let mut source = Source { inner: source_half };

    let join_ref = "join-1".to_string();
    let join_frame = OutboundFrame {
        join_ref: join_ref.clone(),
        push_ref: join_ref.clone(),
        topic: CONTROL_TOPIC.to_string(),
        event: JOIN_EVENT.to_string(),
        payload: json!({}),
    };
    sink.send(&join_frame).await?;

    loop {
        let frame = source
            .recv()
            .await?
            .ok_or_else(|| Error::Transport("socket closed while waiting for join reply".into()))?;
        if frame.topic != CONTROL_TOPIC {
            continue;
        }
        if frame.event != crate::wire::REPLY_EVENT {
            continue;
        }
        let payload: crate::wire::ReplyPayload =
            serde_json::from_value(frame.payload).map_err(Error::Deserialization)?;
        return match payload.status {
            crate::wire::ReplyStatus::Ok => Ok((sink, source, join_ref)),
            crate::wire::ReplyStatus::Error => Err(DialError::Other(Error::Transport(
                "server rejected control channel join".into(),
            ))),
        };
    }
}

/// Connect with exponential-backoff retry, refreshing `connect_params`
/// (e.g. for a token) once immediately after an unauthorized upgrade before
/// falling back to the normal schedule (SPEC_FULL.md §4.1/§7).
///
/// Takes `config` and the starting `reconnect_count` by value: the returned
/// future owns everything it needs and borrows nothing from its caller, so
/// the actor can stash it in a field and keep polling it across other
/// `select!` branches (caller commands, inbound frames) instead of blocking
/// on it up front.
pub(crate) async fn connect_with_backoff(
    config: Config,
    mut reconnect_count: u64,
) -> Result<(Sink, Source, String), Error> {
    let mut backoff = ExponentialBackoff::from_millis(200);
    let mut just_refreshed_on_unauthorized = false;

    loop {
        match connect_and_join(&config, reconnect_count).await {
            Ok(result) => return Ok(result),
            Err(DialError::Unauthorized) if !just_refreshed_on_unauthorized => {
                tracing::warn!(
                    attempt = reconnect_count,
                    "upgrade unauthorized, refreshing connect_params immediately"
                );
                reconnect_count += 1;
                just_refreshed_on_unauthorized = true;
            }
            Err(DialError::Unauthorized) => {
                just_refreshed_on_unauthorized = false;
                tracing::warn!(
                    attempt = reconnect_count,
                    "upgrade unauthorized again after refresh, falling back to backoff"
                );
                reconnect_count += 1;
                let delay = backoff.next().unwrap_or(std::time::Duration::from_secs(30));
                tokio::time::sleep(delay).await;
            }
            Err(DialError::Other(err @ Error::ConfigurationInvalid(_))) => {
                tracing::error!(error = %err, "configuration invalid, refusing to start");
                return Err(err);
            }
            Err(DialError::Other(err)) => {
                just_refreshed_on_unauthorized = false;
                tracing::warn!(error = %err, attempt = reconnect_count, "connect attempt failed");
                reconnect_count += 1;
                let delay = backoff.next().unwrap_or(std::time::Duration::from_secs(30));
                tokio::time::sleep(delay).await;
            }
        }
    }
}
