//! Connection configuration.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::Error;

/// The default timeout used for [`crate::Session::push_sync`] when no
/// explicit timeout is given.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(15_000);

pub(crate) const JOIN_WAIT_ATTEMPTS: u32 = 5;
pub(crate) const JOIN_WAIT_INTERVAL: Duration = Duration::from_millis(150);

/// A literal map of query-string parameters, or a producer of one.
///
/// Evaluated fresh on every connect attempt so a producer can hand back a
/// refreshed short-lived credential. See the `connect_params` entry in
/// SPEC_FULL.md §6.
#[derive(Clone)]
pub enum ConnectParams {
    /// A fixed set of parameters, unpacked into the WebSocket URI's query
    /// string on every (re)connect.
    Static(Map<String, Value>),
    /// A zero-argument producer, called on every connect attempt.
    Fn(Arc<dyn Fn() -> Result<Map<String, Value>, Error> + Send + Sync>),
    /// A producer taking the reconnect counter (0 on the first connect),
    /// called on every connect attempt.
    FnWithCount(Arc<dyn Fn(u64) -> Result<Map<String, Value>, Error> + Send + Sync>),
}

impl ConnectParams {
    /// Evaluate the params for the given reconnect attempt counter.
    pub(crate) fn evaluate(&self, reconnect_count: u64) -> Result<Map<String, Value>, Error> {
        match self {
            ConnectParams::Static(map) => Ok(map.clone()),
            ConnectParams::Fn(f) => f(),
            ConnectParams::FnWithCount(f) => f(reconnect_count),
        }
    }
}

impl Default for ConnectParams {
    fn default() -> Self {
        ConnectParams::Static(Map::new())
    }
}

impl std::fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectParams::Static(map) => f.debug_tuple("Static").field(map).finish(),
            ConnectParams::Fn(_) => f.write_str("Fn(..)"),
            ConnectParams::FnWithCount(_) => f.write_str("FnWithCount(..)"),
        }
    }
}

/// A single header name/value pair attached to the WebSocket upgrade
/// request verbatim.
#[derive(Debug, Clone)]
pub struct Header {
    /// The header name.
    pub name: String,
    /// The header value.
    pub value: String,
}

/// Configuration accepted by [`crate::Session::connect`].
///
/// Mirrors the "Configuration surface" recognized options in SPEC_FULL.md §6.
#[derive(Debug, Clone)]
pub struct Config {
    uri: url::Url,
    headers: Vec<Header>,
    connect_params: ConnectParams,
    receive_timeout: Duration,
    join_wait_attempts: u32,
    join_wait_interval: Duration,
}

impl Config {
    /// Start building a [`Config`] for the given WebSocket endpoint.
    ///
    /// Returns [`Error::ConfigurationInvalid`] if `uri` cannot be parsed, or
    /// is not a `ws://`/`wss://` URL.
    pub fn new(uri: impl AsRef<str>) -> Result<Self, Error> {
        let uri = url::Url::parse(uri.as_ref())
            .map_err(|e| Error::ConfigurationInvalid(format!("invalid uri: {e}")))?;

        if uri.scheme() != "ws" && uri.scheme() != "wss" {
            return Err(Error::ConfigurationInvalid(format!(
                "uri must use the ws:// or wss:// scheme, got {:?}",
                uri.scheme()
            )));
        }

        Ok(Self {
            uri,
            headers: Vec::new(),
            connect_params: ConnectParams::default(),
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            join_wait_attempts: JOIN_WAIT_ATTEMPTS,
            join_wait_interval: JOIN_WAIT_INTERVAL,
        })
    }

    /// Attach headers to the WebSocket upgrade request.
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = Header>) -> Self {
        self.headers = headers.into_iter().collect();
        self
    }

    /// Set a literal map of connect params, merged into the query string on
    /// every connect attempt.
    pub fn with_connect_params(mut self, params: Map<String, Value>) -> Self {
        self.connect_params = ConnectParams::Static(params);
        self
    }

    /// Set a zero-argument producer of connect params, re-evaluated on
    /// every connect attempt.
    pub fn with_connect_params_fn<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<Map<String, Value>, Error> + Send + Sync + 'static,
    {
        self.connect_params = ConnectParams::Fn(Arc::new(f));
        self
    }

    /// Set a producer of connect params that receives the reconnect
    /// counter, re-evaluated on every connect attempt.
    pub fn with_connect_params_fn_count<F>(mut self, f: F) -> Self
    where
        F: Fn(u64) -> Result<Map<String, Value>, Error> + Send + Sync + 'static,
    {
        self.connect_params = ConnectParams::FnWithCount(Arc::new(f));
        self
    }

    /// Override the default timeout used by [`crate::Session::push_sync`].
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Override the number of join-wait retries a sync push performs
    /// before the control channel becomes joined (default 5).
    pub fn with_join_wait(mut self, attempts: u32, interval: Duration) -> Self {
        self.join_wait_attempts = attempts;
        self.join_wait_interval = interval;
        self
    }

    pub(crate) fn uri(&self) -> &url::Url {
        &self.uri
    }

    pub(crate) fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub(crate) fn connect_params(&self) -> &ConnectParams {
        &self.connect_params
    }

    /// The default timeout for sync pushes.
    pub fn receive_timeout(&self) -> Duration {
        self.receive_timeout
    }

    pub(crate) fn join_wait_attempts(&self) -> u32 {
        self.join_wait_attempts
    }

    pub(crate) fn join_wait_interval(&self) -> Duration {
        self.join_wait_interval
    }

    /// Build the concrete URI to dial for the given reconnect attempt,
    /// merging `connect_params` into the existing query string.
    pub(crate) fn resolve_uri(&self, reconnect_count: u64) -> Result<url::Url, Error> {
        let params = self.connect_params.evaluate(reconnect_count)?;
        if params.is_empty() {
            return Ok(self.uri.clone());
        }

        let mut uri = self.uri.clone();
        {
            let mut pairs = uri.query_pairs_mut();
            for (key, value) in &params {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                pairs.append_pair(key, &value);
            }
        }
        Ok(uri)
    }
}
