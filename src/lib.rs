//! A client for GraphQL queries, mutations, and subscriptions over the
//! Absinthe/Phoenix channel WebSocket protocol.
//!
//! A [`Session`] owns a single WebSocket connection to an Absinthe endpoint,
//! joining its `__absinthe__:control` channel and reconnecting with
//! exponential backoff on any transport failure. Multiple callers can share
//! one session: each registers with [`Session::register_caller`] and
//! receives its own [`CallerEvent`] mailbox, so replies and subscription
//! data are delivered without any shared mutable state crossing task
//! boundaries.
//!
//! ```no_run
//! # async fn run() -> Result<(), absinthe_client::Error> {
//! use absinthe_client::{Config, Session};
//!
//! let config = Config::new("wss://example.com/socket/websocket")?;
//! let session = Session::connect(config, std::future::pending()).await?;
//! let (caller, mut events) = session.register_caller();
//!
//! session.push_async(
//!     &caller,
//!     "subscription { commentAdded(postId: \"1\") { id body } }",
//!     None,
//!     Some(serde_json::json!("comment-added")),
//! )?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod actor;
mod config;
mod connection;
mod error;
mod events;
mod push;
mod registry;
mod session;
mod wire;

pub use config::{Config, ConnectParams, Header};
pub use error::Error;
pub use events::{CallerEvent, PushOutcome, ReplyStatus};
pub use push::CallerRef;
pub use session::{CallerHandle, PushToken, Session};
