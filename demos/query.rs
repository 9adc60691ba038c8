//! Runs a single query synchronously and prints its reply.

use absinthe_client::{Config, Session};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::new("ws://localhost:4000/socket/websocket")?;
    let session = Session::connect(config, std::future::pending()).await?;
    let (caller, _events) = session.register_caller();

    let outcome = session
        .query(
            &caller,
            "query { post(id: \"1\") { id title } }",
            Some(json!({})),
        )
        .await;

    println!("{outcome:?}");
    Ok(())
}
