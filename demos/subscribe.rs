//! Opens a session against an Absinthe endpoint and prints every data frame
//! for a single subscription until the process is interrupted.

use absinthe_client::{Config, Session};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::new("ws://localhost:4000/socket/websocket")?;
    let session = Session::connect(config, std::future::pending()).await?;
    let (caller, mut events) = session.register_caller();

    session.subscribe(
        &caller,
        "subscription { commentAdded(postId: \"1\") { id body } }",
        None,
        json!("comment-added"),
    )?;

    while let Some(event) = events.recv().await {
        println!("{event:?}");
    }

    Ok(())
}
