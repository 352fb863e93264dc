//! Send one message and print each recipient's outcome.
//!
//! ```text
//! cargo run --example demo -- <user-id> <password> <sender> <recipient>
//! ```
//!
//! Set `RUST_LOG=sendamatic=debug` to see the client's events.

use sendamatic::{Client, Message};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [user_id, password, sender, recipient] = args.as_slice() else {
        eprintln!("usage: demo <user-id> <password> <sender> <recipient>");
        std::process::exit(2);
    };

    let client = Client::builder(user_id, password)
        .timeout(Duration::from_secs(10))
        .build()?;

    let message = Message::new()
        .sender(sender)
        .add_to(recipient)
        .subject("Hello from sendamatic-rs")
        .text_body("Hello World")
        .html_body("<p>Hello <strong>World</strong></p>")
        .add_header("X-Mailer", "sendamatic-rs demo");

    let response = client.send(&message).await?;
    println!("envelope status: {}", response.status_code);

    for (address, outcome) in response.recipients() {
        match (outcome.status(), outcome.message_id()) {
            (Some(status), Some(id)) => println!("{address}: {status} ({id})"),
            _ => println!("{address}: unexpected entry {:?}", outcome.raw()),
        }
    }

    Ok(())
}
