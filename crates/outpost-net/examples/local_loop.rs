//! Headless server + two clients in one process over the memory transport.
//!
//! Run with:
//!   cargo run --example local_loop -p outpost-net
//!
//! Ripley walks east for two seconds while Dallas stands still; both replicas
//! print what they see at the end.

use anyhow::Result;
use outpost_net::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let hub = MemoryHub::new();
    let mut ripley = Client::new(hub.connect());
    let mut dallas = Client::new(hub.connect());
    let mut server = Server::new(hub, ServerConfig::default());

    ripley.connect("", "Ripley")?;
    dallas.connect("", "Dallas")?;

    let dt = 1.0 / 30.0;
    for tick in 0..60 {
        if matches!(ripley.state(), ClientState::Connected { .. }) && tick < 50 {
            ripley.send_input(1.0, 0.0)?;
        }
        server.tick(dt)?;
        for client in [&mut ripley, &mut dallas] {
            client.poll()?;
            client.apply_pending();
        }
        for event in server.drain_events() {
            tracing::info!(?event, "server event");
        }
    }

    ripley.send_chat("made it to the east corridor")?;
    server.tick(dt)?;
    dallas.poll()?;

    for (name, client) in [("Ripley", &ripley), ("Dallas", &dallas)] {
        println!("-- {name}'s replica --");
        for (entity, transform) in client.world().transforms.iter() {
            println!(
                "  {entity:?} at ({:.2}, {:.2})",
                transform.position.x, transform.position.y
            );
        }
    }
    if let Some((sender, text)) = dallas.chat_log().last() {
        println!("Dallas heard {sender}: {text}");
    }
    Ok(())
}
