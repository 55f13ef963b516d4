use anyhow::Result;
use ircbot::config;
use ircbot::{logging, Client};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Grace period for the writer to flush `QUIT` before the runtime exits.
const QUIT_FLUSH: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::default_config_path);
    let cfg = config::load_config(&path)?;
    logging::init(cfg.debug_logging)?;
    info!(path = %path.display(), "Loaded configuration");

    let client = Client::new(cfg.clone());
    if cfg.debug_logging {
        logging::trace_events(&client);
    }

    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Option<String>>();
    client.on("disconnected", move |event| {
        let _ = done_tx.send(event.arg(0).map(str::to_string));
    });

    // Join configured channels once registered
    let weak = client.downgrade();
    let channels = cfg.channels.clone();
    client.on("connected", move |event| {
        info!(server = %event.arg(0).unwrap_or_default(), "Connected");
        if let Some(client) = weak.upgrade() {
            for channel in &channels {
                client.send(&format!("JOIN {}", channel));
            }
        }
    });

    client.on("botmsg", |event| {
        info!(
            from = %event.arg(0).unwrap_or_default(),
            "Private message: {}",
            event.arg(1).unwrap_or_default()
        );
    });
    client.on("chancmd", |event| {
        info!(
            from = %event.arg(0).unwrap_or_default(),
            channel = %event.arg(1).unwrap_or_default(),
            command = %event.arg(2).unwrap_or_default(),
            "Channel command"
        );
    });
    client.on("chancmd:ping", |event| {
        if let Some(responder) = event.responder() {
            responder.respond("pong");
        }
    });

    client.connect(None, None).await?;

    tokio::select! {
        reason = done_rx.recv() => {
            match reason.flatten() {
                Some(err) => warn!(error = %err, "Connection lost"),
                None => info!("Connection closed"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, quitting");
            if client.state().connected {
                client.disconnect(None);
                tokio::time::sleep(QUIT_FLUSH).await;
            }
        }
    }

    Ok(())
}
