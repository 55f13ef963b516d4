//! Diagnostic logging setup.
//!
//! The engine logs through `tracing`; this module installs the process-wide
//! subscriber for the binary and can mirror every published event into the
//! log for debugging.

use anyhow::{anyhow, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::event::Arg;
use crate::irc::manager::Client;

/// Install the global `tracing` subscriber. `RUST_LOG` takes precedence;
/// otherwise the level is `debug` when `debug_logging` is set, else `info`.
pub fn init(debug_logging: bool) -> Result<()> {
    let default_level = if debug_logging { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))
}

/// Log every event `client` publishes at debug level.
pub fn trace_events(client: &Client) {
    client.on_any(|event| {
        let args: Vec<String> = event
            .args()
            .iter()
            .map(|arg| match arg {
                Arg::Text(text) => format!("{:?}", text),
                Arg::Respond(_) => "<respond>".to_string(),
            })
            .collect();
        debug!(target: "ircbot::events", "{}({})", event.name(), args.join(", "));
    });
}
