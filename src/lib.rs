//! An event-driven IRC client engine for bots.
//!
//! A [`Client`] connects to one server, registers, answers `PING`, watches
//! for dead connections and publishes every protocol line as a named
//! [`Event`]. Channel messages of the form `!cmd args [> target]` are
//! republished as `chancmd` and `chancmd:<cmd>` events with a reply handle.
//!
//! ```no_run
//! use ircbot::{Client, Config};
//!
//! # async fn run() -> Result<(), ircbot::ClientError> {
//! let client = Client::new(Config::new("irc.libera.chat:6667", "rustbot"));
//! client.on("chancmd:ping", |event| {
//!     if let Some(responder) = event.responder() {
//!         responder.respond("pong");
//!     }
//! });
//! client.connect(None, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod irc;
pub mod logging;

pub use config::Config;
pub use error::ClientError;
pub use event::{Arg, Event, EventBus, SubscriptionId};
pub use irc::commands::{parse_chan_command, ChanCommand, Responder};
pub use irc::manager::{Client, WeakClient};
pub use irc::parser::{parse_line, parse_userinfo, Line, ParsedLine, UserInfo};
pub use irc::state::{ConnectionState, Phase};
