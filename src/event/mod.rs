//! Events published by the engine and the bus that delivers them.
//!
//! Events are keyed by a free-form name: lower-cased protocol commands
//! (`privmsg`, `join`), numeric replies (`001`, `433`), and the engine's own
//! names (`raw`, `raw:parsed`, `botmsg`, `chanmsg`, `chancmd`,
//! `chancmd:<name>`, `connected`, `disconnected`, `error`).

pub mod bus;

pub use bus::{EventBus, SubscriptionId};

use crate::irc::commands::Responder;

/// One positional argument of an [`Event`].
#[derive(Debug, Clone)]
pub enum Arg {
    Text(String),
    /// Reply handle attached to `chancmd` events.
    Respond(Responder),
}

impl Arg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Text(text) => Some(text),
            Arg::Respond(_) => None,
        }
    }
}

impl From<String> for Arg {
    fn from(text: String) -> Self {
        Arg::Text(text)
    }
}

impl From<&str> for Arg {
    fn from(text: &str) -> Self {
        Arg::Text(text.to_string())
    }
}

/// A named emission with its ordered arguments.
#[derive(Debug, Clone)]
pub struct Event {
    name: String,
    args: Vec<Arg>,
}

impl Event {
    pub fn new(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Build an event whose arguments are all text.
    pub fn text<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, args.into_iter().map(|a| Arg::Text(a.into())).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Text of the argument at `index`, if it exists and is text.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(Arg::as_str)
    }

    /// All text arguments, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.args.iter().filter_map(Arg::as_str).collect()
    }

    pub fn responder(&self) -> Option<&Responder> {
        self.args.iter().find_map(|arg| match arg {
            Arg::Respond(responder) => Some(responder),
            Arg::Text(_) => None,
        })
    }
}
