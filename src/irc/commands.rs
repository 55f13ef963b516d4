//! Bot command extraction from channel messages.
//!
//! A channel message `!seen Bob > Alice` is a command: prefix `!`, command
//! word `seen`, argument text `Bob`, and result target `Alice`. Without a
//! pipe the result goes back to whoever issued the command.
//!
//! Matching is a fixed tokenizing rule rather than a pattern search:
//! - the message starts with the prefix, immediately followed by a
//!   non-whitespace command word (split at the first whitespace);
//! - the last occurrence of the pipe in the remaining text separates the
//!   argument text from the target, but only if what follows it is a single
//!   word; otherwise the pipe is ordinary argument text.

use std::fmt;

use crate::event::{Arg, Event};
use crate::irc::manager::WeakClient;
use crate::irc::parser::parse_userinfo;

/// A command recognised in a channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChanCommand {
    /// Lower-cased command word.
    pub command: String,
    /// Text after the command word, trimmed. May be empty.
    pub argument_text: String,
    /// Piped target, or `None` when the message had no valid pipe.
    pub piped_target: Option<String>,
}

/// Parse `message` as a bot command. Returns `None` for ordinary chatter.
pub fn parse_chan_command(message: &str, prefix: &str, pipe: &str) -> Option<ChanCommand> {
    if prefix.is_empty() {
        return None;
    }
    let rest = message.strip_prefix(prefix)?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }

    let (word, remainder) = rest
        .split_once(char::is_whitespace)
        .unwrap_or((rest, ""));
    if word.is_empty() {
        return None;
    }

    let (argument_text, piped_target) = split_pipe(remainder, pipe);
    Some(ChanCommand {
        command: word.to_lowercase(),
        argument_text: argument_text.trim().to_string(),
        piped_target: piped_target.map(str::to_string),
    })
}

fn split_pipe<'a>(text: &'a str, pipe: &str) -> (&'a str, Option<&'a str>) {
    if pipe.is_empty() {
        return (text, None);
    }
    match text.rsplit_once(pipe) {
        Some((before, after)) => {
            let target = after.trim();
            if target.is_empty() || target.contains(char::is_whitespace) {
                (text, None)
            } else {
                (before, Some(target))
            }
        }
        None => (text, None),
    }
}

/// Replies to a channel command, addressed to its result target.
#[derive(Clone)]
pub struct Responder {
    client: WeakClient,
    channel: String,
    target: String,
}

impl Responder {
    pub(crate) fn new(client: WeakClient, channel: &str, target: &str) -> Self {
        Self {
            client,
            channel: channel.to_string(),
            target: target.to_string(),
        }
    }

    /// Send `PRIVMSG <channel> :<target>: <text>`. Dropped like any other
    /// send if the client is gone or no longer connected.
    pub fn respond(&self, text: &str) {
        if let Some(client) = self.client.upgrade() {
            client.send(&format!("PRIVMSG {} :{}: {}", self.channel, self.target, text));
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("channel", &self.channel)
            .field("target", &self.target)
            .finish()
    }
}

/// Turns `chanmsg` events into `chancmd` and `chancmd:<command>` events.
pub struct CommandRouter {
    prefix: String,
    pipe: String,
}

impl CommandRouter {
    pub fn new(prefix: &str, pipe: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            pipe: pipe.to_string(),
        }
    }

    /// Build the two command events for a `chanmsg(from, channel, message)`,
    /// or nothing if the message is not a command.
    pub fn route(&self, chanmsg: &Event, client: &WeakClient) -> Option<[Event; 2]> {
        let &[from, channel, message, ..] = chanmsg.texts().as_slice() else {
            return None;
        };
        let parsed = parse_chan_command(message, &self.prefix, &self.pipe)?;
        let target = parsed
            .piped_target
            .unwrap_or_else(|| parse_userinfo(from).nick);
        let responder = Responder::new(client.clone(), channel, &target);

        let generic = Event::new(
            "chancmd",
            vec![
                from.into(),
                channel.into(),
                parsed.command.as_str().into(),
                parsed.argument_text.as_str().into(),
                target.as_str().into(),
                Arg::Respond(responder.clone()),
            ],
        );
        let specific = Event::new(
            format!("chancmd:{}", parsed.command),
            vec![
                from.into(),
                channel.into(),
                parsed.argument_text.into(),
                target.into(),
                Arg::Respond(responder),
            ],
        );
        Some([generic, specific])
    }
}
