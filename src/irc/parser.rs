//! Protocol line parser.
//!
//! A line is `[:source] COMMAND param* [:trailing text]`. The command (or
//! numeric) lower-cased becomes the event name; the event arguments are the
//! source followed by the parameters. `PING` is recognised before anything
//! else so the engine can answer it without publishing.

use thiserror::Error;

/// Result of parsing one protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// `PING <token>`: answer with `PONG <token>`.
    Ping(String),
    Message(ParsedLine),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Lower-cased command word or numeric reply code.
    pub event_name: String,
    /// Origin without its leading `:`; empty when the line had none.
    pub source: String,
    /// Middle parameters, then the trailing parameter if present.
    pub params: Vec<String>,
}

impl ParsedLine {
    /// Arguments of the named event: source, then params.
    pub fn event_args(&self) -> Vec<String> {
        std::iter::once(self.source.clone())
            .chain(self.params.iter().cloned())
            .collect()
    }

    /// Arguments of `raw:parsed`: event name, source, then params.
    pub fn parsed_args(&self) -> Vec<String> {
        std::iter::once(self.event_name.clone())
            .chain(self.event_args())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("PING without a token")]
    MissingPingToken,
    #[error("line has a source but no command")]
    MissingCommand,
}

/// Split `line` on whitespace, keeping each token's byte offset.
fn tokenize(line: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push((s, &line[s..]));
    }
    tokens
}

pub fn parse_line(line: &str) -> Result<Line, ParseError> {
    let tokens = tokenize(line);
    let (_, first) = *tokens.first().ok_or(ParseError::Empty)?;

    if first == "PING" {
        let (_, token) = *tokens.get(1).ok_or(ParseError::MissingPingToken)?;
        let token = token.strip_prefix(':').unwrap_or(token);
        return Ok(Line::Ping(token.to_string()));
    }

    let (source, command_index) = match first.strip_prefix(':') {
        Some(source) => (source, 1),
        None => ("", 0),
    };
    let (_, command) = *tokens.get(command_index).ok_or(ParseError::MissingCommand)?;

    let mut params = Vec::new();
    for &(offset, token) in &tokens[command_index + 1..] {
        if token.starts_with(':') {
            params.push(line[offset + 1..].to_string());
            break;
        }
        params.push(token.to_string());
    }

    Ok(Line::Message(ParsedLine {
        event_name: command.to_lowercase(),
        source: source.to_string(),
        params,
    }))
}

/// The parts of a `nick!username@host` origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
    pub nick: String,
    pub username: String,
    pub host: String,
}

/// Split a `nick!username@host` token. A bare server or nick name yields
/// only `nick`.
pub fn parse_userinfo(userinfo: &str) -> UserInfo {
    let (nick, rest) = userinfo.split_once('!').unwrap_or((userinfo, ""));
    let (username, host) = rest.split_once('@').unwrap_or((rest, ""));
    UserInfo {
        nick: nick.to_string(),
        username: username.to_string(),
        host: host.to_string(),
    }
}
