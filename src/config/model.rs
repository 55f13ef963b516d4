//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence. Keys are
//! camelCase (`userName`, `commandPrefix`, ...). Every field except the server
//! host has a default so a minimal file only needs `[server] host`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::nickname::generate_nickname;

/// Root engine configuration. Immutable once handed to a [`Client`](crate::Client).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_nick")]
    pub nick: String,
    /// Falls back to `nick` when unset.
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default = "default_real_name")]
    pub real_name: String,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    #[serde(default = "default_command_pipe")]
    pub command_pipe: String,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default = "default_quit_message")]
    pub quit_message: String,
    /// Channels the `ircbot` binary joins once registered.
    #[serde(default)]
    pub channels: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            nick: default_nick(),
            user_name: None,
            real_name: default_real_name(),
            command_prefix: default_command_prefix(),
            command_pipe: default_command_pipe(),
            idle_timeout_seconds: default_idle_timeout(),
            debug_logging: false,
            quit_message: default_quit_message(),
            channels: Vec::new(),
        }
    }
}

impl Config {
    /// Build a config from a `host[:port]` address and a nickname, leaving
    /// every other option at its default.
    pub fn new(address: &str, nick: &str) -> Self {
        let (host, port) = parse_host_port(address);
        Self {
            server: ServerConfig { host, port },
            nick: nick.to_string(),
            ..Self::default()
        }
    }

    /// The ident sent in `USER`.
    pub fn effective_user_name(&self) -> &str {
        match self.user_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.nick,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }
}

/// Address of the IRC server to connect to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hostname or IP address. May be empty if the host is passed to
    /// `connect` instead.
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
        }
    }
}

/// Split a `host:port` address. A missing or unparsable port means 6667.
fn parse_host_port(addr: &str) -> (String, u16) {
    let addr = addr.trim();
    match addr.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse().unwrap_or_else(|_| default_port());
            (host.to_string(), port)
        }
        None => (addr.to_string(), default_port()),
    }
}

fn default_nick() -> String {
    generate_nickname()
}
fn default_port() -> u16 {
    6667
}
fn default_real_name() -> String {
    "Rust Bot".to_string()
}
fn default_command_prefix() -> String {
    "!".to_string()
}
fn default_command_pipe() -> String {
    ">".to_string()
}
fn default_idle_timeout() -> u64 {
    180
}
fn default_quit_message() -> String {
    "Leaving".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            nick = "mybot"

            [server]
            host = "irc.example.net"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "irc.example.net");
        assert_eq!(config.server.port, 6667);
        assert_eq!(config.command_prefix, "!");
        assert_eq!(config.command_pipe, ">");
        assert_eq!(config.idle_timeout_seconds, 180);
        assert!(!config.debug_logging);
        assert_eq!(config.effective_user_name(), "mybot");
        assert_eq!(config.real_name, "Rust Bot");
    }

    #[test]
    fn test_camel_case_keys() {
        let config: Config = toml::from_str(
            r##"
            nick = "mybot"
            userName = "ident"
            realName = "My Bot"
            commandPrefix = "."
            commandPipe = "|"
            idleTimeoutSeconds = 60
            debugLogging = true
            channels = ["#rust"]

            [server]
            host = "localhost"
            port = 6697
            "##,
        )
        .unwrap();

        assert_eq!(config.server.port, 6697);
        assert_eq!(config.effective_user_name(), "ident");
        assert_eq!(config.real_name, "My Bot");
        assert_eq!(config.command_prefix, ".");
        assert_eq!(config.command_pipe, "|");
        assert_eq!(config.idle_timeout(), Duration::from_secs(60));
        assert!(config.debug_logging);
        assert_eq!(config.channels, vec!["#rust".to_string()]);
    }

    #[test]
    fn test_new_parses_address() {
        let config = Config::new("irc.example.net:7000", "bot");
        assert_eq!(config.server.host, "irc.example.net");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.nick, "bot");

        let config = Config::new("irc.example.net", "bot");
        assert_eq!(config.server.port, 6667);
    }

    #[test]
    fn test_generated_nick_when_missing() {
        let config: Config = toml::from_str("[server]\nhost = \"h\"\n").unwrap();
        assert!(!config.nick.is_empty());
        assert!(config.nick.len() <= 9);
    }
}
