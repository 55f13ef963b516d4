//! The client engine: connection lifecycle, built-in protocol behaviour and
//! the public surface collaborators use.
//!
//! A [`Client`] is a cheap handle to one independent engine instance. It owns
//! the session state, the event bus and the idle watchdog; the socket itself
//! lives in the tasks started by [`spawn_link`]. Locks are never held while
//! events are published, so subscribers may call back into the client.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ClientError;
use crate::event::{Event, EventBus, SubscriptionId};
use crate::irc::commands::CommandRouter;
use crate::irc::connection::{spawn_link, Link};
use crate::irc::parser::{parse_line, parse_userinfo, Line, ParseError, ParsedLine};
use crate::irc::state::{ConnectionState, Phase};
use crate::irc::watchdog::Watchdog;

/// Numeric reply a server sends once registration has succeeded.
const RPL_WELCOME: &str = "001";

struct Session {
    phase: Phase,
    state: ConnectionState,
    /// Bumped whenever a session starts or ends; socket tasks compare it
    /// against the value they were started with.
    generation: u64,
    link: Option<Link>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            state: ConnectionState::default(),
            generation: 0,
            link: None,
        }
    }
}

impl Session {
    fn queue(&self, line: &str, debug_logging: bool) -> bool {
        let Some(link) = &self.link else {
            return false;
        };
        if debug_logging {
            debug!("SEND: {}", line);
        }
        link.writer.send(line.to_string()).is_ok()
    }
}

struct Inner {
    config: Config,
    bus: EventBus,
    router: CommandRouter,
    watchdog: Watchdog,
    session: Mutex<Session>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(link) = self.session.get_mut().link.take() {
            link.reader.abort();
        }
    }
}

/// Handle to one IRC client engine.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

/// Non-owning handle to a [`Client`], for use inside subscribers.
///
/// A subscriber that captures a `Client` keeps the engine alive through its
/// own event bus; capture a `WeakClient` and upgrade it instead.
#[derive(Clone, Default)]
pub struct WeakClient {
    inner: Weak<Inner>,
}

impl WeakClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upgrade(&self) -> Option<Client> {
        self.inner.upgrade().map(|inner| Client { inner })
    }
}

impl Client {
    pub fn new(config: Config) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let on_idle = WeakClient {
                inner: weak.clone(),
            };
            Inner {
                bus: EventBus::new(),
                router: CommandRouter::new(&config.command_prefix, &config.command_pipe),
                watchdog: Watchdog::new(config.idle_timeout(), move || {
                    if let Some(client) = on_idle.upgrade() {
                        warn!("No data received for too long");
                        client.disconnect(Some("Timeout"));
                    }
                }),
                session: Mutex::new(Session::default()),
                config,
            }
        });

        let client = Client { inner };
        client.install_builtins();
        client
    }

    pub fn downgrade(&self) -> WeakClient {
        WeakClient {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.session.lock().state.clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.session.lock().phase
    }

    /// True while the idle watchdog is counting down.
    pub fn watchdog_armed(&self) -> bool {
        self.inner.watchdog.is_armed()
    }

    /// Subscribe to events named `name`.
    pub fn on<F>(&self, name: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.bus.subscribe(name, handler)
    }

    /// Subscribe to every event.
    pub fn on_any<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.bus.subscribe_all(handler)
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.inner.bus.unsubscribe(id)
    }

    /// Publish an event of the caller's own on this client's bus.
    pub fn emit(&self, event: &Event) {
        self.inner.bus.publish(event);
    }

    /// Open a TCP connection and start registration.
    ///
    /// `host` and `port` override the configured server; only an absent or
    /// empty `host` falls back to the config. A host that is blank after
    /// trimming fails with [`ClientError::NoServer`] without any I/O. Every
    /// failure is also published as an `error` event; a failed TCP connect
    /// is followed by `disconnected`.
    pub async fn connect(
        &self,
        host: Option<&str>,
        port: Option<u16>,
    ) -> Result<(), ClientError> {
        let host = host
            .filter(|h| !h.is_empty())
            .unwrap_or(self.inner.config.server.host.as_str())
            .trim()
            .to_string();
        if host.is_empty() {
            return Err(self.report(ClientError::NoServer));
        }
        let port = port.unwrap_or(self.inner.config.server.port);

        let generation = self.begin()?;
        let addr = format!("{}:{}", host, port);
        info!("Connecting to {}", addr);

        match TcpStream::connect((host.as_str(), port)).await {
            Ok(stream) => {
                self.establish(generation, stream);
                Ok(())
            }
            Err(source) => {
                let err = ClientError::Connect { addr, source };
                self.session_closed(generation, Some(&err));
                Err(err)
            }
        }
    }

    /// Start a session over an already-open stream, exactly as `connect`
    /// does after its TCP connect succeeds. Must be called from within a
    /// tokio runtime.
    pub fn attach<S>(&self, stream: S) -> Result<(), ClientError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let generation = self.begin()?;
        self.establish(generation, stream);
        Ok(())
    }

    /// Send `QUIT` and close the connection. Does nothing unless registered.
    pub fn disconnect(&self, reason: Option<&str>) {
        let generation = {
            let session = self.inner.session.lock();
            if !session.state.connected {
                debug!("Not connected, ignoring disconnect");
                return;
            }
            let reason = reason.unwrap_or(self.inner.config.quit_message.as_str());
            session.queue(&format!("QUIT :{}", reason), self.inner.config.debug_logging);
            info!(reason, "Disconnecting");
            session.generation
        };
        self.session_closed(generation, None);
    }

    /// Write one protocol line. Dropped with a warning unless registered;
    /// nothing is queued for later.
    pub fn send(&self, line: &str) {
        let line = match line.find(['\r', '\n']) {
            Some(end) => {
                warn!("Discarding text after line break in outgoing line");
                &line[..end]
            }
            None => line,
        };

        let session = self.inner.session.lock();
        if !session.state.connected {
            warn!("Couldn't send data. Not connected.");
            return;
        }
        session.queue(line, self.inner.config.debug_logging);
    }

    /// Lines the engine writes itself (NICK, USER, PONG), allowed before
    /// registration completes.
    fn write_line(&self, line: &str) -> bool {
        self.inner
            .session
            .lock()
            .queue(line, self.inner.config.debug_logging)
    }

    fn begin(&self) -> Result<u64, ClientError> {
        let started = {
            let mut session = self.inner.session.lock();
            if session.phase.is_active() {
                None
            } else {
                session.generation += 1;
                session.phase = Phase::Connecting;
                Some(session.generation)
            }
        };
        started.ok_or_else(|| self.report(ClientError::AlreadyActive))
    }

    fn establish<S>(&self, generation: u64, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        {
            let mut session = self.inner.session.lock();
            if session.generation != generation || session.phase != Phase::Connecting {
                debug!("Session ended before the connection was established");
                return;
            }
            session.link = Some(spawn_link(self.downgrade(), generation, stream));
            session.phase = Phase::AwaitingRegistration;
        }
        info!("Connection established.");

        let config = &self.inner.config;
        self.write_line(&format!("NICK {}", config.nick));
        self.write_line(&format!(
            "USER {} 8 * :{}",
            config.effective_user_name(),
            config.real_name
        ));
    }

    /// Move to `Disconnected` if `generation` is still the live session.
    /// Every way a session ends goes through here exactly once.
    pub(crate) fn session_closed(&self, generation: u64, error: Option<&ClientError>) {
        let link = {
            let mut session = self.inner.session.lock();
            if session.generation != generation || !session.phase.is_active() {
                return;
            }
            session.generation += 1;
            session.phase = Phase::Disconnected;
            session.state = ConnectionState::default();
            // Under the session lock, so a concurrent registration cannot
            // arm the timer after this point.
            self.inner.watchdog.disarm();
            session.link.take()
        };
        if let Some(link) = link {
            // Dropping the sender lets the writer flush what is queued.
            link.reader.abort();
        }

        let args = match error {
            Some(err) => {
                self.publish_error(err);
                vec![err.to_string()]
            }
            None => Vec::new(),
        };
        debug!(error = ?error, "Disconnected");
        self.inner.bus.publish(&Event::text("disconnected", args));
    }

    /// Process one inbound line. Returns `false` if the session it belongs
    /// to is over, in which case the line is discarded.
    pub(crate) fn handle_line(&self, generation: u64, line: &str) -> bool {
        if self.inner.session.lock().generation != generation {
            return false;
        }
        if self.inner.config.debug_logging {
            debug!("READ: {}", line);
        }

        match parse_line(line) {
            Ok(Line::Ping(token)) => {
                self.write_line(&format!("PONG {}", token));
                debug!("PING? PONG!");
                self.inner.watchdog.reset();
            }
            Ok(Line::Message(parsed)) => {
                self.dispatch(line, &parsed);
                self.inner.watchdog.reset();
            }
            Err(ParseError::Empty) => {}
            Err(e) => warn!(line, error = %e, "Skipping malformed line"),
        }
        true
    }

    fn dispatch(&self, line: &str, parsed: &ParsedLine) {
        let bus = &self.inner.bus;
        bus.publish(&Event::text(parsed.event_name.as_str(), parsed.event_args()));
        bus.publish(&Event::text("raw", [line]));
        bus.publish(&Event::text("raw:parsed", parsed.parsed_args()));
    }

    fn report(&self, err: ClientError) -> ClientError {
        self.publish_error(&err);
        err
    }

    fn publish_error(&self, err: &ClientError) {
        error!("{}", err);
        self.inner
            .bus
            .publish(&Event::text("error", [err.to_string()]));
    }

    fn install_builtins(&self) {
        let bus = &self.inner.bus;

        let weak = self.downgrade();
        bus.subscribe("privmsg", move |event| {
            if let Some(client) = weak.upgrade() {
                client.on_privmsg(event);
            }
        });

        let weak = self.downgrade();
        bus.subscribe(RPL_WELCOME, move |event| {
            if let Some(client) = weak.upgrade() {
                client.on_welcome(event);
            }
        });

        let weak = self.downgrade();
        bus.subscribe("nick", move |event| {
            if let Some(client) = weak.upgrade() {
                client.on_nick(event);
            }
        });

        let weak = self.downgrade();
        bus.subscribe("chanmsg", move |event| {
            let Some(client) = weak.upgrade() else {
                return;
            };
            if let Some(events) = client.inner.router.route(event, &weak) {
                for event in &events {
                    client.inner.bus.publish(event);
                }
            }
        });
    }

    /// `privmsg(from, target, message)` becomes `botmsg(from, message)` when
    /// addressed to us, or `chanmsg(from, channel, message)`.
    fn on_privmsg(&self, event: &Event) {
        let &[from, target, message, ..] = event.texts().as_slice() else {
            return;
        };
        let current_nick = self.inner.session.lock().state.current_nick.clone();

        if !current_nick.is_empty() && target == current_nick {
            self.inner
                .bus
                .publish(&Event::text("botmsg", [from, message]));
        } else if target.starts_with('#') {
            self.inner
                .bus
                .publish(&Event::text("chanmsg", [from, target, message]));
        }
    }

    fn on_welcome(&self, event: &Event) {
        let server = event.arg(0).unwrap_or_default().to_string();
        let nick = event
            .arg(1)
            .filter(|nick| !nick.is_empty())
            .unwrap_or(self.inner.config.nick.as_str())
            .to_string();

        {
            let mut session = self.inner.session.lock();
            if session.phase != Phase::AwaitingRegistration {
                return;
            }
            session.phase = Phase::Connected;
            session.state = ConnectionState {
                connected: true,
                current_nick: nick.clone(),
                server_name: server.clone(),
            };
            self.inner.watchdog.arm();
        }
        info!(server = %server, nick = %nick, "Registered");
        self.inner.bus.publish(&Event::text("connected", [server]));
    }

    /// Keep `current_nick` in step when the server renames us.
    fn on_nick(&self, event: &Event) {
        let (Some(source), Some(new_nick)) = (event.arg(0), event.arg(1)) else {
            return;
        };
        let mut session = self.inner.session.lock();
        let own = parse_userinfo(source).nick == session.state.current_nick;
        if session.state.connected && own {
            debug!(old = %session.state.current_nick, new = %new_nick, "Nick changed");
            session.state.current_nick = new_nick.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn error_counter(client: &Client) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        client.on("error", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[tokio::test]
    async fn test_connect_without_host_reports_no_server() {
        let client = Client::new(Config::default());
        let errors = error_counter(&client);

        let result = client.connect(Some("   "), None).await;
        assert!(matches!(result, Err(ClientError::NoServer)));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(client.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_whitespace_host_does_not_fall_back_to_config() {
        let client = Client::new(Config::new("127.0.0.1:6667", "bot"));
        let errors = error_counter(&client);

        let result = client.connect(Some("   "), None).await;
        assert!(matches!(result, Err(ClientError::NoServer)));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(client.phase(), Phase::Idle);
    }

    #[test]
    fn test_send_while_disconnected_is_dropped() {
        let client = Client::new(Config::new("irc.example.net", "bot"));
        let errors = error_counter(&client);

        client.send("PRIVMSG #chan :hello");
        client.disconnect(None);

        assert_eq!(errors.load(Ordering::SeqCst), 0);
        assert_eq!(client.state(), ConnectionState::default());
        assert_eq!(client.phase(), Phase::Idle);
    }

    #[test]
    fn test_instances_are_independent() {
        let a = Client::new(Config::new("irc.example.net", "a"));
        let b = Client::new(Config::new("irc.example.net", "b"));
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        a.on("custom", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        b.emit(&Event::text("custom", ["x"]));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        a.emit(&Event::text("custom", ["x"]));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_welcome_ignored_before_session() {
        let client = Client::new(Config::new("irc.example.net", "bot"));
        client.emit(&Event::text("001", ["irc.example.net", "bot", "Welcome"]));
        assert!(!client.state().connected);
        assert!(!client.watchdog_armed());
    }
}
