//! Reconnecting IRC client.
//!
//! Each session runs two threads: a reader that turns socket lines into
//! events, and the session loop that selects over those events, outbound
//! replies and a shutdown tick. Only the session loop writes the socket.

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::config::IrcConfig;
use crate::daemon::{Inbound, Reply};

use super::IrcError;
use super::message::{self, Message};

const SHUTDOWN_POLL: Duration = Duration::from_millis(200);
const NICK_IN_USE: &str = "433";
const WELCOME: &str = "001";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Asked to stop, or the ladder side hung up.
    Shutdown,
    Disconnected,
}

enum ReadEvent {
    Line(String),
    Closed(String),
}

pub struct IrcClient {
    config: IrcConfig,
    shutdown: Arc<AtomicBool>,
}

impl IrcClient {
    pub fn new(config: IrcConfig, shutdown: Arc<AtomicBool>) -> Self {
        Self { config, shutdown }
    }

    /// Connects and serves until shutdown, reconnecting after
    /// `reconnect_delay_ms` whenever a session ends or fails.
    pub fn run(&self, inbound: &Sender<Inbound>, replies: &Receiver<Reply>) {
        loop {
            match self.session(inbound, replies) {
                Ok(SessionEnd::Shutdown) => return,
                Ok(SessionEnd::Disconnected) => warn!("irc connection lost"),
                Err(err) => error!(
                    error = %err,
                    transience = ?err.transience(),
                    "irc session failed"
                ),
            }
            if self.wait_for_reconnect() {
                return;
            }
        }
    }

    fn stopping(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Returns true if shutdown was requested while waiting.
    fn wait_for_reconnect(&self) -> bool {
        let delay = Duration::from_millis(self.config.reconnect_delay_ms);
        info!(delay_ms = self.config.reconnect_delay_ms, "reconnecting");
        let deadline = Instant::now() + delay;
        while Instant::now() < deadline {
            if self.stopping() {
                return true;
            }
            thread::sleep(SHUTDOWN_POLL.min(deadline.saturating_duration_since(Instant::now())));
        }
        self.stopping()
    }

    fn session(
        &self,
        inbound: &Sender<Inbound>,
        replies: &Receiver<Reply>,
    ) -> Result<SessionEnd, IrcError> {
        if self.stopping() {
            return Ok(SessionEnd::Shutdown);
        }
        let addr = format!("{}:{}", self.config.server, self.config.port);
        let stream = TcpStream::connect(&addr).map_err(|source| IrcError::Connect {
            addr: addr.clone(),
            source,
        })?;
        info!(%addr, "connected");

        let read_half = stream.try_clone()?;
        let (event_tx, event_rx) = crossbeam::channel::unbounded();
        let reader = thread::Builder::new()
            .name("irc-reader".into())
            .spawn(move || read_lines(read_half, &event_tx))?;

        let mut conn = Connection {
            stream,
            nickname: self.config.nickname.clone(),
        };
        let end = self.pump(&mut conn, &event_rx, inbound, replies);

        let _ = conn.stream.shutdown(Shutdown::Both);
        let _ = reader.join();
        end
    }

    fn pump(
        &self,
        conn: &mut Connection,
        events: &Receiver<ReadEvent>,
        inbound: &Sender<Inbound>,
        replies: &Receiver<Reply>,
    ) -> Result<SessionEnd, IrcError> {
        let (nick, user) = (message::nick(&conn.nickname), message::user(&conn.nickname));
        conn.send(&nick)?;
        conn.send(&user)?;
        let ticker = crossbeam::channel::tick(SHUTDOWN_POLL);

        loop {
            crossbeam::select! {
                recv(events) -> event => match event {
                    Ok(ReadEvent::Line(line)) => {
                        if let Some(end) = self.on_line(conn, &line, inbound)? {
                            return Ok(end);
                        }
                    }
                    Ok(ReadEvent::Closed(reason)) => {
                        debug!(%reason, "reader closed");
                        return Ok(SessionEnd::Disconnected);
                    }
                    Err(_) => return Ok(SessionEnd::Disconnected),
                },
                recv(replies) -> reply => match reply {
                    Ok(reply) => conn.send(&render(&reply))?,
                    Err(_) => {
                        let _ = conn.send(&message::quit("shutting down"));
                        return Ok(SessionEnd::Shutdown);
                    }
                },
                recv(ticker) -> _ => {
                    if self.stopping() {
                        let _ = conn.send(&message::quit("shutting down"));
                        return Ok(SessionEnd::Shutdown);
                    }
                }
            }
        }
    }

    fn on_line(
        &self,
        conn: &mut Connection,
        line: &str,
        inbound: &Sender<Inbound>,
    ) -> Result<Option<SessionEnd>, IrcError> {
        let Some(msg) = Message::parse(line) else {
            return Ok(None);
        };
        match msg.command.as_str() {
            "PING" => conn.send(&message::pong(msg.param(0).unwrap_or_default()))?,
            WELCOME => {
                info!(nickname = %conn.nickname, "signed on");
                conn.send(&message::join(&self.config.channel))?;
            }
            NICK_IN_USE => {
                conn.nickname.push('_');
                warn!(nickname = %conn.nickname, "nickname in use, retrying");
                let nick = message::nick(&conn.nickname);
                conn.send(&nick)?;
            }
            "JOIN" if msg.nick() == Some(conn.nickname.as_str()) => {
                info!(channel = msg.param(0).unwrap_or_default(), "joined");
            }
            "ERROR" => {
                return Err(IrcError::Closed {
                    reason: msg.param(0).unwrap_or_default().to_string(),
                });
            }
            "PRIVMSG" => {
                let Some(privmsg) = msg.as_privmsg() else {
                    return Ok(None);
                };
                if privmsg.sender == conn.nickname {
                    return Ok(None);
                }
                let channel = if message::is_channel(privmsg.target) {
                    privmsg.target
                } else {
                    privmsg.sender
                };
                let delivered =
                    inbound.send(Inbound::new(privmsg.sender, channel, privmsg.text));
                if delivered.is_err() {
                    return Ok(Some(SessionEnd::Shutdown));
                }
            }
            _ => {}
        }
        Ok(None)
    }
}

struct Connection {
    stream: TcpStream,
    nickname: String,
}

impl Connection {
    fn send(&mut self, line: &str) -> Result<(), IrcError> {
        debug!(%line, "irc >>");
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(b"\r\n")?;
        self.stream.flush()?;
        Ok(())
    }
}

pub fn render(reply: &Reply) -> String {
    match reply {
        Reply::Say { target, text } => message::privmsg(target, text),
        Reply::Notice { target, text } => message::notice(target, text),
    }
}

fn read_lines(stream: TcpStream, events: &Sender<ReadEvent>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::with_capacity(message::MAX_LINE);
    loop {
        buf.clear();
        let event = match reader.read_until(b'\n', &mut buf) {
            Ok(0) => ReadEvent::Closed("eof".into()),
            Ok(_) => ReadEvent::Line(String::from_utf8_lossy(&buf).into_owned()),
            Err(err) => ReadEvent::Closed(err.to_string()),
        };
        let closed = matches!(event, ReadEvent::Closed(_));
        if let ReadEvent::Line(line) = &event {
            debug!(line = %line.trim_end(), "irc <<");
        }
        if events.send(event).is_err() || closed {
            return;
        }
    }
}
