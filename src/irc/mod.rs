//! IRC transport: line codec and a reconnecting client.

pub mod client;
pub mod message;

use thiserror::Error;

use crate::error::Transience;

pub use client::{IrcClient, SessionEnd};
pub use message::Message;

#[derive(Debug, Error)]
pub enum IrcError {
    #[error("irc connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("irc io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server closed the connection: {reason}")]
    Closed { reason: String },
}

impl IrcError {
    pub fn transience(&self) -> Transience {
        match self {
            IrcError::Connect { .. } | IrcError::Io(_) | IrcError::Closed { .. } => {
                Transience::Retryable
            }
        }
    }
}
