//! Command-line configuration of the relay server.

use std::{str::FromStr, time::Duration};

use clap::Parser;
use thiserror::Error;

use crate::{
    domain::{DisplayName, ValueObjectError},
    hub::HubConfig,
    infrastructure::{connection::PumpConfig, history::RetentionPolicy},
};

#[derive(Parser, Debug, Clone)]
#[command(name = "parlor-server")]
#[command(about = "Real-time chat relay with per-room broadcast", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    pub port: u16,

    /// Messages buffered per client before it is evicted as too slow
    #[arg(long, default_value_t = 128)]
    pub queue_capacity: usize,

    /// Largest accepted inbound message in bytes
    #[arg(long, default_value_t = 768)]
    pub max_frame_bytes: usize,

    /// Pending broadcasts before senders wait
    #[arg(long, default_value_t = 1024)]
    pub broadcast_capacity: usize,

    /// Seconds allowed for writing one frame to a client
    #[arg(long, default_value_t = 10)]
    pub write_timeout_secs: u64,

    /// Seconds allowed for loading room history on join
    #[arg(long, default_value_t = 2)]
    pub history_timeout_secs: u64,

    /// Messages kept per room, smaller than --queue-capacity
    #[arg(long, default_value_t = 100)]
    pub history_max_messages: usize,

    /// Seconds a message is kept in history (0 keeps forever)
    #[arg(long, default_value_t = 86_400)]
    pub history_ttl_secs: u64,

    /// Session token entry as NAME=TOKEN (repeatable)
    #[arg(long = "user", value_name = "NAME=TOKEN")]
    pub users: Vec<UserToken>,
}

impl ServerConfig {
    /// Reject settings under which a joining client could be evicted by its
    /// own history replay.
    ///
    /// A full replay must leave room in the client's queue for live messages,
    /// so history has to be bounded and shorter than the queue.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_max_messages == 0 {
            return Err(ConfigError::UnboundedHistory);
        }
        if self.history_max_messages >= self.queue_capacity {
            return Err(ConfigError::HistoryExceedsQueue {
                history: self.history_max_messages,
                queue: self.queue_capacity,
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            broadcast_capacity: self.broadcast_capacity,
            history_timeout: Duration::from_secs(self.history_timeout_secs),
        }
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(
            (self.history_max_messages > 0).then_some(self.history_max_messages),
            (self.history_ttl_secs > 0).then(|| Duration::from_secs(self.history_ttl_secs)),
        )
    }

    pub fn pump_config(&self) -> PumpConfig {
        PumpConfig {
            write_timeout: Duration::from_secs(self.write_timeout_secs),
            max_frame_bytes: self.max_frame_bytes,
        }
    }

    /// Token table for the authenticator
    pub fn token_entries(&self) -> impl Iterator<Item = (String, DisplayName)> + '_ {
        self.users
            .iter()
            .map(|user| (user.token.clone(), user.name.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("--history-max-messages must be positive, unbounded history cannot fit a client queue")]
    UnboundedHistory,

    #[error("--history-max-messages ({history}) must be smaller than --queue-capacity ({queue})")]
    HistoryExceedsQueue { history: usize, queue: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserTokenError {
    #[error("expected NAME=TOKEN")]
    MissingSeparator,

    #[error("token must not be empty")]
    EmptyToken,

    #[error(transparent)]
    InvalidName(#[from] ValueObjectError),
}

/// `--user` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserToken {
    pub name: DisplayName,
    pub token: String,
}

impl FromStr for UserToken {
    type Err = UserTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, token) = s.split_once('=').ok_or(UserTokenError::MissingSeparator)?;
        let token = token.trim();
        if token.is_empty() {
            return Err(UserTokenError::EmptyToken);
        }
        Ok(Self {
            name: DisplayName::new(name.to_string())?,
            token: token.to_string(),
        })
    }
}
