//! Per-user conversation state and subscription await markers, backed by
//! Redis. Both stores are behind traits so services and handlers can be
//! tested against in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::core::errors::AppError;
use crate::domain::{FileId, UserId};

/// Common key prefix of everything this bot keeps in Redis.
pub const KEY_PREFIX: &str = "sharefile-bot";

/// How long a subscription await marker lives.
pub const AWAIT_MARKER_TTL: Duration = Duration::from_secs(60 * 60);

/// Dialog position of one user. A missing stored value reads as `Empty`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    Empty,
    /// The next private message is treated as chat-connect input
    /// regardless of its shape.
    AwaitingChatConnectInput,
}

impl ConversationState {
    fn encode(self) -> u8 {
        match self {
            ConversationState::Empty => 0,
            ConversationState::AwaitingChatConnectInput => 1,
        }
    }

    fn decode(v: u8) -> Self {
        match v {
            1 => ConversationState::AwaitingChatConnectInput,
            _ => ConversationState::Empty,
        }
    }
}

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, user: UserId) -> Result<ConversationState, AppError>;
    async fn set(&self, user: UserId, state: ConversationState) -> Result<(), AppError>;
    async fn delete(&self, user: UserId) -> Result<(), AppError>;
}

/// Marks that a user was shown the subscription gate for a file. Consuming
/// the marker decides the `new_subscription` attribution of the download.
#[async_trait]
pub trait AwaitMarkerStore: Send + Sync {
    async fn set(&self, user: UserId, file: FileId) -> Result<(), AppError>;
    /// Atomically consumes the marker, reporting whether it was present.
    async fn take(&self, user: UserId, file: FileId) -> Result<bool, AppError>;
}

pub struct RedisStateStore {
    prefix: String,
    conn: ConnectionManager,
}

impl RedisStateStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), conn }
    }

    fn key(&self, user: UserId) -> String {
        format!("{}:users:{}:state", self.prefix, user)
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn get(&self, user: UserId) -> Result<ConversationState, AppError> {
        let mut conn = self.conn.clone();
        let value: Option<u8> = conn.get(self.key(user)).await?;
        Ok(value.map(ConversationState::decode).unwrap_or_default())
    }

    async fn set(&self, user: UserId, state: ConversationState) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(self.key(user), state.encode()).await?;
        Ok(())
    }

    async fn delete(&self, user: UserId) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.key(user)).await?;
        Ok(())
    }
}

pub struct RedisAwaitMarkerStore {
    prefix: String,
    conn: ConnectionManager,
}

impl RedisAwaitMarkerStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), conn }
    }

    fn key(&self, user: UserId, file: FileId) -> String {
        format!("{}:users:{}:subscription:{}", self.prefix, user, file)
    }
}

#[async_trait]
impl AwaitMarkerStore for RedisAwaitMarkerStore {
    async fn set(&self, user: UserId, file: FileId) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(self.key(user, file), 1u8, AWAIT_MARKER_TTL.as_secs()).await?;
        Ok(())
    }

    async fn take(&self, user: UserId, file: FileId) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        // GETDEL keeps fetch-and-consume atomic, so a marker credits at
        // most one download.
        let value: Option<u8> = redis::cmd("GETDEL").arg(self.key(user, file)).query_async(&mut conn).await?;
        Ok(value.is_some())
    }
}
