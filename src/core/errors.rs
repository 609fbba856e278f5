//! Central error taxonomy.
//!
//! Domain failures get their own variants so handlers can map them to
//! user-facing texts; platform failures are classified once at the
//! Telegram client boundary into the `Tg*` variants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("user not found")]
    UserNotFound,
    #[error("file not found")]
    FileNotFound,
    #[error("chat not found")]
    ChatNotFound,
    #[error("public id is already taken")]
    PublicIdCollision,
    #[error("no free public id after {0} attempts")]
    PublicIdExhausted(u32),
    #[error("chat membership can not be verified")]
    MembershipUnverifiable,
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Chat connect verification chain.
    #[error("chat belongs to a user, not a channel or group")]
    ChatIsUser,
    #[error("chat not found or the bot was not added to it")]
    ChatNotFoundOrBotIsNotAdmin,
    #[error("bot is not an administrator of the chat")]
    BotIsNotChatAdmin,
    #[error("bot has not enough rights in the chat")]
    BotNotEnoughRights,
    #[error("user is not an administrator of the chat")]
    UserIsNotChatAdmin,
    #[error("chat is already connected")]
    ChatAlreadyConnected,

    #[error("user is not an administrator")]
    UserIsNotAdmin,
    #[error("expected to affect one row, affected {0}")]
    TooManyRowsAffected(u64),

    // Telegram platform failures, classified from API error payloads.
    #[error("telegram: chat not found")]
    TgChatNotFound,
    #[error("telegram: member list is inaccessible")]
    TgMemberListInaccessible,
    #[error("telegram: bot is not a member of the chat")]
    TgBotIsNotMember,
    #[error("telegram: not enough rights to export chat invite link")]
    TgNoRightsForInviteLink,

    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    /// True for platform failures that mean a membership question can not
    /// be answered at all, as opposed to being answered negatively.
    pub fn is_cant_check_membership(&self) -> bool {
        matches!(
            self,
            AppError::TgChatNotFound | AppError::TgMemberListInaccessible | AppError::TgBotIsNotMember
        )
    }
}
