use chrono::{DateTime, Utc};

use crate::core::errors::AppError;
use crate::domain::user::UserId;

pub type ChatId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatType {
    Group,
    SuperGroup,
    Channel,
}

impl ChatType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatType::Group => "group",
            ChatType::SuperGroup => "supergroup",
            ChatType::Channel => "channel",
        }
    }

    pub fn parse(v: &str) -> Result<Self, AppError> {
        match v {
            "group" => Ok(ChatType::Group),
            "supergroup" => Ok(ChatType::SuperGroup),
            "channel" => Ok(ChatType::Channel),
            other => Err(AppError::InvalidInput(format!("unknown chat type: {other}"))),
        }
    }
}

/// A channel or group connected by its owner as a restriction target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: ChatId,
    pub telegram_id: i64,
    pub title: String,
    pub kind: ChatType,
    pub owner_id: UserId,
    pub linked_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Chat {
    /// Applies a new title, stamping `updated_at` when it changed.
    pub fn patch_title(&mut self, title: &str) -> bool {
        if self.title == title {
            return false;
        }
        self.title = title.to_owned();
        self.updated_at = Some(Utc::now());
        true
    }
}
