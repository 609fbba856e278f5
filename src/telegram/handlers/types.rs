//! Shared handler plumbing: dependency bundle, error type and small
//! helpers every branch uses.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tokio::sync::Semaphore;

use crate::service::{AdminService, AuthService, ChatService, FileService, UserInfo};
use crate::state::StateStore;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers.
#[derive(Clone)]
pub struct HandlerDeps {
    pub auth: Arc<AuthService>,
    pub files: Arc<FileService>,
    pub chats: Arc<ChatService>,
    pub admin: Arc<AdminService>,
    pub state: Arc<dyn StateStore>,
    pub bot_username: String,
}

/// Maps the Telegram user payload onto the profile fields we store.
pub fn user_info(tg: &teloxide::types::User, ref_tag: Option<&str>) -> UserInfo {
    UserInfo {
        id: i64::try_from(tg.id.0).unwrap_or_default(),
        first_name: tg.first_name.clone(),
        last_name: tg.last_name.clone(),
        username: tg.username.clone(),
        language_code: tg.language_code.clone(),
        ref_tag: ref_tag.map(str::to_owned),
    }
}

// Caps the number of in-flight typing indicators so a flood of updates
// cannot pile up background sends.
static TYPING_PERMITS: Semaphore = Semaphore::const_new(64);

/// Fires a best-effort typing indicator without blocking the handler.
pub fn spawn_typing(bot: &Bot, chat_id: ChatId) {
    let Ok(permit) = TYPING_PERMITS.try_acquire() else {
        log::debug!("typing indicator skipped for chat {}: permits saturated", chat_id);
        return;
    };
    let bot = bot.clone();
    tokio::spawn(async move {
        let _permit = permit;
        if let Err(err) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
            log::debug!("typing indicator failed for chat {}: {}", chat_id, err);
        }
    });
}
