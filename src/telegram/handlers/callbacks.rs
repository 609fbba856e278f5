//! Callback-query grammar and dispatch.
//!
//! Callback data is a `:`-separated path. Parsing is a single match over
//! the split parts, so every accepted shape is visible in one place and
//! anything else is rejected up front.

use teloxide::prelude::*;
use teloxide::types::MaybeInaccessibleMessage;

use super::types::{user_info, HandlerDeps, HandlerError};
use super::{files, settings};
use crate::core::errors::AppError;
use crate::domain::{ChatId as DomainChatId, FileId};
use crate::telegram::texts;

/// Parsed callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackCommand {
    Settings,
    SettingsToggleLongIds,
    SettingsChats,
    SettingsChatsConnect,
    SettingsChat(DomainChatId),
    SettingsChatDelete(DomainChatId),
    SettingsChatDeleteConfirm(DomainChatId),
    FileRefresh(FileId),
    FileDelete(FileId),
    FileDeleteConfirm(FileId),
    FileRestrictions(FileId),
    FileRestrictionToggle(FileId, DomainChatId),
    FileCheckSubscription(FileId),
}

impl CallbackCommand {
    pub fn parse(data: &str) -> Option<Self> {
        use CallbackCommand::*;

        let parts: Vec<&str> = data.split(':').collect();
        match parts.as_slice() {
            ["settings"] => Some(Settings),
            ["settings", "toggle-long-ids"] => Some(SettingsToggleLongIds),
            ["settings", "chats"] => Some(SettingsChats),
            ["settings", "chats", "connect"] => Some(SettingsChatsConnect),
            ["settings", "chats", id] => id.parse().ok().map(SettingsChat),
            ["settings", "chats", id, "delete"] => id.parse().ok().map(SettingsChatDelete),
            ["settings", "chats", id, "delete", "confirm"] => id.parse().ok().map(SettingsChatDeleteConfirm),
            ["file", id, "refresh"] => id.parse().ok().map(FileRefresh),
            ["file", id, "delete"] => id.parse().ok().map(FileDelete),
            ["file", id, "delete", "confirm"] => id.parse().ok().map(FileDeleteConfirm),
            ["file", id, "restrictions"] => id.parse().ok().map(FileRestrictions),
            ["file", id, "restrictions", "chat", "check"] => id.parse().ok().map(FileCheckSubscription),
            ["file", id, "restrictions", "chat-subscription", chat, "toggle"] => {
                match (id.parse().ok(), chat.parse().ok()) {
                    (Some(id), Some(chat)) => Some(FileRestrictionToggle(id, chat)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn encode(self) -> String {
        use CallbackCommand::*;

        match self {
            Settings => "settings".to_owned(),
            SettingsToggleLongIds => "settings:toggle-long-ids".to_owned(),
            SettingsChats => "settings:chats".to_owned(),
            SettingsChatsConnect => "settings:chats:connect".to_owned(),
            SettingsChat(id) => format!("settings:chats:{id}"),
            SettingsChatDelete(id) => format!("settings:chats:{id}:delete"),
            SettingsChatDeleteConfirm(id) => format!("settings:chats:{id}:delete:confirm"),
            FileRefresh(id) => format!("file:{id}:refresh"),
            FileDelete(id) => format!("file:{id}:delete"),
            FileDeleteConfirm(id) => format!("file:{id}:delete:confirm"),
            FileRestrictions(id) => format!("file:{id}:restrictions"),
            FileRestrictionToggle(id, chat) => {
                format!("file:{id}:restrictions:chat-subscription:{chat}:toggle")
            }
            FileCheckSubscription(id) => format!("file:{id}:restrictions:chat:check"),
        }
    }
}

pub async fn handle_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> Result<(), HandlerError> {
    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let command = match CallbackCommand::parse(&data) {
        Some(command) => command,
        None => {
            log::warn!("unrecognized callback data: {:?}", data);
            bot.answer_callback_query(q.id.clone()).await?;
            return Ok(());
        }
    };

    let user = deps.auth.authenticate(&user_info(&q.from, None)).await?;

    // Callbacks on a message the bot can no longer read get a plain ack.
    let Some(MaybeInaccessibleMessage::Regular(msg)) = q.message.as_ref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let message_id = msg.id;

    let outcome = match command {
        CallbackCommand::Settings => {
            settings::edit_settings_view(&bot, chat_id, message_id, &user).await
        }
        CallbackCommand::SettingsToggleLongIds => {
            let mut user = user.clone();
            deps.auth.toggle_long_ids(&mut user).await?;
            settings::edit_settings_view(&bot, chat_id, message_id, &user).await
        }
        CallbackCommand::SettingsChats => {
            // Leaving the chats screen always exits the connect flow.
            deps.state.delete(user.id).await?;
            settings::edit_chats_view(&bot, chat_id, message_id, &deps, &user).await
        }
        CallbackCommand::SettingsChatsConnect => {
            settings::start_chat_connect(&bot, chat_id, message_id, &deps, &user).await
        }
        CallbackCommand::SettingsChat(id) => {
            settings::edit_chat_details_view(&bot, chat_id, message_id, &deps, &user, id).await
        }
        CallbackCommand::SettingsChatDelete(id) => {
            settings::edit_chat_delete_confirm(&bot, chat_id, message_id, id).await
        }
        CallbackCommand::SettingsChatDeleteConfirm(id) => {
            deps.chats.disconnect(&user, id).await?;
            settings::edit_chats_view(&bot, chat_id, message_id, &deps, &user).await
        }
        CallbackCommand::FileRefresh(id) => {
            files::edit_owned_view(&bot, chat_id, message_id, &deps, &user, id).await
        }
        CallbackCommand::FileDelete(id) => {
            files::edit_delete_confirm(&bot, chat_id, message_id, id).await
        }
        CallbackCommand::FileDeleteConfirm(id) => {
            deps.files.delete_file(&user, id).await?;
            bot.edit_message_text(chat_id, message_id, texts::FILE_DELETED).await?;
            Ok(())
        }
        CallbackCommand::FileRestrictions(id) => {
            files::edit_restrictions_view(&bot, chat_id, message_id, &deps, &user, id).await
        }
        CallbackCommand::FileRestrictionToggle(id, target) => {
            let update = deps.files.set_chat_restriction(&user, id, target).await?;
            let notice = if update.disabled {
                texts::restriction_disabled()
            } else {
                texts::restriction_enabled(&update.chat_title)
            };
            bot.answer_callback_query(q.id.clone()).text(notice).await?;
            files::edit_restrictions_view(&bot, chat_id, message_id, &deps, &user, id).await?;
            return Ok(());
        }
        CallbackCommand::FileCheckSubscription(id) => {
            return files::handle_check_subscription(&bot, &q, chat_id, &deps, &user, id).await;
        }
    };

    match outcome {
        Ok(()) => {
            bot.answer_callback_query(q.id.clone()).await?;
            Ok(())
        }
        Err(err) => match err.downcast_ref::<AppError>() {
            Some(AppError::FileNotFound) => {
                bot.answer_callback_query(q.id.clone()).text(texts::FILE_NOT_FOUND).show_alert(true).await?;
                Ok(())
            }
            _ => Err(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn callback_data_round_trips() {
        use CallbackCommand::*;

        for command in [
            Settings,
            SettingsToggleLongIds,
            SettingsChats,
            SettingsChatsConnect,
            SettingsChat(3),
            SettingsChatDelete(3),
            SettingsChatDeleteConfirm(3),
            FileRefresh(17),
            FileDelete(17),
            FileDeleteConfirm(17),
            FileRestrictions(17),
            FileRestrictionToggle(17, 3),
            FileCheckSubscription(17),
        ] {
            assert_eq!(CallbackCommand::parse(&command.encode()), Some(command));
        }
    }

    #[test]
    fn literal_segments_win_over_ids() {
        assert_eq!(
            CallbackCommand::parse("settings:chats:connect"),
            Some(CallbackCommand::SettingsChatsConnect)
        );
        assert_eq!(CallbackCommand::parse("settings:chats:8"), Some(CallbackCommand::SettingsChat(8)));
    }

    #[test]
    fn malformed_data_is_rejected() {
        for data in ["", "file", "file:x:refresh", "settings:chats:1:drop", "file:1:restrictions:chat"] {
            assert_eq!(CallbackCommand::parse(data), None, "{data:?}");
        }
    }
}
