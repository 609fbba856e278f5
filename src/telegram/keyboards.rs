//! Inline keyboard builders. All callback data goes through
//! [`CallbackCommand::encode`] so the grammar stays in one place.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::domain::{Chat, File, FileId};
use crate::service::ChatSubRequest;
use crate::telegram::handlers::CallbackCommand;

fn cb(text: &str, command: CallbackCommand) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, command.encode())
}

/// Buttons under the owner's view of a file.
pub fn owned_file(file_id: FileId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb("Обновить", CallbackCommand::FileRefresh(file_id))],
        vec![cb("Подписка на канал", CallbackCommand::FileRestrictions(file_id))],
        vec![cb("Удалить", CallbackCommand::FileDelete(file_id))],
    ])
}

pub fn file_delete_confirm(file_id: FileId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb("Да, удалить", CallbackCommand::FileDeleteConfirm(file_id))],
        vec![cb("Отмена", CallbackCommand::FileRefresh(file_id))],
    ])
}

/// Chat picker shown under the restrictions view. The active chat is
/// marked; tapping it again clears the restriction.
pub fn file_restrictions(file: &File, chats: &[Chat]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = chats
        .iter()
        .map(|chat| {
            let selected = file.restriction.chat_id == Some(chat.id);
            let label = if selected { format!("✓ {}", chat.title) } else { chat.title.clone() };
            vec![cb(&label, CallbackCommand::FileRestrictionToggle(file.id, chat.id))]
        })
        .collect();
    rows.push(vec![cb("Назад", CallbackCommand::FileRefresh(file.id))]);
    InlineKeyboardMarkup::new(rows)
}

/// Join button plus the membership re-check under the subscription gate.
pub fn subscription_gate(gate: &ChatSubRequest) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if let Some(link) = gate.link().and_then(|l| url::Url::parse(&l).ok()) {
        rows.push(vec![InlineKeyboardButton::url("Подписаться", link)]);
    }
    rows.push(vec![cb("Проверить подписку", CallbackCommand::FileCheckSubscription(gate.file_id))]);
    InlineKeyboardMarkup::new(rows)
}

/// A single link back to the channel post a file was advertised in.
pub fn linked_post(uri: &str) -> Option<InlineKeyboardMarkup> {
    let url = url::Url::parse(uri).ok()?;
    Some(InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url("Пост с файлом", url)]]))
}

pub fn settings(long_ids: bool) -> InlineKeyboardMarkup {
    let toggle = if long_ids { "Включить короткие ссылки" } else { "Включить длинные ссылки" };
    InlineKeyboardMarkup::new(vec![
        vec![cb(toggle, CallbackCommand::SettingsToggleLongIds)],
        vec![cb("Каналы и группы", CallbackCommand::SettingsChats)],
    ])
}

pub fn settings_chats(chats: &[Chat]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = chats
        .iter()
        .map(|chat| vec![cb(&chat.title, CallbackCommand::SettingsChat(chat.id))])
        .collect();
    rows.push(vec![cb("Подключить", CallbackCommand::SettingsChatsConnect)]);
    rows.push(vec![cb("Назад", CallbackCommand::Settings)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn chat_details(chat: &Chat) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb("Отключить", CallbackCommand::SettingsChatDelete(chat.id))],
        vec![cb("Назад", CallbackCommand::SettingsChats)],
    ])
}

pub fn chat_delete_confirm(chat_id: crate::domain::ChatId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![cb("Да, отключить", CallbackCommand::SettingsChatDeleteConfirm(chat_id))],
        vec![cb("Отмена", CallbackCommand::SettingsChat(chat_id))],
    ])
}

/// Cancel button for the chat-connect prompt.
pub fn connect_cancel() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb("Отмена", CallbackCommand::SettingsChats)]])
}
