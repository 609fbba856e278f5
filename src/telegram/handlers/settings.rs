//! Settings flows: the preferences card, the connected-chats screens and
//! the chat-connect conversation.

use teloxide::prelude::*;
use teloxide::types::{MessageId, MessageOrigin};

use super::types::{HandlerDeps, HandlerError};
use crate::domain::{ChatId as DomainChatId, User};
use crate::links::{parse_chat_input, ChatInput, JoinLinkPayload};
use crate::state::ConversationState;
use crate::telegram::client::ChatRef;
use crate::telegram::{keyboards, texts};

pub async fn send_settings_view(bot: &Bot, chat_id: ChatId, user: &User) -> Result<(), HandlerError> {
    bot.send_message(chat_id, texts::settings(user.settings.long_ids))
        .reply_markup(keyboards::settings(user.settings.long_ids))
        .await?;
    Ok(())
}

pub async fn edit_settings_view(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    user: &User,
) -> Result<(), HandlerError> {
    bot.edit_message_text(chat_id, message_id, texts::settings(user.settings.long_ids))
        .reply_markup(keyboards::settings(user.settings.long_ids))
        .await?;
    Ok(())
}

pub async fn edit_chats_view(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    user: &User,
) -> Result<(), HandlerError> {
    let chats = deps.chats.list(user).await?;
    let text = if chats.is_empty() { texts::SETTINGS_CHATS_EMPTY } else { texts::SETTINGS_CHATS };
    bot.edit_message_text(chat_id, message_id, text)
        .reply_markup(keyboards::settings_chats(&chats))
        .await?;
    Ok(())
}

pub async fn edit_chat_details_view(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    user: &User,
    target: DomainChatId,
) -> Result<(), HandlerError> {
    let details = deps.chats.details(user, target).await?;
    bot.edit_message_text(chat_id, message_id, texts::chat_details(&details))
        .reply_markup(keyboards::chat_details(&details.chat))
        .await?;
    Ok(())
}

pub async fn edit_chat_delete_confirm(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    target: DomainChatId,
) -> Result<(), HandlerError> {
    bot.edit_message_text(chat_id, message_id, texts::CHAT_DELETE_CONFIRM)
        .reply_markup(keyboards::chat_delete_confirm(target))
        .await?;
    Ok(())
}

/// Puts the user into the connect conversation and shows the prompt.
pub async fn start_chat_connect(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    user: &User,
) -> Result<(), HandlerError> {
    deps.state.set(user.id, ConversationState::AwaitingChatConnectInput).await?;
    bot.edit_message_text(chat_id, message_id, texts::CONNECT_PROMPT)
        .reply_markup(keyboards::connect_cancel())
        .await?;
    Ok(())
}

/// The next private message after the connect prompt. Accepts a forwarded
/// channel post, an invite link or a public username; anything else keeps
/// the conversation open.
pub async fn handle_chat_connect_input(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    user: &User,
) -> Result<(), HandlerError> {
    let Some(chat_ref) = connect_target(msg) else {
        bot.send_message(msg.chat.id, texts::CONNECT_BAD_INPUT).await?;
        return Ok(());
    };

    match deps.chats.connect(user, chat_ref).await {
        Ok(chat) => {
            deps.state.delete(user.id).await?;
            bot.send_message(msg.chat.id, texts::chat_connected(&chat)).await?;
            Ok(())
        }
        Err(err) => match texts::connect_error(&err) {
            Some(text) => {
                bot.send_message(msg.chat.id, text).await?;
                Ok(())
            }
            None => Err(err.into()),
        },
    }
}

fn connect_target(msg: &Message) -> Option<ChatRef> {
    if let Some(MessageOrigin::Channel { chat, .. }) = msg.forward_origin() {
        return Some(ChatRef::Id(chat.id.0));
    }
    match parse_chat_input(msg.text()?)? {
        ChatInput::JoinLink(token) => {
            let payload = JoinLinkPayload::decode(&token).ok()?;
            Some(ChatRef::Id(payload.bot_chat_id()))
        }
        ChatInput::Username(name) => Some(ChatRef::username(&name)),
    }
}
