//! The private-message flow: authentication, conversation state, command
//! dispatch and media intake, in that order.

use teloxide::prelude::*;
use teloxide::types::ChatKind;
use teloxide::utils::command::BotCommands;

use super::types::{spawn_typing, user_info, HandlerDeps, HandlerError};
use super::{commands, files, settings};
use crate::domain::{AudioMetadata, Kind, Metadata};
use crate::links::split_start_payload;
use crate::service::FileInput;
use crate::state::ConversationState;
use crate::telegram::bot::Command;
use crate::telegram::texts;

pub async fn handle_message(bot: Bot, msg: Message, deps: HandlerDeps) -> Result<(), HandlerError> {
    let Some(tg_user) = msg.from.clone() else {
        return Ok(());
    };
    if tg_user.is_bot {
        return Ok(());
    }

    let text = msg.text().unwrap_or_default();
    // The referral tag rides on the raw text and must reach the first
    // authenticate call, before command parsing.
    let start_ref = start_payload(text).and_then(|p| split_start_payload(p).0);

    let user = deps.auth.authenticate(&user_info(&tg_user, start_ref)).await?;

    if !matches!(msg.chat.kind, ChatKind::Private(_)) {
        return Ok(());
    }

    spawn_typing(&bot, msg.chat.id);

    if text == texts::WHAT_CAN_THIS_BOT_DO {
        bot.send_message(msg.chat.id, texts::HELP).await?;
        return Ok(());
    }

    // /start always exits a pending flow.
    if start_payload(text).is_some() {
        deps.state.delete(user.id).await?;
    } else if deps.state.get(user.id).await? == ConversationState::AwaitingChatConnectInput {
        return settings::handle_chat_connect_input(&bot, &msg, &deps, &user).await;
    }

    if let Ok(command) = Command::parse(text, deps.bot_username.as_str()) {
        return commands::handle_command(&bot, &msg, &deps, &user, command).await;
    }

    if let Some(input) = classify_media(&msg) {
        return files::handle_upload(&bot, msg.chat.id, &deps, &user, input).await;
    }

    bot.send_message(msg.chat.id, texts::UNSUPPORTED_KIND).await?;
    Ok(())
}

/// Edits carry fresh profile fields worth keeping; nothing else to do.
pub async fn handle_edited_message(msg: Message, deps: HandlerDeps) -> Result<(), HandlerError> {
    if let Some(tg_user) = msg.from.as_ref() {
        if !tg_user.is_bot {
            deps.auth.authenticate(&user_info(tg_user, None)).await?;
        }
    }
    Ok(())
}

fn start_payload(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("/start")?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix(' ').map(str::trim)
    }
}

/// Maps a media message onto the stored file fields. For photos the
/// largest size is kept.
fn classify_media(msg: &Message) -> Option<FileInput> {
    let caption = msg.caption().map(str::to_owned);

    if let Some(doc) = msg.document() {
        return Some(FileInput {
            telegram_id: doc.file.id.0.clone(),
            kind: Kind::Document,
            caption,
            mime_type: doc.mime_type.as_ref().map(|m| m.to_string()),
            name: doc.file_name.clone(),
            size: Some(i64::from(doc.file.size)),
            metadata: Metadata::default(),
        });
    }
    if let Some(animation) = msg.animation() {
        return Some(FileInput {
            telegram_id: animation.file.id.0.clone(),
            kind: Kind::Animation,
            caption,
            mime_type: animation.mime_type.as_ref().map(|m| m.to_string()),
            name: animation.file_name.clone(),
            size: Some(i64::from(animation.file.size)),
            metadata: Metadata::default(),
        });
    }
    if let Some(audio) = msg.audio() {
        return Some(FileInput {
            telegram_id: audio.file.id.0.clone(),
            kind: Kind::Audio,
            caption,
            mime_type: audio.mime_type.as_ref().map(|m| m.to_string()),
            name: audio.file_name.clone(),
            size: Some(i64::from(audio.file.size)),
            metadata: Metadata {
                audio: Some(AudioMetadata {
                    title: audio.title.clone(),
                    performer: audio.performer.clone(),
                }),
            },
        });
    }
    if let Some(sizes) = msg.photo() {
        let photo = sizes.last()?;
        return Some(FileInput {
            telegram_id: photo.file.id.0.clone(),
            kind: Kind::Photo,
            caption,
            mime_type: None,
            name: None,
            size: Some(i64::from(photo.file.size)),
            metadata: Metadata::default(),
        });
    }
    if let Some(video) = msg.video() {
        return Some(FileInput {
            telegram_id: video.file.id.0.clone(),
            kind: Kind::Video,
            caption,
            mime_type: video.mime_type.as_ref().map(|m| m.to_string()),
            name: video.file_name.clone(),
            size: Some(i64::from(video.file.size)),
            metadata: Metadata::default(),
        });
    }
    if let Some(voice) = msg.voice() {
        return Some(FileInput {
            telegram_id: voice.file.id.0.clone(),
            kind: Kind::Voice,
            caption,
            mime_type: voice.mime_type.as_ref().map(|m| m.to_string()),
            name: None,
            size: Some(i64::from(voice.file.size)),
            metadata: Metadata::default(),
        });
    }
    None
}
