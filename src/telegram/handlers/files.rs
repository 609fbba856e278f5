//! File flows: upload intake, the owner's file card, guest delivery and
//! the subscription gate.

use teloxide::prelude::*;
use teloxide::types::{FileId as TgFileId, InputFile, MessageId};
use teloxide::{ApiError, RequestError};

use super::types::{HandlerDeps, HandlerError};
use crate::core::errors::AppError;
use crate::domain::{File, FileId, Kind, User};
use crate::service::{ChatSubRequest, DownloadResult, FileInput, OwnedFile};
use crate::telegram::{keyboards, texts};

pub async fn handle_upload(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    user: &User,
    input: FileInput,
) -> Result<(), HandlerError> {
    let owned = deps.files.add_file(user, input).await?;
    log::info!(
        "file stored: owner={} id={} kind={}",
        user.id,
        owned.file.id,
        owned.file.kind.as_str()
    );
    send_owned_view(bot, chat_id, deps, &owned).await
}

/// Delivers a resolved share link to the requester.
pub async fn send_resolution(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    result: DownloadResult,
) -> Result<(), HandlerError> {
    match result {
        DownloadResult::Owned(owned) => send_owned_view(bot, chat_id, deps, &owned).await,
        DownloadResult::Guest(file) => send_guest_file(bot, chat_id, &file).await,
        DownloadResult::SubscriptionRequired(gate) => send_gate(bot, chat_id, &gate).await,
    }
}

/// The owner's file card: share link, counters and management buttons.
pub async fn send_owned_view(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    owned: &OwnedFile,
) -> Result<(), HandlerError> {
    bot.send_message(chat_id, texts::owned_file(&deps.bot_username, owned))
        .reply_markup(keyboards::owned_file(owned.file.id))
        .await?;
    Ok(())
}

/// Refreshes the file card in place.
pub async fn edit_owned_view(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    user: &User,
    file_id: FileId,
) -> Result<(), HandlerError> {
    let owned = deps.files.owned_file(user, file_id).await?;
    let edit = bot
        .edit_message_text(chat_id, message_id, texts::owned_file(&deps.bot_username, &owned))
        .reply_markup(keyboards::owned_file(owned.file.id))
        .await;
    ignore_not_modified(edit)?;
    Ok(())
}

pub async fn edit_delete_confirm(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    file_id: FileId,
) -> Result<(), HandlerError> {
    bot.edit_message_text(chat_id, message_id, texts::FILE_DELETE_CONFIRM)
        .reply_markup(keyboards::file_delete_confirm(file_id))
        .await?;
    Ok(())
}

pub async fn edit_restrictions_view(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    deps: &HandlerDeps,
    user: &User,
    file_id: FileId,
) -> Result<(), HandlerError> {
    let (file, chats) = deps.files.file_restrictions(user, file_id).await?;
    let text = if chats.is_empty() { texts::RESTRICTIONS_NO_CHATS } else { texts::RESTRICTIONS_PROMPT };
    let edit = bot
        .edit_message_text(chat_id, message_id, text)
        .reply_markup(keyboards::file_restrictions(&file, &chats))
        .await;
    ignore_not_modified(edit)?;
    Ok(())
}

/// The "check subscription" button under the gate. A confirmed member gets
/// the file right away; the pending marker attributes that download.
pub async fn handle_check_subscription(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    deps: &HandlerDeps,
    user: &User,
    file_id: FileId,
) -> Result<(), HandlerError> {
    match deps.files.check_membership(user, file_id).await {
        Ok(true) => {
            let result = deps.files.resolve_by_id(user, file_id).await?;
            send_resolution(bot, chat_id, deps, result).await?;
            bot.answer_callback_query(q.id.clone()).await?;
            Ok(())
        }
        Ok(false) => {
            bot.answer_callback_query(q.id.clone())
                .text(texts::NOT_SUBSCRIBED_YET)
                .show_alert(true)
                .await?;
            Ok(())
        }
        Err(AppError::MembershipUnverifiable) => {
            bot.answer_callback_query(q.id.clone())
                .text(texts::MEMBERSHIP_UNVERIFIABLE)
                .show_alert(true)
                .await?;
            Ok(())
        }
        Err(AppError::FileNotFound) => {
            bot.answer_callback_query(q.id.clone())
                .text(texts::FILE_NOT_FOUND)
                .show_alert(true)
                .await?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

async fn send_gate(bot: &Bot, chat_id: ChatId, gate: &ChatSubRequest) -> Result<(), HandlerError> {
    bot.send_message(chat_id, texts::subscription_gate(gate))
        .reply_markup(keyboards::subscription_gate(gate))
        .await?;
    Ok(())
}

/// Re-sends the stored media to a guest by its Telegram file id.
async fn send_guest_file(bot: &Bot, chat_id: ChatId, file: &File) -> Result<(), HandlerError> {
    let media = InputFile::file_id(TgFileId(file.telegram_id.clone()));
    let markup = file.linked_post_uri.as_deref().and_then(keyboards::linked_post);

    match file.kind {
        Kind::Document => {
            let mut req = bot.send_document(chat_id, media);
            if let Some(caption) = &file.caption {
                req = req.caption(caption.clone());
            }
            if let Some(markup) = markup {
                req = req.reply_markup(markup);
            }
            req.await?;
        }
        Kind::Animation => {
            let mut req = bot.send_animation(chat_id, media);
            if let Some(caption) = &file.caption {
                req = req.caption(caption.clone());
            }
            if let Some(markup) = markup {
                req = req.reply_markup(markup);
            }
            req.await?;
        }
        Kind::Audio => {
            let mut req = bot.send_audio(chat_id, media);
            if let Some(caption) = &file.caption {
                req = req.caption(caption.clone());
            }
            if let Some(title) = file.metadata.audio.as_ref().and_then(|a| a.title.clone()) {
                req = req.title(title);
            }
            if let Some(performer) = file.metadata.audio.as_ref().and_then(|a| a.performer.clone()) {
                req = req.performer(performer);
            }
            if let Some(markup) = markup {
                req = req.reply_markup(markup);
            }
            req.await?;
        }
        Kind::Photo => {
            let mut req = bot.send_photo(chat_id, media);
            if let Some(caption) = &file.caption {
                req = req.caption(caption.clone());
            }
            if let Some(markup) = markup {
                req = req.reply_markup(markup);
            }
            req.await?;
        }
        Kind::Video => {
            let mut req = bot.send_video(chat_id, media);
            if let Some(caption) = &file.caption {
                req = req.caption(caption.clone());
            }
            if let Some(markup) = markup {
                req = req.reply_markup(markup);
            }
            req.await?;
        }
        Kind::Voice => {
            let mut req = bot.send_voice(chat_id, media);
            if let Some(caption) = &file.caption {
                req = req.caption(caption.clone());
            }
            if let Some(markup) = markup {
                req = req.reply_markup(markup);
            }
            req.await?;
        }
    }
    Ok(())
}

/// Refresh taps on an unchanged card are not an error.
fn ignore_not_modified<T>(result: Result<T, RequestError>) -> Result<(), RequestError> {
    match result {
        Ok(_) => Ok(()),
        Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(err) => Err(err),
    }
}
