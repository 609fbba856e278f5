//! Slash-command dispatch.

use teloxide::prelude::*;

use super::types::{HandlerDeps, HandlerError};
use super::{files, settings};
use crate::core::errors::AppError;
use crate::domain::User;
use crate::links::split_start_payload;
use crate::telegram::bot::Command;
use crate::telegram::texts;

pub async fn handle_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    user: &User,
    command: Command,
) -> Result<(), HandlerError> {
    match command {
        Command::Start(payload) => {
            let (_, public_id) = split_start_payload(&payload);
            match public_id {
                Some(public_id) => resolve_deep_link(bot, msg.chat.id, deps, user, public_id).await,
                None => {
                    bot.send_message(msg.chat.id, texts::HELP).await?;
                    Ok(())
                }
            }
        }
        Command::Help => {
            bot.send_message(msg.chat.id, texts::HELP).await?;
            Ok(())
        }
        Command::Settings => settings::send_settings_view(bot, msg.chat.id, user).await,
        Command::Admin => {
            match deps.admin.summary(user).await {
                Ok(stats) => {
                    bot.send_message(msg.chat.id, texts::admin_summary(&stats)).await?;
                }
                Err(AppError::UserIsNotAdmin) => {
                    log::debug!("admin summary denied: user={}", user.id);
                }
                Err(err) => return Err(err.into()),
            }
            Ok(())
        }
        Command::Version => {
            bot.send_message(msg.chat.id, texts::version()).await?;
            Ok(())
        }
    }
}

async fn resolve_deep_link(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    user: &User,
    public_id: &str,
) -> Result<(), HandlerError> {
    match deps.files.resolve_by_public_id(user, public_id).await {
        Ok(result) => files::send_resolution(bot, chat_id, deps, result).await,
        Err(AppError::FileNotFound) => {
            bot.send_message(chat_id, texts::FILE_NOT_FOUND).await?;
            Ok(())
        }
        Err(AppError::MembershipUnverifiable) => {
            bot.send_message(chat_id, texts::MEMBERSHIP_UNVERIFIABLE).await?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
