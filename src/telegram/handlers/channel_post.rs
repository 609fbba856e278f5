//! Channel-post branch: title renames and link-back attribution of posts
//! that advertise shared files.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButtonKind, MessageEntityKind};

use super::types::{HandlerDeps, HandlerError};
use crate::service::ChannelPostInfo;

pub async fn handle_channel_post(msg: Message, deps: HandlerDeps) -> Result<(), HandlerError> {
    if let Some(title) = msg.new_chat_title() {
        deps.chats.update_title(msg.chat.id.0, title).await?;
        return Ok(());
    }

    let urls = collect_urls(&msg);
    if urls.is_empty() {
        return Ok(());
    }

    let post = ChannelPostInfo {
        chat_id: msg.chat.id.0,
        chat_username: msg.chat.username().map(str::to_owned),
        message_id: msg.id.0,
    };
    let stamped = deps.chats.attribute_channel_post(&post, &urls).await?;
    if stamped > 0 {
        log::info!(
            "channel post linked: chat={} post={} files={}",
            post.chat_id,
            post.message_id,
            stamped
        );
    }
    Ok(())
}

/// Every URL a post carries: text entities, caption entities and inline
/// keyboard buttons.
fn collect_urls(msg: &Message) -> Vec<String> {
    let mut urls = Vec::new();

    let entity_lists = [msg.parse_entities(), msg.parse_caption_entities()];
    for entities in entity_lists.into_iter().flatten() {
        for entity in entities {
            match entity.kind() {
                MessageEntityKind::Url => urls.push(entity.text().to_owned()),
                MessageEntityKind::TextLink { url } => urls.push(url.to_string()),
                _ => {}
            }
        }
    }

    if let Some(markup) = msg.reply_markup() {
        for row in &markup.inline_keyboard {
            for button in row {
                if let InlineKeyboardButtonKind::Url(url) = &button.kind {
                    urls.push(url.to_string());
                }
            }
        }
    }

    urls
}
