//! Dispatcher schema. The same handler tree serves production and tests.

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use super::types::{HandlerDeps, HandlerError};
use super::{callbacks, channel_post, messages};

pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_channel_post = deps.clone();
    let deps_edited = deps.clone();
    let deps_messages = deps.clone();
    let deps_callbacks = deps;

    dptree::entry()
        .branch(Update::filter_channel_post().endpoint(move |msg: Message| {
            let deps = deps_channel_post.clone();
            async move { channel_post::handle_channel_post(msg, deps).await }
        }))
        .branch(Update::filter_edited_message().endpoint(move |msg: Message| {
            let deps = deps_edited.clone();
            async move { messages::handle_edited_message(msg, deps).await }
        }))
        .branch(Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
            let deps = deps_messages.clone();
            async move { messages::handle_message(bot, msg, deps).await }
        }))
        .branch(Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
            let deps = deps_callbacks.clone();
            async move { callbacks::handle_callback(bot, q, deps).await }
        }))
}
