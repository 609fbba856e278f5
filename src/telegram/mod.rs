//! Telegram integration: bot setup, the handler tree and the platform
//! client boundary.

pub mod bot;
pub mod client;
pub mod handlers;
pub mod keyboards;
pub mod texts;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
