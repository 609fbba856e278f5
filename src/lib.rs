//! Telegram bot that turns uploaded media into shareable deep links, with
//! optional channel-subscription gating per file.

pub mod cli;
pub mod core;
pub mod domain;
pub mod ids;
pub mod links;
pub mod service;
pub mod state;
pub mod storage;
pub mod telegram;

pub use crate::core::errors::AppError;
