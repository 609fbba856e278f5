//! Domain model: users, shared files, linked chats, download events.

pub mod chat;
pub mod download;
pub mod file;
pub mod user;

pub use chat::{Chat, ChatId, ChatType};
pub use download::{ChatDownloadStats, Download, DownloadId, DownloadStats};
pub use file::{AudioMetadata, DownloadRestriction, File, FileId, Kind, Metadata};
pub use user::{User, UserId, UserSettings};
