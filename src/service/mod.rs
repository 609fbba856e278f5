//! Business logic on top of the stores and the platform client.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod file;

#[cfg(test)]
pub mod testing;

pub use admin::{AdminService, SummaryStats};
pub use auth::{AuthService, UserInfo};
pub use chat::{ChannelPostInfo, ChatDetails, ChatService};
pub use file::{ChatRestrictionUpdate, ChatSubRequest, DownloadResult, FileInput, FileService, OwnedFile};
