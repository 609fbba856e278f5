use chrono::{DateTime, Utc};

use crate::domain::file::FileId;
use crate::domain::user::UserId;

pub type DownloadId = i64;

/// One access event. Immutable once created; references are nullable so a
/// pure count row survives deletion of the file or the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub id: DownloadId,
    pub file_id: Option<FileId>,
    pub user_id: Option<UserId>,
    /// `Some(true)` when the user joined the restriction chat to gain
    /// access, `Some(false)` when already a member, `None` when the file
    /// had no restriction.
    pub new_subscription: Option<bool>,
    pub at: DateTime<Utc>,
}

/// Aggregated download counters for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub total: i64,
    pub unique_users: i64,
    pub with_subscription: i64,
    pub new_subscription: i64,
}

/// Aggregated counters across all files restricted by one chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatDownloadStats {
    pub with_subscription: i64,
    pub new_subscription: i64,
}
