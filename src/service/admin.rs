//! Admin-only summary counters.

use std::sync::Arc;

use crate::core::errors::AppError;
use crate::domain::User;
use crate::storage::{ChatQuery, ChatStore, DownloadStore, FileQuery, FileStore, UserStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryStats {
    pub users: i64,
    pub files: i64,
    pub downloads: i64,
    pub chats: i64,
}

pub struct AdminService {
    users: Arc<dyn UserStore>,
    files: Arc<dyn FileStore>,
    chats: Arc<dyn ChatStore>,
    downloads: Arc<dyn DownloadStore>,
}

impl AdminService {
    pub fn new(
        users: Arc<dyn UserStore>,
        files: Arc<dyn FileStore>,
        chats: Arc<dyn ChatStore>,
        downloads: Arc<dyn DownloadStore>,
    ) -> Self {
        Self { users, files, chats, downloads }
    }

    pub async fn summary(&self, user: &User) -> Result<SummaryStats, AppError> {
        if !user.is_admin {
            return Err(AppError::UserIsNotAdmin);
        }
        let (users, files, downloads, chats) = tokio::try_join!(
            self.users.count(),
            self.files.count(FileQuery::new()),
            self.downloads.count(),
            self.chats.count(ChatQuery::new()),
        )?;
        Ok(SummaryStats { users, files, downloads, chats })
    }
}
