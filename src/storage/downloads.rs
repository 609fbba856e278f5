use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::errors::AppError;
use crate::domain::{ChatDownloadStats, ChatId, Download, DownloadStats, FileId};

#[async_trait]
pub trait DownloadStore: Send + Sync {
    /// Inserts the download and backfills its generated id.
    async fn add(&self, download: &mut Download) -> Result<(), AppError>;
    async fn file_stats(&self, file: FileId) -> Result<DownloadStats, AppError>;
    async fn chat_stats(&self, chat: ChatId) -> Result<ChatDownloadStats, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
}

pub struct PgDownloadStore {
    pool: PgPool,
}

impl PgDownloadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FileStatsRow {
    total: i64,
    unique_users: i64,
    with_subscription: i64,
    new_subscription: i64,
}

#[derive(sqlx::FromRow)]
struct ChatStatsRow {
    with_subscription: i64,
    new_subscription: i64,
}

#[async_trait]
impl DownloadStore for PgDownloadStore {
    async fn add(&self, download: &mut Download) -> Result<(), AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"insert into download (file_id, user_id, new_subscription, at)
               values ($1, $2, $3, $4)
               returning id"#,
        )
        .bind(download.file_id)
        .bind(download.user_id)
        .bind(download.new_subscription)
        .bind(download.at)
        .fetch_one(&self.pool)
        .await?;
        download.id = id;
        Ok(())
    }

    async fn file_stats(&self, file: FileId) -> Result<DownloadStats, AppError> {
        let row: FileStatsRow = sqlx::query_as(
            r#"select
                   count(*) as total,
                   count(distinct user_id) as unique_users,
                   count(*) filter (where new_subscription is not null) as with_subscription,
                   count(*) filter (where new_subscription) as new_subscription
               from download
               where file_id = $1"#,
        )
        .bind(file)
        .fetch_one(&self.pool)
        .await?;

        Ok(DownloadStats {
            total: row.total,
            unique_users: row.unique_users,
            with_subscription: row.with_subscription,
            new_subscription: row.new_subscription,
        })
    }

    async fn chat_stats(&self, chat: ChatId) -> Result<ChatDownloadStats, AppError> {
        let row: ChatStatsRow = sqlx::query_as(
            r#"select
                   count(*) filter (where d.new_subscription is not null) as with_subscription,
                   count(*) filter (where d.new_subscription) as new_subscription
               from download d
               join file f on f.id = d.file_id
               where f.restriction_chat_id = $1"#,
        )
        .bind(chat)
        .fetch_one(&self.pool)
        .await?;

        Ok(ChatDownloadStats {
            with_subscription: row.with_subscription,
            new_subscription: row.new_subscription,
        })
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("select count(*) from download").fetch_one(&self.pool).await?;
        Ok(count)
    }
}
