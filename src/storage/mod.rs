//! Postgres persistence: connection pool, schema bootstrap and the store
//! implementations behind the repository traits.

pub mod chats;
pub mod downloads;
pub mod files;
pub mod users;

pub use chats::{ChatQuery, ChatStore, PgChatStore};
pub use downloads::{DownloadStore, PgDownloadStore};
pub use files::{FileQuery, FileStore, PgFileStore};
pub use users::{PgUserStore, UserStore};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const SCHEMA: &str = include_str!("schema.sql");

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(10).connect(database_url).await
}

/// Brings the schema up to date. Idempotent.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// True when `err` is a violation of the named constraint.
pub(crate) fn constraint_violation(err: &sqlx::Error, name: &str) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.constraint() == Some(name))
}
