use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::core::errors::AppError;
use crate::domain::{User, UserId, UserSettings};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn add(&self, user: &User) -> Result<(), AppError>;
    async fn find(&self, id: UserId) -> Result<Option<User>, AppError>;
    /// Errors with [`AppError::UserNotFound`] when the row is gone.
    async fn update(&self, user: &User) -> Result<(), AppError>;
    async fn count(&self) -> Result<i64, AppError>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    first_name: String,
    last_name: Option<String>,
    username: Option<String>,
    language_code: Option<String>,
    is_admin: bool,
    #[sqlx(rename = "ref")]
    ref_tag: Option<String>,
    long_ids: bool,
    settings_updated_at: Option<DateTime<Utc>>,
    joined_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            username: row.username,
            language_code: row.language_code,
            is_admin: row.is_admin,
            ref_tag: row.ref_tag,
            settings: UserSettings {
                long_ids: row.long_ids,
                updated_at: row.settings_updated_at,
            },
            joined_at: row.joined_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn add(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"insert into "user"
                   (id, first_name, last_name, username, language_code, is_admin, ref,
                    long_ids, settings_updated_at, joined_at, updated_at)
               values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.language_code)
        .bind(user.is_admin)
        .bind(&user.ref_tag)
        .bind(user.settings.long_ids)
        .bind(user.settings.updated_at)
        .bind(user.joined_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: UserId) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"select id, first_name, last_name, username, language_code, is_admin, ref,
                      long_ids, settings_updated_at, joined_at, updated_at
               from "user" where id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"update "user"
               set first_name = $2, last_name = $3, username = $4, language_code = $5,
                   is_admin = $6, ref = $7, long_ids = $8, settings_updated_at = $9,
                   updated_at = $10
               where id = $1"#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.language_code)
        .bind(user.is_admin)
        .bind(&user.ref_tag)
        .bind(user.settings.long_ids)
        .bind(user.settings.updated_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(r#"select count(*) from "user""#).fetch_one(&self.pool).await?;
        Ok(count)
    }
}
