use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::core::errors::AppError;
use crate::domain::{ChatId, DownloadRestriction, File, FileId, Kind, Metadata, UserId};
use crate::storage::constraint_violation;

/// Fluent filter for file lookups. Empty filters match everything.
#[derive(Debug, Clone, Default)]
pub struct FileQuery {
    id: Option<FileId>,
    owner_id: Option<UserId>,
    public_ids: Vec<String>,
    restriction_chat_id: Option<ChatId>,
}

impl FileQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: FileId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn owner_id(mut self, owner: UserId) -> Self {
        self.owner_id = Some(owner);
        self
    }

    pub fn public_id(mut self, id: impl Into<String>) -> Self {
        self.public_ids = vec![id.into()];
        self
    }

    pub fn public_ids(mut self, ids: Vec<String>) -> Self {
        self.public_ids = ids;
        self
    }

    pub fn restriction_chat_id(mut self, chat: ChatId) -> Self {
        self.restriction_chat_id = Some(chat);
        self
    }

    /// Same predicate the SQL filter expresses, for in-memory stores.
    pub fn matches(&self, file: &File) -> bool {
        self.id.is_none_or(|id| file.id == id)
            && self.owner_id.is_none_or(|owner| file.owner_id == owner)
            && (self.public_ids.is_empty() || self.public_ids.contains(&file.public_id))
            && self.restriction_chat_id.is_none_or(|chat| file.restriction.chat_id == Some(chat))
    }

    fn apply(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut sep = " where ";
        if let Some(id) = self.id {
            qb.push(sep).push("id = ").push_bind(id);
            sep = " and ";
        }
        if let Some(owner) = self.owner_id {
            qb.push(sep).push("owner_id = ").push_bind(owner);
            sep = " and ";
        }
        if !self.public_ids.is_empty() {
            qb.push(sep).push("public_id = any(").push_bind(self.public_ids.clone()).push(")");
            sep = " and ";
        }
        if let Some(chat) = self.restriction_chat_id {
            qb.push(sep).push("restriction_chat_id = ").push_bind(chat);
        }
    }
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Inserts the file and backfills its generated id. A duplicate public
    /// id surfaces as [`AppError::PublicIdCollision`].
    async fn add(&self, file: &mut File) -> Result<(), AppError>;
    async fn update(&self, file: &File) -> Result<(), AppError>;
    /// Errors with [`AppError::FileNotFound`] when nothing matches.
    async fn one(&self, query: FileQuery) -> Result<File, AppError>;
    async fn all(&self, query: FileQuery) -> Result<Vec<File>, AppError>;
    async fn count(&self, query: FileQuery) -> Result<i64, AppError>;
    /// Returns the number of deleted rows.
    async fn delete(&self, query: FileQuery) -> Result<u64, AppError>;
}

pub struct PgFileStore {
    pool: PgPool,
}

impl PgFileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FileRow {
    id: i64,
    telegram_id: String,
    public_id: String,
    caption: Option<String>,
    kind: String,
    mime_type: Option<String>,
    name: Option<String>,
    size: Option<i64>,
    owner_id: i64,
    restriction_chat_id: Option<i64>,
    linked_post_uri: Option<String>,
    metadata: Json<Metadata>,
    created_at: DateTime<Utc>,
}

impl TryFrom<FileRow> for File {
    type Error = AppError;

    fn try_from(row: FileRow) -> Result<Self, Self::Error> {
        Ok(File {
            id: row.id,
            telegram_id: row.telegram_id,
            public_id: row.public_id,
            caption: row.caption,
            kind: Kind::parse(&row.kind)?,
            mime_type: row.mime_type,
            name: row.name,
            size: row.size,
            owner_id: row.owner_id,
            restriction: DownloadRestriction { chat_id: row.restriction_chat_id },
            linked_post_uri: row.linked_post_uri,
            metadata: row.metadata.0,
            created_at: row.created_at,
        })
    }
}

const SELECT: &str = "select id, telegram_id, public_id, caption, kind, mime_type, name, size, \
                      owner_id, restriction_chat_id, linked_post_uri, metadata, created_at from file";

#[async_trait]
impl FileStore for PgFileStore {
    async fn add(&self, file: &mut File) -> Result<(), AppError> {
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"insert into file
                   (telegram_id, public_id, caption, kind, mime_type, name, size, owner_id,
                    restriction_chat_id, linked_post_uri, metadata, created_at)
               values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
               returning id"#,
        )
        .bind(&file.telegram_id)
        .bind(&file.public_id)
        .bind(&file.caption)
        .bind(file.kind.as_str())
        .bind(&file.mime_type)
        .bind(&file.name)
        .bind(file.size)
        .bind(file.owner_id)
        .bind(file.restriction.chat_id)
        .bind(&file.linked_post_uri)
        .bind(Json(&file.metadata))
        .bind(file.created_at)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(id) => {
                file.id = id;
                Ok(())
            }
            Err(err) if constraint_violation(&err, "file_public_id_key") => Err(AppError::PublicIdCollision),
            Err(err) => Err(err.into()),
        }
    }

    async fn update(&self, file: &File) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"update file
               set public_id = $2, caption = $3, restriction_chat_id = $4, linked_post_uri = $5,
                   metadata = $6
               where id = $1"#,
        )
        .bind(file.id)
        .bind(&file.public_id)
        .bind(&file.caption)
        .bind(file.restriction.chat_id)
        .bind(&file.linked_post_uri)
        .bind(Json(&file.metadata))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::FileNotFound);
        }
        Ok(())
    }

    async fn one(&self, query: FileQuery) -> Result<File, AppError> {
        let mut qb = QueryBuilder::new(SELECT);
        query.apply(&mut qb);
        let row: Option<FileRow> = qb.build_query_as().fetch_optional(&self.pool).await?;
        row.ok_or(AppError::FileNotFound)?.try_into()
    }

    async fn all(&self, query: FileQuery) -> Result<Vec<File>, AppError> {
        let mut qb = QueryBuilder::new(SELECT);
        query.apply(&mut qb);
        qb.push(" order by id");
        let rows: Vec<FileRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(File::try_from).collect()
    }

    async fn count(&self, query: FileQuery) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::new("select count(*) from file");
        query.apply(&mut qb);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn delete(&self, query: FileQuery) -> Result<u64, AppError> {
        let mut qb = QueryBuilder::new("delete from file");
        query.apply(&mut qb);
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
