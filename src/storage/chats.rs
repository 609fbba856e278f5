use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::core::errors::AppError;
use crate::domain::{Chat, ChatId, ChatType, UserId};
use crate::storage::constraint_violation;

/// Fluent filter for chat lookups.
#[derive(Debug, Clone, Default)]
pub struct ChatQuery {
    id: Option<ChatId>,
    owner_id: Option<UserId>,
    telegram_id: Option<i64>,
}

impl ChatQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: ChatId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn owner_id(mut self, owner: UserId) -> Self {
        self.owner_id = Some(owner);
        self
    }

    pub fn telegram_id(mut self, id: i64) -> Self {
        self.telegram_id = Some(id);
        self
    }

    /// Same predicate the SQL filter expresses, for in-memory stores.
    pub fn matches(&self, chat: &Chat) -> bool {
        self.id.is_none_or(|id| chat.id == id)
            && self.owner_id.is_none_or(|owner| chat.owner_id == owner)
            && self.telegram_id.is_none_or(|id| chat.telegram_id == id)
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
        if let Some(telegram_id) = self.telegram_id {
            qb.push(sep).push("telegram_id = ").push_bind(telegram_id);
        }
    }
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Inserts the chat and backfills its generated id. A duplicate
    /// `(owner, telegram_id)` pair surfaces as
    /// [`AppError::ChatAlreadyConnected`].
    async fn add(&self, chat: &mut Chat) -> Result<(), AppError>;
    async fn update(&self, chat: &Chat) -> Result<(), AppError>;
    /// Errors with [`AppError::ChatNotFound`] when nothing matches.
    async fn one(&self, query: ChatQuery) -> Result<Chat, AppError>;
    async fn all(&self, query: ChatQuery) -> Result<Vec<Chat>, AppError>;
    async fn count(&self, query: ChatQuery) -> Result<i64, AppError>;
    /// Returns the number of deleted rows.
    async fn delete(&self, query: ChatQuery) -> Result<u64, AppError>;
}

pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ChatRow {
    id: i64,
    telegram_id: i64,
    title: String,
    kind: String,
    owner_id: i64,
    linked_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ChatRow> for Chat {
    type Error = AppError;

    fn try_from(row: ChatRow) -> Result<Self, Self::Error> {
        Ok(Chat {
            id: row.id,
            telegram_id: row.telegram_id,
            title: row.title,
            kind: ChatType::parse(&row.kind)?,
            owner_id: row.owner_id,
            linked_at: row.linked_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT: &str = "select id, telegram_id, title, kind, owner_id, linked_at, updated_at from chat";

#[async_trait]
impl ChatStore for PgChatStore {
    async fn add(&self, chat: &mut Chat) -> Result<(), AppError> {
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"insert into chat (telegram_id, title, kind, owner_id, linked_at, updated_at)
               values ($1, $2, $3, $4, $5, $6)
               returning id"#,
        )
        .bind(chat.telegram_id)
        .bind(&chat.title)
        .bind(chat.kind.as_str())
        .bind(chat.owner_id)
        .bind(chat.linked_at)
        .bind(chat.updated_at)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(id) => {
                chat.id = id;
                Ok(())
            }
            Err(err) if constraint_violation(&err, "chat_owner_id_telegram_id_key") => {
                Err(AppError::ChatAlreadyConnected)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn update(&self, chat: &Chat) -> Result<(), AppError> {
        let result = sqlx::query("update chat set title = $2, updated_at = $3 where id = $1")
            .bind(chat.id)
            .bind(&chat.title)
            .bind(chat.updated_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ChatNotFound);
        }
        Ok(())
    }

    async fn one(&self, query: ChatQuery) -> Result<Chat, AppError> {
        let mut qb = QueryBuilder::new(SELECT);
        query.apply(&mut qb);
        let row: Option<ChatRow> = qb.build_query_as().fetch_optional(&self.pool).await?;
        row.ok_or(AppError::ChatNotFound)?.try_into()
    }

    async fn all(&self, query: ChatQuery) -> Result<Vec<Chat>, AppError> {
        let mut qb = QueryBuilder::new(SELECT);
        query.apply(&mut qb);
        qb.push(" order by linked_at");
        let rows: Vec<ChatRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Chat::try_from).collect()
    }

    async fn count(&self, query: ChatQuery) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::new("select count(*) from chat");
        query.apply(&mut qb);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn delete(&self, query: ChatQuery) -> Result<u64, AppError> {
        let mut qb = QueryBuilder::new("delete from chat");
        query.apply(&mut qb);
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
