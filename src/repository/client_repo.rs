//! 客户仓库

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{Result, ServerError};
use crate::model::Client;

/// 客户存储
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Client>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Client>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>>;

    /// 插入新客户，返回带 ID 的实体
    async fn save(&self, client: &Client) -> Result<Client>;

    /// 更新已有客户
    async fn update(&self, client: &Client) -> Result<Client>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// 邮箱是否已被占用（可排除某个客户自身）
    async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> Result<bool>;
}

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: i64,
    name: String,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(r: ClientRow) -> Self {
        Client::restore(r.id, r.name, r.email, r.password, r.created_at, r.updated_at)
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, email, password, created_at, updated_at FROM clients";

/// 客户仓库 (PostgreSQL 实现)
#[derive(Clone)]
pub struct PgClientRepository {
    pool: PgPool,
}

impl PgClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRepository for PgClientRepository {
    async fn find_all(&self) -> Result<Vec<Client>> {
        let rows = sqlx::query_as::<_, ClientRow>(&format!("{} ORDER BY id", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Client::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Client::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(&format!("{} WHERE email = $1", SELECT_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Client::from))
    }

    async fn save(&self, client: &Client) -> Result<Client> {
        let row = sqlx::query_as::<_, ClientRow>(
            r#"
            INSERT INTO clients (name, email, password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password, created_at, updated_at
            "#,
        )
        .bind(client.name())
        .bind(client.email())
        .bind(client.password_hash())
        .bind(client.created_at())
        .bind(client.updated_at())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update(&self, client: &Client) -> Result<Client> {
        let id = client
            .id()
            .ok_or_else(|| ServerError::Internal("更新未持久化的客户".to_string()))?;

        let row = sqlx::query_as::<_, ClientRow>(
            r#"
            UPDATE clients
            SET name = $2, email = $3, password = $4, updated_at = $5
            WHERE id = $1
            RETURNING id, name, email, password, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(client.name())
        .bind(client.email())
        .bind(client.password_hash())
        .bind(client.updated_at())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Client::from)
            .ok_or_else(|| ServerError::NotFound("Client not found".to_string()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM clients WHERE email = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
