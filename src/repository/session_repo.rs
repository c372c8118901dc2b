//! 会话仓库 - 已签发 token 的撤销/过期状态

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::Result;

/// 会话存储（以 jti 为键）
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// 记录会话；jti 冲突时只刷新过期时间，不会恢复已撤销的会话
    async fn store_session(&self, client_id: i64, jti: &str, expires_at: DateTime<Utc>)
        -> Result<()>;

    /// 会话是否失效
    ///
    /// 不存在的 jti、已过期、已撤销都返回 true，调用方不能区分三者。
    async fn is_session_revoked(&self, jti: &str) -> Result<bool>;

    /// 撤销会话，返回是否有记录被更新
    async fn revoke_token(&self, jti: &str) -> Result<bool>;

    /// 撤销某客户的全部会话，返回撤销数量
    async fn revoke_all_for_client(&self, client_id: i64) -> Result<u64>;

    /// 删除已过期的会话，返回删除数量
    async fn purge_expired(&self) -> Result<u64>;
}

/// 会话仓库 (PostgreSQL 实现)
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn store_session(
        &self,
        client_id: i64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_sessions (client_id, jti, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO UPDATE SET expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(client_id)
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_session_revoked(&self, jti: &str) -> Result<bool> {
        let row: Option<(Option<DateTime<Utc>>,)> = sqlx::query_as(
            "SELECT revoked_at FROM user_sessions WHERE jti = $1 AND expires_at > NOW()",
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            None => true,
            Some((revoked_at,)) => revoked_at.is_some(),
        })
    }

    async fn revoke_token(&self, jti: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked_at = NOW() WHERE jti = $1 AND revoked_at IS NULL",
        )
        .bind(jti)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_client(&self, client_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked_at = NOW() WHERE client_id = $1 AND revoked_at IS NULL",
        )
        .bind(client_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
