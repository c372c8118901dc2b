// RedisClient - Redis客户端实现
// 基于 bb8-redis 连接池

use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RedisConfig;
use crate::error::ServerError;

/// Redis 客户端（基于连接池）
#[derive(Clone)]
pub struct RedisClient {
    pool: Arc<Pool<RedisConnectionManager>>,
    /// 单条 Redis 命令的执行超时
    command_timeout: Duration,
}

impl RedisClient {
    /// 创建新的 Redis 客户端并检查连通性
    pub async fn connect(config: &RedisConfig) -> Result<Self, ServerError> {
        let manager = RedisConnectionManager::new(config.url.clone()).map_err(|e| {
            ServerError::Internal(format!("Failed to create Redis manager: {}", e))
        })?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .min_idle(Some(config.min_idle))
            .connection_timeout(config.connection_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .build(manager)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to create Redis pool: {}", e)))?;

        let client = Self {
            pool: Arc::new(pool),
            command_timeout: config.command_timeout(),
        };
        client.ping().await?;

        tracing::info!(
            "✅ Redis 连接池已创建 (pool_size={}, min_idle={}, conn_timeout={}s, cmd_timeout={}ms)",
            config.pool_size,
            config.min_idle,
            config.connection_timeout_secs,
            config.command_timeout_ms,
        );

        Ok(client)
    }

    /// 从连接池获取连接
    async fn get_conn(
        &self,
    ) -> Result<bb8::PooledConnection<'_, RedisConnectionManager>, ServerError> {
        self.pool
            .get()
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    /// 执行带超时的 Redis 操作
    async fn with_timeout<F, T>(&self, op: F) -> Result<T, ServerError>
    where
        F: std::future::Future<Output = Result<T, ServerError>>,
    {
        tokio::time::timeout(self.command_timeout, op)
            .await
            .map_err(|_| {
                ServerError::Internal(format!(
                    "Redis command timeout ({}ms)",
                    self.command_timeout.as_millis()
                ))
            })?
    }

    /// PING
    pub async fn ping(&self) -> Result<(), ServerError> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            let _: String = conn
                .ping()
                .await
                .map_err(|e| ServerError::Internal(format!("Redis PING failed: {}", e)))?;
            Ok(())
        })
        .await
    }

    /// SET key value
    pub async fn set(&self, key: &str, value: &str) -> Result<(), ServerError> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            conn.set::<_, _, ()>(key, value)
                .await
                .map_err(|e| ServerError::Internal(format!("Redis SET failed: {}", e)))
        })
        .await
    }

    /// SETEX key seconds value
    pub async fn setex(&self, key: &str, seconds: u64, value: &str) -> Result<(), ServerError> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            conn.set_ex::<_, _, ()>(key, value, seconds)
                .await
                .map_err(|e| ServerError::Internal(format!("Redis SETEX failed: {}", e)))
        })
        .await
    }

    /// GET key
    pub async fn get(&self, key: &str) -> Result<Option<String>, ServerError> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            conn.get(key)
                .await
                .map_err(|e| ServerError::Internal(format!("Redis GET failed: {}", e)))
        })
        .await
    }

    /// DEL key [key ...]，返回删除的数量
    pub async fn del(&self, keys: &[String]) -> Result<u64, ServerError> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            conn.del(keys)
                .await
                .map_err(|e| ServerError::Internal(format!("Redis DEL failed: {}", e)))
        })
        .await
    }

    /// EXISTS key
    pub async fn exists(&self, key: &str) -> Result<bool, ServerError> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            conn.exists(key)
                .await
                .map_err(|e| ServerError::Internal(format!("Redis EXISTS failed: {}", e)))
        })
        .await
    }

    /// KEYS pattern
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, ServerError> {
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            conn.keys(pattern)
                .await
                .map_err(|e| ServerError::Internal(format!("Redis KEYS failed: {}", e)))
        })
        .await
    }
}
