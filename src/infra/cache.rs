//! 缓存端口
//!
//! 所有实现都是 fail-soft 的：底层故障（连接、超时、序列化）只记录告警，
//! 对调用方表现为未命中 / 写入失败，永远不向上传播错误。
//! 缓存只是优化手段，数据以数据库为准。

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde::{de::DeserializeOwned, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::infra::redis::RedisClient;

/// 键值缓存（带 TTL 和按模式批量删除）
///
/// `ttl_secs` 为 `None` 时使用默认 TTL；`Some(0)` 表示永不过期。
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 读取，未命中或出错返回 None
    async fn get(&self, key: &str) -> Option<String>;

    /// 写入，返回是否成功
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> bool;

    /// 是否存在
    async fn has(&self, key: &str) -> bool;

    /// 删除单个 key，返回是否成功
    async fn delete(&self, key: &str) -> bool;

    /// 按 glob 模式删除（如 `favorites:exists:42:*`），返回删除数量
    async fn delete_by_pattern(&self, pattern: &str) -> u64;
}

impl dyn CacheStore {
    /// 读取并反序列化，载荷无法解析时视为未命中
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("⚠️ 缓存载荷无法解析, key={}: {}", key, e);
                None
            }
        }
    }

    /// 序列化并写入
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
    ) -> bool {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw, ttl_secs).await,
            Err(e) => {
                warn!("⚠️ 缓存序列化失败, key={}: {}", key, e);
                false
            }
        }
    }
}

/// 把 `None` 解析为默认 TTL
fn effective_ttl(ttl_secs: Option<u64>, default_ttl_secs: u64) -> u64 {
    ttl_secs.unwrap_or(default_ttl_secs)
}

// ============================================================
// Redis 实现
// ============================================================

/// 基于 Redis 的缓存
pub struct RedisCacheStore {
    client: RedisClient,
    default_ttl_secs: u64,
}

impl RedisCacheStore {
    pub fn new(client: RedisClient, default_ttl_secs: u64) -> Self {
        Self {
            client,
            default_ttl_secs,
        }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Option<String> {
        match self.client.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("⚠️ 缓存读取失败, key={}: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> bool {
        let ttl = effective_ttl(ttl_secs, self.default_ttl_secs);
        let result = if ttl > 0 {
            self.client.setex(key, ttl, value).await
        } else {
            self.client.set(key, value).await
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("⚠️ 缓存写入失败, key={}: {}", key, e);
                false
            }
        }
    }

    async fn has(&self, key: &str) -> bool {
        self.client.exists(key).await.unwrap_or_else(|e| {
            warn!("⚠️ 缓存 EXISTS 失败, key={}: {}", key, e);
            false
        })
    }

    async fn delete(&self, key: &str) -> bool {
        match self.client.del(&[key.to_string()]).await {
            Ok(_) => true,
            Err(e) => {
                warn!("⚠️ 缓存删除失败, key={}: {}", key, e);
                false
            }
        }
    }

    async fn delete_by_pattern(&self, pattern: &str) -> u64 {
        let keys = match self.client.keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("⚠️ 缓存 KEYS 失败, pattern={}: {}", pattern, e);
                return 0;
            }
        };
        match self.client.del(&keys).await {
            Ok(n) => {
                debug!("🧹 按模式删除缓存 pattern={} count={}", pattern, n);
                n
            }
            Err(e) => {
                warn!("⚠️ 缓存批量删除失败, pattern={}: {}", pattern, e);
                0
            }
        }
    }
}

// ============================================================
// 进程内实现（Moka）
// ============================================================

#[derive(Clone)]
struct CachedValue {
    value: String,
    /// None 表示永不过期
    ttl: Option<Duration>,
}

/// 按条目 TTL 过期
struct PerEntryExpiry;

impl Expiry<String, CachedValue> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// 进程内缓存（未配置 Redis 或 Redis 不可用时使用）
pub struct MemoryCacheStore {
    cache: Cache<String, CachedValue>,
    default_ttl_secs: u64,
}

impl MemoryCacheStore {
    pub fn new(max_capacity: u64, default_ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();
        Self {
            cache,
            default_ttl_secs,
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key).await.map(|v| v.value)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> bool {
        let ttl = effective_ttl(ttl_secs, self.default_ttl_secs);
        let entry = CachedValue {
            value: value.to_string(),
            ttl: (ttl > 0).then(|| Duration::from_secs(ttl)),
        };
        self.cache.insert(key.to_string(), entry).await;
        true
    }

    async fn has(&self, key: &str) -> bool {
        self.cache.get(key).await.is_some()
    }

    async fn delete(&self, key: &str) -> bool {
        self.cache.invalidate(key).await;
        true
    }

    async fn delete_by_pattern(&self, pattern: &str) -> u64 {
        let matched: Vec<String> = self
            .cache
            .iter()
            .filter(|(k, _)| glob_match(pattern, k))
            .map(|(k, _)| k.to_string())
            .collect();

        for key in &matched {
            self.cache.invalidate(key).await;
        }
        matched.len() as u64
    }
}

/// Redis KEYS 风格的 glob 匹配（支持 `*` 与 `?`）
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    // 最近一个 `*` 的位置，以及它当前吞到的文本位置
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((star_pi, star_ti)) = star {
            pi = star_pi + 1;
            ti = star_ti + 1;
            star = Some((star_pi, star_ti + 1));
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
