//! 带缓存的收藏商品仓库（cache-aside）
//!
//! 读：先查缓存，未命中再查数据库并回填。
//! 写：始终写数据库，成功后删除相关缓存（不回填），下次读取时重新加载。
//! 写入与失效之间不加锁，陈旧窗口由 TTL 和写后失效共同限定。

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::infra::CacheStore;
use crate::model::{FavoriteProduct, FavoriteRecord};
use crate::repository::FavoriteRepository;

/// 存在性缓存的最长 TTL（秒）
pub const EXISTS_TTL_CAP_SECS: u64 = 300;

/// 客户收藏列表
pub fn client_list_key(client_id: i64) -> String {
    format!("favorites:client:{}", client_id)
}

/// 单个收藏（含"不存在"标记）
pub fn client_product_key(client_id: i64, product_id: i64) -> String {
    format!("favorites:client_product:{}:{}", client_id, product_id)
}

/// 存在性
pub fn exists_key(client_id: i64, product_id: i64) -> String {
    format!("favorites:exists:{}:{}", client_id, product_id)
}

/// 带缓存的收藏仓库，包装任意持久化实现
pub struct CachedFavoriteRepository {
    inner: Arc<dyn FavoriteRepository>,
    cache: Arc<dyn CacheStore>,
    ttl_secs: u64,
}

impl CachedFavoriteRepository {
    pub fn new(inner: Arc<dyn FavoriteRepository>, cache: Arc<dyn CacheStore>, ttl_secs: u64) -> Self {
        Self {
            inner,
            cache,
            ttl_secs,
        }
    }

    fn exists_ttl(&self) -> u64 {
        self.ttl_secs.min(EXISTS_TTL_CAP_SECS)
    }

    /// 删除客户的列表缓存以及单品 / 存在性缓存
    async fn invalidate_client(&self, client_id: i64) {
        self.cache.delete(&client_list_key(client_id)).await;
        let product_removed = self
            .cache
            .delete_by_pattern(&format!("favorites:client_product:{}:*", client_id))
            .await;
        let exists_removed = self
            .cache
            .delete_by_pattern(&format!("favorites:exists:{}:*", client_id))
            .await;
        debug!(
            "🧹 收藏缓存失效 client_id={} (client_product={}, exists={})",
            client_id, product_removed, exists_removed
        );
    }
}

#[async_trait]
impl FavoriteRepository for CachedFavoriteRepository {
    async fn find_by_client_id(&self, client_id: i64) -> Result<Vec<FavoriteProduct>> {
        let key = client_list_key(client_id);
        if let Some(records) = self.cache.get_json::<Vec<FavoriteRecord>>(&key).await {
            debug!("🎯 收藏列表缓存命中 client_id={}", client_id);
            return Ok(records.into_iter().map(FavoriteProduct::from).collect());
        }

        let favorites = self.inner.find_by_client_id(client_id).await?;

        // 空列表不缓存，避免掩盖随后的新增
        if !favorites.is_empty() {
            let records: Vec<FavoriteRecord> =
                favorites.iter().filter_map(FavoriteProduct::to_record).collect();
            self.cache
                .set_json(&key, &records, Some(self.ttl_secs))
                .await;
        }

        Ok(favorites)
    }

    async fn find_by_client_and_product(
        &self,
        client_id: i64,
        product_id: i64,
    ) -> Result<Option<FavoriteProduct>> {
        let key = client_product_key(client_id, product_id);
        // 外层 Some 表示命中，内层 None 表示缓存的"不存在"
        if let Some(cached) = self.cache.get_json::<Option<FavoriteRecord>>(&key).await {
            return Ok(cached.map(FavoriteProduct::from));
        }

        let favorite = self
            .inner
            .find_by_client_and_product(client_id, product_id)
            .await?;
        let record = favorite.as_ref().and_then(FavoriteProduct::to_record);
        self.cache.set_json(&key, &record, Some(self.ttl_secs)).await;

        Ok(favorite)
    }

    async fn save(&self, favorite: &FavoriteProduct) -> Result<FavoriteProduct> {
        let saved = self.inner.save(favorite).await?;
        self.invalidate_client(saved.client_id()).await;
        Ok(saved)
    }

    async fn delete(&self, client_id: i64, product_id: i64) -> Result<bool> {
        let deleted = self.inner.delete(client_id, product_id).await?;
        if deleted {
            self.invalidate_client(client_id).await;
            self.cache
                .delete(&client_product_key(client_id, product_id))
                .await;
        }
        Ok(deleted)
    }

    async fn exists(&self, client_id: i64, product_id: i64) -> Result<bool> {
        let key = exists_key(client_id, product_id);
        if let Some(exists) = self.cache.get_json::<bool>(&key).await {
            return Ok(exists);
        }

        let exists = self.inner.exists(client_id, product_id).await?;
        self.cache
            .set_json(&key, &exists, Some(self.exists_ttl()))
            .await;
        Ok(exists)
    }

    async fn evict_client(&self, client_id: i64) {
        self.invalidate_client(client_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerError;
    use crate::infra::MemoryCacheStore;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 内存实现，统计对持久层的调用次数
    #[derive(Default)]
    struct CountingStore {
        rows: Mutex<Vec<FavoriteProduct>>,
        next_id: AtomicUsize,
        list_calls: AtomicUsize,
        find_calls: AtomicUsize,
        exists_calls: AtomicUsize,
    }

    #[async_trait]
    impl FavoriteRepository for CountingStore {
        async fn find_by_client_id(&self, client_id: i64) -> Result<Vec<FavoriteProduct>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|f| f.client_id() == client_id)
                .cloned()
                .collect())
        }

        async fn find_by_client_and_product(
            &self,
            client_id: i64,
            product_id: i64,
        ) -> Result<Option<FavoriteProduct>> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .find(|f| f.client_id() == client_id && f.product_id() == product_id)
                .cloned())
        }

        async fn save(&self, favorite: &FavoriteProduct) -> Result<FavoriteProduct> {
            let mut rows = self.rows.lock().unwrap();
            if rows.iter().any(|f| {
                f.client_id() == favorite.client_id() && f.product_id() == favorite.product_id()
            }) {
                return Err(ServerError::Conflict("Product already in favorites".into()));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            let saved = favorite.clone().persisted(id, Utc::now());
            rows.push(saved.clone());
            Ok(saved)
        }

        async fn delete(&self, client_id: i64, product_id: i64) -> Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|f| !(f.client_id() == client_id && f.product_id() == product_id));
            Ok(rows.len() < before)
        }

        async fn exists(&self, client_id: i64, product_id: i64) -> Result<bool> {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .any(|f| f.client_id() == client_id && f.product_id() == product_id))
        }
    }

    fn setup() -> (Arc<CountingStore>, Arc<dyn CacheStore>, CachedFavoriteRepository) {
        let store = Arc::new(CountingStore::default());
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new(1_000, 3600));
        let repo = CachedFavoriteRepository::new(store.clone(), cache.clone(), 1800);
        (store, cache, repo)
    }

    fn favorite(client_id: i64, product_id: i64) -> FavoriteProduct {
        FavoriteProduct::new(client_id, product_id, "Backpack", None, Some(109.95), Some(3.9))
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_is_served_from_cache_on_second_read() {
        let (store, _cache, repo) = setup();
        repo.save(&favorite(1, 10)).await.unwrap();

        let first = repo.find_by_client_id(1).await.unwrap();
        let second = repo.find_by_client_id(1).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_list_is_not_cached() {
        let (store, cache, repo) = setup();

        assert!(repo.find_by_client_id(1).await.unwrap().is_empty());
        assert!(!cache.has(&client_list_key(1)).await);

        repo.find_by_client_id(1).await.unwrap();
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_save_invalidates_cached_list() {
        let (_store, _cache, repo) = setup();
        repo.save(&favorite(1, 10)).await.unwrap();
        assert_eq!(repo.find_by_client_id(1).await.unwrap().len(), 1);

        repo.save(&favorite(1, 11)).await.unwrap();
        let list = repo.find_by_client_id(1).await.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().any(|f| f.product_id() == 11));
    }

    #[tokio::test]
    async fn test_absence_is_cached_and_cleared_by_save() {
        let (store, cache, repo) = setup();

        assert!(repo.find_by_client_and_product(1, 10).await.unwrap().is_none());
        assert!(repo.find_by_client_and_product(1, 10).await.unwrap().is_none());
        assert_eq!(store.find_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.get(&client_product_key(1, 10)).await.as_deref(),
            Some("null")
        );

        repo.save(&favorite(1, 10)).await.unwrap();
        let found = repo.find_by_client_and_product(1, 10).await.unwrap();
        assert_eq!(found.map(|f| f.product_id()), Some(10));
        assert_eq!(store.find_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exists_is_cached_and_invalidated() {
        let (store, _cache, repo) = setup();

        assert!(!repo.exists(1, 10).await.unwrap());
        assert!(!repo.exists(1, 10).await.unwrap());
        assert_eq!(store.exists_calls.load(Ordering::SeqCst), 1);

        repo.save(&favorite(1, 10)).await.unwrap();
        assert!(repo.exists(1, 10).await.unwrap());

        assert!(repo.delete(1, 10).await.unwrap());
        assert!(!repo.exists(1, 10).await.unwrap());
        assert_eq!(store.exists_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalidation_is_scoped_to_client() {
        let (_store, cache, repo) = setup();
        repo.save(&favorite(2, 10)).await.unwrap();
        repo.exists(2, 10).await.unwrap();
        repo.find_by_client_id(2).await.unwrap();

        repo.save(&favorite(1, 10)).await.unwrap();

        assert!(cache.has(&exists_key(2, 10)).await);
        assert!(cache.has(&client_list_key(2)).await);
    }

    #[tokio::test]
    async fn test_delete_of_missing_row_keeps_cache() {
        let (_store, cache, repo) = setup();
        repo.save(&favorite(1, 10)).await.unwrap();
        repo.find_by_client_id(1).await.unwrap();

        assert!(!repo.delete(1, 99).await.unwrap());
        assert!(cache.has(&client_list_key(1)).await);
    }

    #[tokio::test]
    async fn test_store_conflict_propagates_without_touching_cache() {
        let (_store, cache, repo) = setup();
        repo.save(&favorite(1, 10)).await.unwrap();
        repo.find_by_client_id(1).await.unwrap();

        let err = repo.save(&favorite(1, 10)).await.unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
        assert!(cache.has(&client_list_key(1)).await);
    }

    #[tokio::test]
    async fn test_evict_client_drops_all_client_keys() {
        let (_store, cache, repo) = setup();
        repo.save(&favorite(1, 10)).await.unwrap();
        repo.find_by_client_id(1).await.unwrap();
        repo.exists(1, 10).await.unwrap();
        repo.find_by_client_and_product(1, 10).await.unwrap();

        repo.evict_client(1).await;

        assert!(!cache.has(&client_list_key(1)).await);
        assert!(!cache.has(&exists_key(1, 10)).await);
        assert!(!cache.has(&client_product_key(1, 10)).await);
    }

    #[test]
    fn test_exists_ttl_is_capped() {
        let store: Arc<dyn FavoriteRepository> = Arc::new(CountingStore::default());
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new(10, 60));
        assert_eq!(
            CachedFavoriteRepository::new(store.clone(), cache.clone(), 1800).exists_ttl(),
            300
        );
        assert_eq!(
            CachedFavoriteRepository::new(store, cache, 120).exists_ttl(),
            120
        );
    }
}
