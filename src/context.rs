//! 进程级上下文：持有连接池、缓存、外部客户端和全部服务
//!
//! 初始化顺序：数据库 → 缓存（Redis 不可用时降级为进程内缓存）→ 商品目录 → 仓库 → 服务。

use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::JwtService;
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::infra::{
    CacheStore, Database, HttpProductCatalog, MemoryCacheStore, ProductCatalog, RedisCacheStore,
    RedisClient,
};
use crate::repository::{
    CachedFavoriteRepository, ClientRepository, FavoriteRepository, PgClientRepository,
    PgFavoriteRepository, PgSessionRepository, SessionRepository,
};
use crate::service::{AuthService, ClientService, FavoriteService, ProductService};

/// 应用上下文
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub database: Option<Arc<Database>>,
    pub cache: Arc<dyn CacheStore>,
    pub auth_service: Arc<AuthService>,
    pub client_service: Arc<ClientService>,
    pub favorite_service: Arc<FavoriteService>,
    pub product_service: Arc<ProductService>,
}

/// 组装服务所需的存储端口
///
/// 生产环境由 [`AppContext::init`] 构造 PostgreSQL 实现；测试可以直接传入内存实现。
pub struct Stores {
    pub clients: Arc<dyn ClientRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub cache: Arc<dyn CacheStore>,
}

impl AppContext {
    /// 连接外部资源并组装全部服务
    pub async fn init(config: ServerConfig) -> Result<Self> {
        info!("🔌 初始化数据库连接...");
        let database = Database::connect(&config.database)
            .await
            .map_err(|e| ServerError::Internal(format!("数据库连接失败: {}", e)))?;
        let database = Arc::new(database);
        info!("✅ 数据库连接池初始化完成");

        let cache = Self::init_cache(&config).await;

        let catalog: Arc<dyn ProductCatalog> =
            Arc::new(HttpProductCatalog::new(&config.product_api)?);
        info!("🛒 商品目录: {}", config.product_api.base_url);

        let pool = database.pool().clone();
        let stores = Stores {
            clients: Arc::new(PgClientRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool.clone())),
            favorites: Arc::new(PgFavoriteRepository::new(pool)),
            catalog,
            cache,
        };

        let mut ctx = Self::from_stores(config, stores);
        ctx.database = Some(database);
        Ok(ctx)
    }

    /// 基于给定的存储端口组装服务
    ///
    /// 收藏仓库总是包一层缓存。
    pub fn from_stores(config: ServerConfig, stores: Stores) -> Self {
        let Stores {
            clients,
            sessions,
            favorites,
            catalog,
            cache,
        } = stores;

        let jwt_service = Arc::new(JwtService::new(
            &config.auth.jwt_secret,
            config.auth.api_base_url.clone(),
            config.auth.token_ttl_secs,
        ));

        let favorites: Arc<dyn FavoriteRepository> = Arc::new(CachedFavoriteRepository::new(
            favorites,
            cache.clone(),
            config.cache.favorites_ttl_secs,
        ));

        let auth_service = Arc::new(AuthService::new(
            jwt_service,
            clients.clone(),
            sessions.clone(),
        ));
        let client_service = Arc::new(ClientService::new(
            clients.clone(),
            sessions,
            favorites.clone(),
        ));
        let favorite_service = Arc::new(FavoriteService::new(favorites, clients, catalog.clone()));
        let product_service = Arc::new(ProductService::new(catalog));

        Self {
            config: Arc::new(config),
            database: None,
            cache,
            auth_service,
            client_service,
            favorite_service,
            product_service,
        }
    }

    /// 释放外部资源
    pub async fn shutdown(&self) {
        if let Some(database) = &self.database {
            database.close().await;
            info!("🔌 数据库连接池已关闭");
        }
    }

    async fn init_cache(config: &ServerConfig) -> Arc<dyn CacheStore> {
        let memory = || -> Arc<dyn CacheStore> {
            Arc::new(MemoryCacheStore::new(
                config.cache.memory_max_capacity,
                config.cache.default_ttl_secs,
            ))
        };

        let Some(redis_config) = config.cache.redis.as_ref() else {
            info!("💾 未配置 Redis，使用进程内缓存");
            return memory();
        };

        match RedisClient::connect(redis_config).await {
            Ok(client) => {
                info!("✅ Redis 缓存已连接");
                Arc::new(RedisCacheStore::new(client, config.cache.default_ttl_secs))
            }
            Err(e) => {
                warn!("⚠️ Redis 不可用，降级为进程内缓存: {}", e);
                memory()
            }
        }
    }
}
