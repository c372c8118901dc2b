//! 集成测试共享的内存实现（不依赖 PostgreSQL / Redis / 外部商品服务）

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use favorites_server::auth::{JwtService, UserIdentity};
use favorites_server::config::ServerConfig;
use favorites_server::context::{AppContext, Stores};
use favorites_server::error::{Result, ServerError};
use favorites_server::infra::{MemoryCacheStore, ProductCatalog};
use favorites_server::model::{Client, FavoriteProduct, Product};
use favorites_server::repository::{ClientRepository, FavoriteRepository, SessionRepository};

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hs256";
pub const TEST_ISSUER: &str = "http://localhost:8080";

// ============================================================
// 客户
// ============================================================

pub struct InMemoryClientRepository {
    clients: RwLock<HashMap<i64, Client>>,
    next_id: AtomicUsize,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn find_all(&self) -> Result<Vec<Client>> {
        let mut all: Vec<Client> = self.clients.read().await.values().cloned().collect();
        all.sort_by_key(|c| c.id());
        Ok(all)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Client>> {
        Ok(self.clients.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>> {
        Ok(self
            .clients
            .read()
            .await
            .values()
            .find(|c| c.email() == email)
            .cloned())
    }

    async fn save(&self, client: &Client) -> Result<Client> {
        let mut clients = self.clients.write().await;
        if clients.values().any(|c| c.email() == client.email()) {
            return Err(ServerError::Conflict("Email already exists".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        let saved = client.clone().persisted(id);
        clients.insert(id, saved.clone());
        Ok(saved)
    }

    async fn update(&self, client: &Client) -> Result<Client> {
        let id = client
            .id()
            .ok_or_else(|| ServerError::Internal("client has no id".to_string()))?;
        let mut clients = self.clients.write().await;
        if !clients.contains_key(&id) {
            return Err(ServerError::NotFound("Client not found".to_string()));
        }
        clients.insert(id, client.clone());
        Ok(client.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.clients.write().await.remove(&id).is_some())
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> Result<bool> {
        Ok(self
            .clients
            .read()
            .await
            .values()
            .any(|c| c.email() == email && c.id() != exclude_id))
    }
}

// ============================================================
// 会话
// ============================================================

#[derive(Debug, Clone)]
pub struct SessionRow {
    pub client_id: i64,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, SessionRow>>,
    /// 置为 true 后所有查询返回数据库错误
    pub failing: AtomicBool,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, jti: &str) -> Option<SessionRow> {
        self.sessions.read().await.get(jti).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServerError::Database("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn store_session(
        &self,
        client_id: i64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.check()?;
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(jti) {
            Some(row) => row.expires_at = expires_at,
            None => {
                sessions.insert(
                    jti.to_string(),
                    SessionRow {
                        client_id,
                        expires_at,
                        revoked: false,
                    },
                );
            }
        }
        Ok(())
    }

    async fn is_session_revoked(&self, jti: &str) -> Result<bool> {
        self.check()?;
        Ok(match self.sessions.read().await.get(jti) {
            Some(row) => row.revoked || row.expires_at <= Utc::now(),
            None => true,
        })
    }

    async fn revoke_token(&self, jti: &str) -> Result<bool> {
        self.check()?;
        Ok(match self.sessions.write().await.get_mut(jti) {
            Some(row) if !row.revoked => {
                row.revoked = true;
                true
            }
            _ => false,
        })
    }

    async fn revoke_all_for_client(&self, client_id: i64) -> Result<u64> {
        self.check()?;
        let mut count = 0;
        for row in self.sessions.write().await.values_mut() {
            if row.client_id == client_id && !row.revoked {
                row.revoked = true;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn purge_expired(&self) -> Result<u64> {
        self.check()?;
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, row| row.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}

// ============================================================
// 收藏
// ============================================================

#[derive(Default)]
pub struct InMemoryFavoriteRepository {
    favorites: RwLock<Vec<FavoriteProduct>>,
    next_id: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl InMemoryFavoriteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FavoriteRepository for InMemoryFavoriteRepository {
    async fn find_by_client_id(&self, client_id: i64) -> Result<Vec<FavoriteProduct>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut list: Vec<FavoriteProduct> = self
            .favorites
            .read()
            .await
            .iter()
            .filter(|f| f.client_id() == client_id)
            .cloned()
            .collect();
        list.reverse();
        Ok(list)
    }

    async fn find_by_client_and_product(
        &self,
        client_id: i64,
        product_id: i64,
    ) -> Result<Option<FavoriteProduct>> {
        Ok(self
            .favorites
            .read()
            .await
            .iter()
            .find(|f| f.client_id() == client_id && f.product_id() == product_id)
            .cloned())
    }

    async fn save(&self, favorite: &FavoriteProduct) -> Result<FavoriteProduct> {
        let mut favorites = self.favorites.write().await;
        if favorites
            .iter()
            .any(|f| f.client_id() == favorite.client_id() && f.product_id() == favorite.product_id())
        {
            return Err(ServerError::Conflict(
                "Product already in favorites".to_string(),
            ));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let saved = favorite.clone().persisted(id, favorite.created_at());
        favorites.push(saved.clone());
        Ok(saved)
    }

    async fn delete(&self, client_id: i64, product_id: i64) -> Result<bool> {
        let mut favorites = self.favorites.write().await;
        let before = favorites.len();
        favorites.retain(|f| !(f.client_id() == client_id && f.product_id() == product_id));
        Ok(favorites.len() < before)
    }

    async fn exists(&self, client_id: i64, product_id: i64) -> Result<bool> {
        Ok(self
            .favorites
            .read()
            .await
            .iter()
            .any(|f| f.client_id() == client_id && f.product_id() == product_id))
    }
}

// ============================================================
// 商品目录
// ============================================================

#[derive(Default)]
pub struct StaticProductCatalog {
    products: HashMap<i64, Product>,
    /// 置为 true 后模拟外部服务不可用
    pub unavailable: AtomicBool,
}

impl StaticProductCatalog {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
            unavailable: AtomicBool::new(false),
        }
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServerError::Upstream("connection timed out".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for StaticProductCatalog {
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        self.check()?;
        Ok(self.products.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        self.check()?;
        let mut all: Vec<Product> = self.products.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }
}

pub fn sample_product(id: i64) -> Product {
    Product {
        id,
        title: format!("Product {}", id),
        image: Some(format!("https://img.example.com/{}.jpg", id)),
        price: Some(10.5 * id as f64),
        rating: Some(4.1),
        description: Some("sample".to_string()),
        category: Some("electronics".to_string()),
    }
}

// ============================================================
// 组装
// ============================================================

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config.auth.api_base_url = TEST_ISSUER.to_string();
    config
}

pub fn test_jwt() -> JwtService {
    JwtService::new(TEST_SECRET, TEST_ISSUER, 86400)
}

/// 测试夹具：服务上下文加上可直接观察的内存存储
pub struct TestApp {
    pub ctx: AppContext,
    pub clients: Arc<InMemoryClientRepository>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub favorites: Arc<InMemoryFavoriteRepository>,
    pub catalog: Arc<StaticProductCatalog>,
}

impl TestApp {
    pub fn new() -> Self {
        let clients = Arc::new(InMemoryClientRepository::new());
        let sessions = Arc::new(InMemorySessionRepository::new());
        let favorites = Arc::new(InMemoryFavoriteRepository::new());
        let catalog = Arc::new(StaticProductCatalog::with_products(
            (1..=5).map(sample_product).collect(),
        ));

        let ctx = AppContext::from_stores(
            test_config(),
            Stores {
                clients: clients.clone(),
                sessions: sessions.clone(),
                favorites: favorites.clone(),
                catalog: catalog.clone(),
                cache: Arc::new(MemoryCacheStore::new(1_000, 60)),
            },
        );

        Self {
            ctx,
            clients,
            sessions,
            favorites,
            catalog,
        }
    }

    /// 直接在仓库中创建客户
    pub async fn seed_client(&self, name: &str, email: &str, password: &str) -> Client {
        let client = Client::new(name, email, password).expect("valid client");
        self.clients.save(&client).await.expect("saved client")
    }

    pub fn identity(client: &Client) -> UserIdentity {
        client.identity().expect("persisted client")
    }
}
