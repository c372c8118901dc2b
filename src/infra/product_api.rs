//! 外部商品目录客户端

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ProductApiConfig;
use crate::error::{Result, ServerError};
use crate::model::Product;

/// 商品目录（只读）
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// 按 ID 查询，不存在返回 None
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>>;

    /// 查询全部商品
    async fn find_all(&self) -> Result<Vec<Product>>;
}

/// 外部接口返回的商品结构
#[derive(Debug, Deserialize)]
struct ApiProduct {
    id: i64,
    title: String,
    image: Option<String>,
    price: Option<f64>,
    rating: Option<ApiRating>,
    description: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRating {
    rate: Option<f64>,
}

impl From<ApiProduct> for Product {
    fn from(p: ApiProduct) -> Self {
        Product {
            id: p.id,
            title: p.title,
            image: p.image,
            price: p.price,
            rating: p.rating.and_then(|r| r.rate),
            description: p.description,
            category: p.category,
        }
    }
}

/// 基于 HTTP 的商品目录（`GET {base}/products`, `GET {base}/products/{id}`）
pub struct HttpProductCatalog {
    client: Client,
    base_url: String,
}

impl HttpProductCatalog {
    /// 创建客户端（建连超时与整体超时取自配置）
    pub fn new(config: &ProductApiConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServerError::Internal(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str) -> Result<Option<reqwest::Response>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("🌐 请求商品服务: GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!("⚠️ 商品服务请求失败: GET {}: {}", url, e);
            ServerError::Upstream(format!("GET {} failed: {}", url, e))
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response)),
            status => {
                warn!("⚠️ 商品服务返回异常状态: GET {} -> {}", url, status);
                Err(ServerError::Upstream(format!(
                    "GET {} returned {}",
                    url, status
                )))
            }
        }
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        let Some(response) = self.get(&format!("/products/{}", id)).await? else {
            return Ok(None);
        };

        // fakestoreapi 对不存在的 ID 返回 200 + 空 body
        let body = response
            .text()
            .await
            .map_err(|e| ServerError::Upstream(format!("读取商品响应失败: {}", e)))?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }

        let product: ApiProduct = serde_json::from_str(&body)
            .map_err(|e| ServerError::Upstream(format!("商品响应无法解析: {}", e)))?;
        Ok(Some(product.into()))
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        let Some(response) = self.get("/products").await? else {
            return Ok(Vec::new());
        };

        let products: Vec<ApiProduct> = response
            .json()
            .await
            .map_err(|e| ServerError::Upstream(format!("商品列表无法解析: {}", e)))?;
        Ok(products.into_iter().map(Product::from).collect())
    }
}
