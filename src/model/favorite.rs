use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::model::product::Product;

/// 商品标题最大长度（字符）
pub const TITLE_MAX_LEN: usize = 500;
/// 评分上限
pub const RATING_MAX: f64 = 5.0;

/// 收藏商品
///
/// 保存收藏时刻的商品快照（标题/图片/价格/评分），创建后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteProduct {
    id: Option<i64>,
    client_id: i64,
    product_id: i64,
    product_title: String,
    product_image: Option<String>,
    product_price: Option<f64>,
    product_rating: Option<f64>,
    created_at: DateTime<Utc>,
}

/// 收藏记录的存储形态（数据库行 / 缓存载荷）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FavoriteRecord {
    pub id: i64,
    pub client_id: i64,
    pub product_id: i64,
    pub product_title: String,
    pub product_image: Option<String>,
    pub product_price: Option<f64>,
    pub product_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl FavoriteProduct {
    pub fn new(
        client_id: i64,
        product_id: i64,
        product_title: &str,
        product_image: Option<String>,
        product_price: Option<f64>,
        product_rating: Option<f64>,
    ) -> Result<Self> {
        if client_id <= 0 {
            return Err(ServerError::Validation(
                "client_id must be positive".to_string(),
            ));
        }
        if product_id <= 0 {
            return Err(ServerError::Validation(
                "product_id must be positive".to_string(),
            ));
        }
        if product_title.trim().is_empty() {
            return Err(ServerError::Validation(
                "Product title cannot be empty".to_string(),
            ));
        }
        if product_title.chars().count() > TITLE_MAX_LEN {
            return Err(ServerError::Validation(format!(
                "Product title cannot exceed {} characters",
                TITLE_MAX_LEN
            )));
        }
        if let Some(rating) = product_rating {
            if !(0.0..=RATING_MAX).contains(&rating) {
                return Err(ServerError::Validation(
                    "Product rating must be between 0 and 5".to_string(),
                ));
            }
        }

        Ok(Self {
            id: None,
            client_id,
            product_id,
            product_title: product_title.to_string(),
            product_image,
            product_price,
            product_rating,
            created_at: Utc::now(),
        })
    }

    /// 根据外部商品信息生成收藏快照
    pub fn from_product(client_id: i64, product: &Product) -> Result<Self> {
        Self::new(
            client_id,
            product.id,
            &product.title,
            product.image.clone(),
            product.price,
            product.rating,
        )
    }

    /// 写入存储后回填 ID 与创建时间
    pub fn persisted(mut self, id: i64, created_at: DateTime<Utc>) -> Self {
        self.id = Some(id);
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn client_id(&self) -> i64 {
        self.client_id
    }

    pub fn product_id(&self) -> i64 {
        self.product_id
    }

    pub fn product_title(&self) -> &str {
        &self.product_title
    }

    pub fn product_image(&self) -> Option<&str> {
        self.product_image.as_deref()
    }

    pub fn product_price(&self) -> Option<f64> {
        self.product_price
    }

    pub fn product_rating(&self) -> Option<f64> {
        self.product_rating
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 转换为存储形态（未持久化时返回 None）
    pub fn to_record(&self) -> Option<FavoriteRecord> {
        self.id.map(|id| FavoriteRecord {
            id,
            client_id: self.client_id,
            product_id: self.product_id,
            product_title: self.product_title.clone(),
            product_image: self.product_image.clone(),
            product_price: self.product_price,
            product_rating: self.product_rating,
            created_at: self.created_at,
        })
    }
}

/// 从存储重建（受信数据，不再重复校验）
impl From<FavoriteRecord> for FavoriteProduct {
    fn from(r: FavoriteRecord) -> Self {
        Self {
            id: Some(r.id),
            client_id: r.client_id,
            product_id: r.product_id,
            product_title: r.product_title,
            product_image: r.product_image,
            product_price: r.product_price,
            product_rating: r.product_rating,
            created_at: r.created_at,
        }
    }
}
