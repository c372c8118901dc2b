//! 收藏商品仓库 - PostgreSQL 实现

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{Result, ServerError};
use crate::model::{FavoriteProduct, FavoriteRecord};

/// 收藏商品存储
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// 客户的全部收藏（最新在前）
    async fn find_by_client_id(&self, client_id: i64) -> Result<Vec<FavoriteProduct>>;

    async fn find_by_client_and_product(
        &self,
        client_id: i64,
        product_id: i64,
    ) -> Result<Option<FavoriteProduct>>;

    /// 插入收藏，返回带 ID 的实体；(client_id, product_id) 冲突返回 Conflict
    async fn save(&self, favorite: &FavoriteProduct) -> Result<FavoriteProduct>;

    async fn delete(&self, client_id: i64, product_id: i64) -> Result<bool>;

    async fn exists(&self, client_id: i64, product_id: i64) -> Result<bool>;

    /// 客户被删除后丢弃与其相关的缓存；持久化实现由外键级联清理，无需处理
    async fn evict_client(&self, _client_id: i64) {}
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, client_id, product_id, product_title, product_image,
           product_price, product_rating, created_at
    FROM favorite_products
"#;

/// 收藏商品仓库 (PostgreSQL 实现)
#[derive(Clone)]
pub struct PgFavoriteRepository {
    pool: PgPool,
}

impl PgFavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for PgFavoriteRepository {
    async fn find_by_client_id(&self, client_id: i64) -> Result<Vec<FavoriteProduct>> {
        let rows = sqlx::query_as::<_, FavoriteRecord>(&format!(
            "{} WHERE client_id = $1 ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(FavoriteProduct::from).collect())
    }

    async fn find_by_client_and_product(
        &self,
        client_id: i64,
        product_id: i64,
    ) -> Result<Option<FavoriteProduct>> {
        let row = sqlx::query_as::<_, FavoriteRecord>(&format!(
            "{} WHERE client_id = $1 AND product_id = $2",
            SELECT_COLUMNS
        ))
        .bind(client_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(FavoriteProduct::from))
    }

    async fn save(&self, favorite: &FavoriteProduct) -> Result<FavoriteProduct> {
        if favorite.id().is_some() {
            return Err(ServerError::Internal(
                "收藏记录创建后不可修改".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, FavoriteRecord>(
            r#"
            INSERT INTO favorite_products
                (client_id, product_id, product_title, product_image,
                 product_price, product_rating, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, client_id, product_id, product_title, product_image,
                      product_price, product_rating, created_at
            "#,
        )
        .bind(favorite.client_id())
        .bind(favorite.product_id())
        .bind(favorite.product_title())
        .bind(favorite.product_image())
        .bind(favorite.product_price())
        .bind(favorite.product_rating())
        .bind(favorite.created_at())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delete(&self, client_id: i64, product_id: i64) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM favorite_products WHERE client_id = $1 AND product_id = $2")
                .bind(client_id)
                .bind(product_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, client_id: i64, product_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM favorite_products WHERE client_id = $1 AND product_id = $2)",
        )
        .bind(client_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
