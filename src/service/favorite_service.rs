//! 收藏服务
//!
//! 收藏记录保存的是加入时的商品快照，之后外部商品变化不会回写。

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Result, ServerError};
use crate::infra::ProductCatalog;
use crate::model::FavoriteProduct;
use crate::repository::{ClientRepository, FavoriteRepository};

pub struct FavoriteService {
    favorites: Arc<dyn FavoriteRepository>,
    clients: Arc<dyn ClientRepository>,
    catalog: Arc<dyn ProductCatalog>,
}

impl FavoriteService {
    pub fn new(
        favorites: Arc<dyn FavoriteRepository>,
        clients: Arc<dyn ClientRepository>,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            favorites,
            clients,
            catalog,
        }
    }

    pub async fn get_client_favorites(&self, client_id: i64) -> Result<Vec<FavoriteProduct>> {
        self.ensure_client(client_id).await?;
        self.favorites.find_by_client_id(client_id).await
    }

    /// 添加收藏
    pub async fn add_favorite(&self, client_id: i64, product_id: i64) -> Result<FavoriteProduct> {
        self.ensure_client(client_id).await?;

        if self.favorites.exists(client_id, product_id).await? {
            return Err(ServerError::Conflict(
                "Product already in favorites".to_string(),
            ));
        }

        let product = self.catalog.find_by_id(product_id).await?.ok_or_else(|| {
            warn!("❌ 添加收藏失败：外部商品不存在 product_id={}", product_id);
            ServerError::NotFound("Product not found in external API".to_string())
        })?;

        let favorite = FavoriteProduct::from_product(client_id, &product)?;
        let saved = self.favorites.save(&favorite).await?;

        info!(
            "⭐ 收藏添加成功: client_id={}, product_id={}",
            client_id, product_id
        );
        Ok(saved)
    }

    /// 移除收藏
    pub async fn remove_favorite(&self, client_id: i64, product_id: i64) -> Result<()> {
        self.ensure_client(client_id).await?;

        if !self.favorites.exists(client_id, product_id).await? {
            return Err(ServerError::NotFound("Product not in favorites".to_string()));
        }

        // exists 与 delete 之间可能被并发删除
        if !self.favorites.delete(client_id, product_id).await? {
            return Err(ServerError::NotFound("Product not in favorites".to_string()));
        }

        info!(
            "🗑️ 收藏已移除: client_id={}, product_id={}",
            client_id, product_id
        );
        Ok(())
    }

    async fn ensure_client(&self, client_id: i64) -> Result<()> {
        match self.clients.find_by_id(client_id).await? {
            Some(_) => Ok(()),
            None => Err(ServerError::NotFound("Client not found".to_string())),
        }
    }
}
