//! 商品服务（外部目录的薄封装）

use std::sync::Arc;

use crate::error::Result;
use crate::infra::ProductCatalog;
use crate::model::Product;

pub struct ProductService {
    catalog: Arc<dyn ProductCatalog>,
}

impl ProductService {
    pub fn new(catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn get_all_products(&self) -> Result<Vec<Product>> {
        self.catalog.find_all().await
    }

    /// 非正数 ID 直接返回 None，不请求外部接口
    pub async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        if id <= 0 {
            return Ok(None);
        }
        self.catalog.find_by_id(id).await
    }
}
