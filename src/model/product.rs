use serde::{Deserialize, Serialize};

/// 外部商品目录中的商品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    pub price: Option<f64>,
    /// 评分（取自外部接口的 rating.rate）
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
}
