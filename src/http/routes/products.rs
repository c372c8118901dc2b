//! 商品路由（需认证）
//!
//! - GET /products
//! - GET /products/{id}

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Result, ServerError};
use crate::http::HttpServerState;

pub fn protected_routes() -> Router<HttpServerState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
}

async fn list_products(State(state): State<HttpServerState>) -> Result<Json<Value>> {
    let products = state.product_service.get_all_products().await?;
    debug!("🛒 商品列表: {} 个", products.len());
    let total = products.len();
    Ok(Json(json!({ "data": products, "total": total })))
}

async fn get_product(
    State(state): State<HttpServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    // 非数字 ID 与不存在的商品一样按 404 处理
    let product = match id.parse::<i64>() {
        Ok(id) => state.product_service.get_product(id).await?,
        Err(_) => None,
    }
    .ok_or_else(|| ServerError::NotFound("Product not found".to_string()))?;
    Ok(Json(json!({ "data": product })))
}
