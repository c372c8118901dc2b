//! HTTP 路由模块
//!
//! 路由结构（统一挂在 `/api/v1` 下）：
//! - `/health`                     - 健康检查
//! - `/auth/*`                     - 登录（公开）、刷新 / 登出 / 校验（需认证）
//! - `/clients`, `/clients/{id}`   - 客户查询与注册公开，更新 / 删除需认证且仅限本人
//! - `/products/*`                 - 外部商品目录（需认证）
//! - `/clients/{id}/favorites/*`   - 收藏（需认证且仅限本人）

pub mod auth;
pub mod clients;
pub mod favorites;
pub mod products;

use axum::{middleware, response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::http::middleware::auth_middleware;
use crate::http::HttpServerState;

/// 创建所有路由
pub fn create_routes(state: HttpServerState) -> Router<HttpServerState> {
    let public = Router::new()
        .route("/health", get(health))
        .merge(auth::public_routes())
        .merge(clients::public_routes());

    let protected = Router::new()
        .merge(auth::protected_routes())
        .merge(clients::protected_routes())
        .merge(products::protected_routes())
        .merge(favorites::protected_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
