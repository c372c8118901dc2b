//! HTTP 服务器 - 使用 Axum 提供 REST API

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::context::AppContext;
use crate::http::routes;
use crate::service::{AuthService, ClientService, FavoriteService, ProductService};

/// API 前缀
pub const API_PREFIX: &str = "/api/v1";

/// HTTP 服务器共享状态
#[derive(Clone)]
pub struct HttpServerState {
    pub auth_service: Arc<AuthService>,
    pub client_service: Arc<ClientService>,
    pub favorite_service: Arc<FavoriteService>,
    pub product_service: Arc<ProductService>,
}

impl From<&AppContext> for HttpServerState {
    fn from(ctx: &AppContext) -> Self {
        Self {
            auth_service: ctx.auth_service.clone(),
            client_service: ctx.client_service.clone(),
            favorite_service: ctx.favorite_service.clone(),
            product_service: ctx.product_service.clone(),
        }
    }
}

/// 构建完整的路由（含 CORS、压缩、请求追踪）
pub fn build_router(state: HttpServerState) -> Router {
    Router::new()
        .nest(API_PREFIX, routes::create_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// REST API 服务器
pub struct ApiHttpServer {
    state: HttpServerState,
    bind_address: String,
}

impl ApiHttpServer {
    pub fn new(state: HttpServerState, bind_address: impl Into<String>) -> Self {
        Self {
            state,
            bind_address: bind_address.into(),
        }
    }

    /// 启动 HTTP 服务器，直到 `shutdown` 完成
    pub async fn serve<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = build_router(self.state);

        let listener = TcpListener::bind(&self.bind_address).await?;
        info!("🌐 HTTP API 服务器启动在 {}{}", self.bind_address, API_PREFIX);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
