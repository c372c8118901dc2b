//! 收藏路由（需认证，只能访问本人的收藏）
//!
//! - GET    /clients/{id}/favorites
//! - POST   /clients/{id}/favorites
//! - DELETE /clients/{id}/favorites/{product_id}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Extension, Router,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::{Result, ServerError};
use crate::http::extract::{parse_id, BodyFields, JsonBody, RequestBody};
use crate::http::middleware::AuthenticatedUser;
use crate::http::HttpServerState;

pub fn protected_routes() -> Router<HttpServerState> {
    Router::new()
        .route(
            "/clients/{id}/favorites",
            get(list_favorites).post(add_favorite),
        )
        .route(
            "/clients/{id}/favorites/{product_id}",
            delete(remove_favorite),
        )
}

#[derive(Debug)]
pub struct AddFavoriteRequest {
    pub product_id: i64,
}

impl RequestBody for AddFavoriteRequest {
    fn from_fields(fields: &mut BodyFields<'_>) -> Option<Self> {
        let product_id = fields.required_int("product_id")?;
        if !fields.check(product_id > 0, "product_id must be positive") {
            return None;
        }
        Some(Self { product_id })
    }
}

/// 解析路径中的 client_id 并确认是调用方本人
fn owned_client_id(user: &AuthenticatedUser, raw: &str) -> Result<i64> {
    let client_id = parse_id(raw, "client_id")?;
    if !user.is(client_id) {
        warn!(
            "🚫 客户 {} 尝试访问客户 {} 的收藏",
            user.identity.id, client_id
        );
        return Err(ServerError::Forbidden(
            "You are not authorized to access this resource".to_string(),
        ));
    }
    Ok(client_id)
}

async fn list_favorites(
    State(state): State<HttpServerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(client_id): Path<String>,
) -> Result<Json<Value>> {
    let client_id = owned_client_id(&user, &client_id)?;
    let favorites = state
        .favorite_service
        .get_client_favorites(client_id)
        .await?;
    let total = favorites.len();
    Ok(Json(json!({ "data": favorites, "total": total })))
}

async fn add_favorite(
    State(state): State<HttpServerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(client_id): Path<String>,
    JsonBody(request): JsonBody<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let client_id = owned_client_id(&user, &client_id)?;
    let favorite = state
        .favorite_service
        .add_favorite(client_id, request.product_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": favorite, "total": 1 })),
    ))
}

async fn remove_favorite(
    State(state): State<HttpServerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((client_id, product_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let client_id = owned_client_id(&user, &client_id)?;
    let product_id = parse_id(&product_id, "product_id")?;
    state
        .favorite_service
        .remove_favorite(client_id, product_id)
        .await?;
    Ok(Json(json!({
        "message": "Product successfully removed from favorites"
    })))
}
