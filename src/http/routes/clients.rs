//! 客户路由
//!
//! 公开：GET /clients, GET /clients/{id}, POST /clients
//! 需认证且只能操作本人：PUT /clients/{id}, DELETE /clients/{id}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Extension, Router,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{Result, ServerError};
use crate::http::extract::{parse_id, BodyFields, JsonBody, RequestBody};
use crate::http::middleware::AuthenticatedUser;
use crate::http::HttpServerState;
use crate::model::client::{validate_email, NAME_MAX_LEN, PASSWORD_MIN_LEN};
use crate::service::UpdateClient;

pub fn public_routes() -> Router<HttpServerState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/{id}", get(get_client))
}

pub fn protected_routes() -> Router<HttpServerState> {
    Router::new().route("/clients/{id}", put(update_client).delete(delete_client))
}

fn check_name(fields: &mut BodyFields<'_>, name: &str) {
    let len = name.chars().count();
    fields.check(
        !name.trim().is_empty() && len <= NAME_MAX_LEN,
        format!("name must be between 1 and {} characters", NAME_MAX_LEN),
    );
}

fn check_email(fields: &mut BodyFields<'_>, email: &str) {
    fields.check(validate_email(email).is_ok(), "email must be a valid email");
}

fn check_password(fields: &mut BodyFields<'_>, password: &str) {
    fields.check(
        password.chars().count() >= PASSWORD_MIN_LEN,
        format!("password must be at least {} characters", PASSWORD_MIN_LEN),
    );
}

#[derive(Debug)]
pub struct CreateClientRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RequestBody for CreateClientRequest {
    fn from_fields(fields: &mut BodyFields<'_>) -> Option<Self> {
        let name = fields.required_str("name");
        let email = fields.required_str("email");
        let password = fields.required_str("password");

        if let Some(name) = &name {
            check_name(fields, name);
        }
        if let Some(email) = &email {
            check_email(fields, email);
        }
        if let Some(password) = &password {
            check_password(fields, password);
        }
        if fields.has_errors() {
            return None;
        }
        Some(Self {
            name: name?,
            email: email?,
            password: password?,
        })
    }
}

#[derive(Debug)]
pub struct UpdateClientRequest(pub UpdateClient);

impl RequestBody for UpdateClientRequest {
    const ALLOW_EMPTY: bool = true;

    fn from_fields(fields: &mut BodyFields<'_>) -> Option<Self> {
        let update = UpdateClient {
            name: fields.optional_str("name"),
            email: fields.optional_str("email"),
            password: fields.optional_str("password"),
        };

        if let Some(name) = &update.name {
            check_name(fields, name);
        }
        if let Some(email) = &update.email {
            check_email(fields, email);
        }
        if let Some(password) = &update.password {
            check_password(fields, password);
        }
        if fields.has_errors() {
            return None;
        }
        Some(Self(update))
    }
}

async fn list_clients(State(state): State<HttpServerState>) -> Result<Json<Value>> {
    let clients = state.client_service.get_all_clients().await?;
    let total = clients.len();
    Ok(Json(json!({ "data": clients, "total": total })))
}

async fn get_client(
    State(state): State<HttpServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "id")?;
    let client = state.client_service.get_client(id).await?;
    Ok(Json(json!({ "data": client })))
}

async fn create_client(
    State(state): State<HttpServerState>,
    JsonBody(request): JsonBody<CreateClientRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let client = state
        .client_service
        .create_client(&request.name, &request.email, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": client }))))
}

async fn update_client(
    State(state): State<HttpServerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    JsonBody(UpdateClientRequest(update)): JsonBody<UpdateClientRequest>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "id")?;
    if !user.is(id) {
        warn!("🚫 客户 {} 尝试更新客户 {}", user.identity.id, id);
        return Err(ServerError::Forbidden(
            "You are not authorized to update this client".to_string(),
        ));
    }
    if update.is_empty() {
        return Err(ServerError::BadRequest(
            "No data provided for update".to_string(),
        ));
    }

    let client = state.client_service.update_client(id, update).await?;
    Ok(Json(json!({ "data": client })))
}

async fn delete_client(
    State(state): State<HttpServerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id, "id")?;
    if !user.is(id) {
        warn!("🚫 客户 {} 尝试删除客户 {}", user.identity.id, id);
        return Err(ServerError::Forbidden(
            "You are not authorized to delete this client".to_string(),
        ));
    }

    let client = state.client_service.delete_client(id).await?;
    info!("🗑️ 客户 {} 已删除自己的账号", id);
    Ok(Json(json!({ "data": client, "total": 1 })))
}
