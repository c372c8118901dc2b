//! 认证路由
//!
//! - POST /auth/login    （公开）
//! - POST /auth/refresh  （需认证）
//! - POST /auth/logout   （需认证）
//! - GET  /auth/verify   （需认证）

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{Result, ServerError};
use crate::http::extract::{BodyFields, JsonBody, RequestBody};
use crate::http::middleware::AuthenticatedUser;
use crate::http::HttpServerState;
use crate::model::client::{validate_email, PASSWORD_MIN_LEN};

pub fn public_routes() -> Router<HttpServerState> {
    Router::new().route("/auth/login", post(login))
}

pub fn protected_routes() -> Router<HttpServerState> {
    Router::new()
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/verify", get(verify))
}

#[derive(Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl RequestBody for LoginRequest {
    fn from_fields(fields: &mut BodyFields<'_>) -> Option<Self> {
        let email = fields.required_str("email");
        let password = fields.required_str("password");

        if let Some(email) = &email {
            fields.check(validate_email(email).is_ok(), "email must be a valid email");
        }
        if let Some(password) = &password {
            fields.check(
                password.chars().count() >= PASSWORD_MIN_LEN,
                format!("password must be at least {} characters", PASSWORD_MIN_LEN),
            );
        }
        if fields.has_errors() {
            return None;
        }
        Some(Self {
            email: email?,
            password: password?,
        })
    }
}

/// 登录
async fn login(
    State(state): State<HttpServerState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<Value>> {
    let client = state
        .auth_service
        .authenticate_user(&request.email, &request.password)
        .await?
        .ok_or_else(|| {
            warn!("❌ 登录失败: 邮箱或密码错误");
            ServerError::Unauthorized("Invalid email or password".to_string())
        })?;

    let issued = state.auth_service.generate_jwt(&client).await?;
    info!("🔑 登录成功: client_id={:?}", client.id());

    Ok(Json(json!({
        "data": {
            "access_token": issued.access_token,
            "token_type": "Bearer",
            "expires_in": issued.expires_in,
            "user": client.identity(),
        }
    })))
}

/// 刷新 token（旧 token 随即失效）
async fn refresh(
    State(state): State<HttpServerState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Value>> {
    let issued = state
        .auth_service
        .refresh_token(&user.token)
        .await?
        .ok_or_else(|| ServerError::Unauthorized("Invalid or expired token".to_string()))?;

    Ok(Json(json!({
        "data": {
            "access_token": issued.access_token,
            "token_type": "Bearer",
            "expires_in": issued.expires_in,
        }
    })))
}

/// 登出
async fn logout(
    State(state): State<HttpServerState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Value>> {
    if !state.auth_service.logout(&user.token).await? {
        // 中间件验证通过后会话又被并发撤销
        return Err(ServerError::Unauthorized(
            "Failed to logout. Token may be invalid or already revoked.".to_string(),
        ));
    }

    Ok(Json(json!({ "message": "Logged out successfully" })))
}

/// 验证 token 并返回其中的用户身份
async fn verify(Extension(user): Extension<AuthenticatedUser>) -> Json<Value> {
    Json(json!({
        "data": {
            "user": user.identity,
            "authenticated": true,
        }
    }))
}
