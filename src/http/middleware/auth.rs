//! 认证中间件
//!
//! 从 `Authorization: Bearer <token>` 提取 token，经 `AuthService::validate_jwt` 验证后
//! 把 [`AuthenticatedUser`] 放入 request extensions。

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::UserIdentity;
use crate::error::{Result, ServerError};
use crate::http::HttpServerState;

/// 已通过认证的调用方
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub identity: UserIdentity,
    /// 原始 token（登出、刷新时使用）
    pub token: String,
}

impl AuthenticatedUser {
    /// 是否为指定客户本人
    pub fn is(&self, client_id: i64) -> bool {
        self.identity.id == client_id
    }
}

/// 提取 Bearer token，缺失或格式不对返回 None
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

pub async fn auth_middleware(
    State(state): State<HttpServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        debug!("🔐 缺少 Bearer token: {}", request.uri().path());
        ServerError::Unauthorized("Bearer token required".to_string())
    })?;

    let identity = state
        .auth_service
        .validate_jwt(&token)
        .await
        .ok_or_else(|| ServerError::Unauthorized("Invalid or expired token".to_string()))?;

    debug!("🔐 认证通过: client_id={}", identity.id);
    request
        .extensions_mut()
        .insert(AuthenticatedUser { identity, token });

    Ok(next.run(request).await)
}
