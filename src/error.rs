use std::error::Error as StdError;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// 服务器错误类型
///
/// 每个变体对应一个 HTTP 状态码，由边界层（`IntoResponse`）统一映射，
/// 业务代码不需要也不应该根据错误消息判断状态码。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// 请求参数或实体不变量校验失败（400）
    Validation(String),
    /// 请求体本身不可用（空 / 非 JSON），消息原样返回（400）
    BadRequest(String),
    /// 缺少 / 无效 / 已撤销的凭证（401），消息不区分具体原因
    Unauthorized(String),
    /// 已认证但操作的不是自己的资源（403）
    Forbidden(String),
    /// 资源不存在（404）
    NotFound(String),
    /// 唯一性冲突（409）
    Conflict(String),
    /// 外部商品服务调用失败（500）
    Upstream(String),
    /// 数据库错误（500）
    Database(String),
    /// 内部错误（500）
    Internal(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Validation(msg) => write!(f, "Bad request: {}", msg),
            ServerError::BadRequest(msg) => write!(f, "{}", msg),
            ServerError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ServerError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ServerError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ServerError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ServerError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            ServerError::Database(msg) => write!(f, "Database error: {}", msg),
            ServerError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for ServerError {}

impl ServerError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Upstream(_) | ServerError::Database(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 返回给调用方的消息
    ///
    /// 500 类错误只返回通用消息，细节只写日志。
    pub fn public_message(&self) -> String {
        match self {
            ServerError::Validation(_) => self.to_string(),
            ServerError::BadRequest(msg)
            | ServerError::Unauthorized(msg)
            | ServerError::Forbidden(msg)
            | ServerError::NotFound(msg)
            | ServerError::Conflict(msg) => msg.clone(),
            ServerError::Upstream(_) => "Product service unavailable".to_string(),
            ServerError::Database(_) | ServerError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

/// 错误响应体：`{"error": "..."}`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!("❌ 请求处理失败: {}", self);
        }

        let body = ErrorResponse {
            error: self.public_message(),
        };
        (status_code, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ServerError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return ServerError::Conflict(match db_err.constraint() {
                    Some("clients_email_unique") => "Email already exists".to_string(),
                    Some("favorite_products_client_product_unique") => {
                        "Product already in favorites".to_string()
                    }
                    _ => "Resource already exists".to_string(),
                });
            }
        }
        ServerError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::Internal(format!("JSON 序列化失败: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for ServerError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ServerError::Internal(format!("操作超时: {}", err))
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServerError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServerError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServerError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServerError::Upstream("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::Database("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_message_has_prefix() {
        let err = ServerError::Validation("product_id must be positive".into());
        assert_eq!(err.public_message(), "Bad request: product_id must be positive");
    }

    #[test]
    fn test_bad_request_message_is_raw() {
        let err = ServerError::BadRequest("Request body is empty".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Request body is empty");
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let err = ServerError::Database("relation \"clients\" does not exist".into());
        assert_eq!(err.public_message(), "Internal server error");

        let err = ServerError::Internal("bcrypt failure".into());
        assert!(!err.public_message().contains("bcrypt"));
    }

    #[test]
    fn test_non_unique_sqlx_error_maps_to_database() {
        let err: ServerError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ServerError::Database(_)));
    }
}
