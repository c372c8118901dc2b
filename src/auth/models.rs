use serde::{Deserialize, Serialize};

/// 会话 JWT Claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// JWT 标准字段 - 签发者
    pub iss: String,
    /// JWT 标准字段 - 受众
    pub aud: String,
    /// JWT 标准字段 - 签发时间 (Unix timestamp)
    pub iat: i64,
    /// JWT 标准字段 - 过期时间 (Unix timestamp)
    pub exp: i64,
    /// JWT 标准字段 - JWT ID（128 位随机数的十六进制，用于撤销）
    pub jti: String,
    /// JWT 标准字段 - 主题 (客户ID)
    pub sub: String,
    /// 自定义字段 - 用户摘要
    pub user: UserIdentity,
}

/// 请求上下文中的用户身份
///
/// 由认证中间件放入 request extensions，下游根据 `id` 做归属校验。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// 签发结果
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub jti: String,
    /// 有效期（秒）
    pub expires_in: i64,
}
