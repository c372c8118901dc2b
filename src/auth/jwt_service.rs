use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::RngCore;
use thiserror::Error;

use crate::auth::models::{SessionClaims, UserIdentity};
use crate::error::{Result, ServerError};

/// token 解码失败原因
///
/// 只在认证服务内部使用，对外统一表现为"无效 token"。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token issuer or audience mismatch")]
    InvalidClaims,
    #[error("token is malformed")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => TokenError::InvalidClaims,
            _ => TokenError::Malformed,
        }
    }
}

/// 生成 128 位随机 JWT ID（32 位十六进制）
pub fn generate_jti() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// JWT 签发和验证服务 (HS256 对称加密)
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// 签发者和受众都使用 API 基础地址
    issuer: String,
    token_ttl: i64,
}

impl JwtService {
    pub fn new(secret: &str, issuer: impl Into<String>, token_ttl: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            token_ttl,
        }
    }

    /// 为用户构造一份新的 claims（新的 jti，exp = now + ttl）
    pub fn new_claims(&self, user: UserIdentity) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            iss: self.issuer.clone(),
            aud: self.issuer.clone(),
            iat: now,
            exp: now + self.token_ttl,
            jti: generate_jti(),
            sub: user.id.to_string(),
            user,
        }
    }

    /// 签名
    pub fn encode(&self, claims: &SessionClaims) -> Result<String> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| ServerError::Internal(format!("JWT 签发失败: {}", e)))
    }

    /// 验签并解析
    pub fn decode(&self, token: &str) -> std::result::Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = 0;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    /// token 有效期（秒）
    pub fn token_ttl(&self) -> i64 {
        self.token_ttl
    }
}
