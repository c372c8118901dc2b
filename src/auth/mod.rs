// 认证模块 - JWT 签发/验证与密码哈希

pub mod jwt_service;
pub mod models;
pub mod password;

pub use jwt_service::{generate_jti, JwtService, TokenError};
pub use models::{IssuedToken, SessionClaims, UserIdentity};
pub use password::{hash_password, verify_password, PASSWORD_COST};
