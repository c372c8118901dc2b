//! 认证服务
//!
//! 会话模型是"无状态 JWT + 服务端撤销表"的混合：
//! token 本身可离线验签，但每次验证还要查询会话表，
//! 查不到、已过期或已撤销的 jti 一律视为无效（fail-closed）。
//!
//! 刷新策略：refresh 先撤销旧 token，再签发新 token（轮换）。

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::auth::{IssuedToken, JwtService, SessionClaims, UserIdentity};
use crate::error::{Result, ServerError};
use crate::model::Client;
use crate::repository::{ClientRepository, SessionRepository};

pub struct AuthService {
    jwt_service: Arc<JwtService>,
    clients: Arc<dyn ClientRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl AuthService {
    pub fn new(
        jwt_service: Arc<JwtService>,
        clients: Arc<dyn ClientRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            jwt_service,
            clients,
            sessions,
        }
    }

    /// 校验邮箱和密码
    ///
    /// 邮箱不存在和密码错误都返回 `Ok(None)`，不区分原因。
    pub async fn authenticate_user(&self, email: &str, password: &str) -> Result<Option<Client>> {
        let Some(client) = self.clients.find_by_email(email).await? else {
            debug!("登录失败：邮箱不存在");
            return Ok(None);
        };

        if !client.verify_password(password) {
            debug!("登录失败：密码错误 client_id={:?}", client.id());
            return Ok(None);
        }

        Ok(Some(client))
    }

    /// 为客户签发新 token，并在会话表中登记 jti
    pub async fn generate_jwt(&self, client: &Client) -> Result<IssuedToken> {
        let identity = client
            .identity()
            .ok_or_else(|| ServerError::Internal("无法为未持久化的客户签发 token".to_string()))?;
        let client_id = identity.id;

        let claims = self.jwt_service.new_claims(identity);
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| ServerError::Internal(format!("无效的过期时间: {}", claims.exp)))?;

        // 先登记会话再签名，保证签发出去的 token 一定能查到记录
        self.sessions
            .store_session(client_id, &claims.jti, expires_at)
            .await?;
        let access_token = self.jwt_service.encode(&claims)?;

        info!("✅ Token 签发成功: client_id={}, jti={}", client_id, claims.jti);

        Ok(IssuedToken {
            access_token,
            jti: claims.jti,
            expires_in: self.jwt_service.token_ttl(),
        })
    }

    /// 验证 token，成功时返回 token 中的用户身份
    ///
    /// 任何失败（验签、过期、格式、会话已撤销、会话表查询出错）都返回 None。
    pub async fn validate_jwt(&self, token: &str) -> Option<UserIdentity> {
        self.verify_session(token).await.map(|claims| claims.user)
    }

    /// 刷新 token：先撤销旧 token，撤销成功后才签发新 token
    ///
    /// 撤销是条件更新（仅 `revoked_at IS NULL` 的会话），同一 token 并发刷新时
    /// 只有一个请求能拿到新 token。旧 token 无效、已被刷新或客户已不存在时返回 `Ok(None)`。
    pub async fn refresh_token(&self, token: &str) -> Result<Option<IssuedToken>> {
        let Some(claims) = self.verify_session(token).await else {
            return Ok(None);
        };

        let Some(client) = self.clients.find_by_id(claims.user.id).await? else {
            warn!("⚠️ 刷新 token 时客户不存在: client_id={}", claims.user.id);
            return Ok(None);
        };

        if !self.sessions.revoke_token(&claims.jti).await? {
            warn!("⚠️ 刷新失败：旧会话已被撤销 jti={}", claims.jti);
            return Ok(None);
        }

        let issued = self.generate_jwt(&client).await?;

        info!(
            "🔄 Token 已轮换: client_id={}, old_jti={}, new_jti={}",
            claims.user.id, claims.jti, issued.jti
        );
        Ok(Some(issued))
    }

    /// 登出：撤销 token 对应的会话
    ///
    /// token 无法解析或会话未被更新时返回 `Ok(false)`。
    pub async fn logout(&self, token: &str) -> Result<bool> {
        let claims = match self.jwt_service.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("登出失败：token 无法解析: {}", e);
                return Ok(false);
            }
        };
        if claims.jti.is_empty() {
            return Ok(false);
        }

        let revoked = self.sessions.revoke_token(&claims.jti).await?;
        if revoked {
            info!("👋 会话已撤销: client_id={}, jti={}", claims.user.id, claims.jti);
        }
        Ok(revoked)
    }

    /// 撤销客户的全部会话（删除账号时使用）
    pub async fn revoke_all_sessions(&self, client_id: i64) -> Result<u64> {
        let count = self.sessions.revoke_all_for_client(client_id).await?;
        info!("🔒 已撤销客户全部会话: client_id={}, count={}", client_id, count);
        Ok(count)
    }

    /// 清理过期会话
    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        self.sessions.purge_expired().await
    }

    /// 验签 + 会话表检查
    async fn verify_session(&self, token: &str) -> Option<SessionClaims> {
        let claims = match self.jwt_service.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("token 验证失败: {}", e);
                return None;
            }
        };
        if claims.jti.is_empty() {
            debug!("token 缺少 jti");
            return None;
        }

        match self.sessions.is_session_revoked(&claims.jti).await {
            Ok(false) => Some(claims),
            Ok(true) => {
                debug!("token 会话已失效: jti={}", claims.jti);
                None
            }
            Err(e) => {
                error!("❌ 会话状态查询失败，按无效处理: jti={}, {}", claims.jti, e);
                None
            }
        }
    }
}
