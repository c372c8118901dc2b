//! 客户服务

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Result, ServerError};
use crate::model::Client;
use crate::repository::{ClientRepository, FavoriteRepository, SessionRepository};

/// 部分更新请求，未提供的字段保持不变
#[derive(Debug, Clone, Default)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UpdateClient {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }
}

pub struct ClientService {
    clients: Arc<dyn ClientRepository>,
    sessions: Arc<dyn SessionRepository>,
    favorites: Arc<dyn FavoriteRepository>,
}

impl ClientService {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        sessions: Arc<dyn SessionRepository>,
        favorites: Arc<dyn FavoriteRepository>,
    ) -> Self {
        Self {
            clients,
            sessions,
            favorites,
        }
    }

    pub async fn get_all_clients(&self) -> Result<Vec<Client>> {
        self.clients.find_all().await
    }

    pub async fn get_client(&self, id: i64) -> Result<Client> {
        self.clients
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServerError::NotFound("Client not found".to_string()))
    }

    /// 创建客户
    ///
    /// 先做邮箱预检查；并发下的重复由唯一约束兜底，同样映射为 Conflict。
    pub async fn create_client(&self, name: &str, email: &str, password: &str) -> Result<Client> {
        let client = Client::new(name, email, password)?;

        if self.clients.email_exists(client.email(), None).await? {
            warn!("❌ 创建客户失败：邮箱已存在");
            return Err(ServerError::Conflict("Email already exists".to_string()));
        }

        let saved = self.clients.save(&client).await?;
        info!("✅ 客户创建成功: id={:?}", saved.id());
        Ok(saved)
    }

    /// 部分更新客户资料
    pub async fn update_client(&self, id: i64, update: UpdateClient) -> Result<Client> {
        let mut client = self.get_client(id).await?;

        if let Some(email) = update.email.as_deref() {
            if self.clients.email_exists(email, Some(id)).await? {
                warn!("❌ 更新客户失败：邮箱已被占用 id={}", id);
                return Err(ServerError::Conflict("Email already exists".to_string()));
            }
            client.update_email(email)?;
        }
        if let Some(name) = update.name.as_deref() {
            client.update_name(name)?;
        }
        if let Some(password) = update.password.as_deref() {
            client.update_password(password)?;
        }

        let updated = self.clients.update(&client).await?;
        info!("✅ 客户更新成功: id={}", id);
        Ok(updated)
    }

    /// 删除客户：先撤销其全部会话，再删除记录（收藏随外键级联删除），返回被删除的客户
    pub async fn delete_client(&self, id: i64) -> Result<Client> {
        let client = self.get_client(id).await?;

        let revoked = self.sessions.revoke_all_for_client(id).await?;
        debug!("删除客户前撤销会话: id={}, count={}", id, revoked);

        if !self.clients.delete(id).await? {
            return Err(ServerError::NotFound("Client not found".to_string()));
        }
        self.favorites.evict_client(id).await;
        info!("🗑️ 客户已删除: id={}", id);
        Ok(client)
    }
}
