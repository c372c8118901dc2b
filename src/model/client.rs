use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::{hash_password, verify_password, UserIdentity};
use crate::error::{Result, ServerError};

/// 名称最大长度（字符）
pub const NAME_MAX_LEN: usize = 255;
/// 邮箱最大长度（字符）
pub const EMAIL_MAX_LEN: usize = 255;
/// 密码最小长度（字符）
pub const PASSWORD_MIN_LEN: usize = 6;

/// 客户
///
/// 所有字段私有，只能通过构造函数和修改方法变更，保证不变量始终成立：
/// - name 非空白且不超过 255 字符
/// - email 格式合法且不超过 255 字符
/// - 密码只以 bcrypt 哈希形式保存，永远不会被序列化
#[derive(Debug, Clone, Serialize)]
pub struct Client {
    id: Option<i64>,
    name: String,
    email: String,
    #[serde(skip_serializing)] // 永远不要序列化密码哈希
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Client {
    /// 创建新客户（校验所有字段并哈希密码）
    pub fn new(name: &str, email: &str, password: &str) -> Result<Self> {
        let name = validate_name(name)?;
        let email = validate_email(email)?;
        validate_password(password)?;

        let now = Utc::now();
        Ok(Self {
            id: None,
            name,
            email,
            password_hash: hash_password(password)?,
            created_at: now,
            updated_at: now,
        })
    }

    /// 从存储中重建（受信数据，不再重复校验）
    ///
    /// 只用于从数据库读出的行，不能用于请求输入。
    pub fn restore(
        id: i64,
        name: String,
        email: String,
        password_hash: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            name,
            email,
            password_hash,
            created_at,
            updated_at,
        }
    }

    /// 写入存储后回填 ID
    pub fn persisted(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn update_name(&mut self, name: &str) -> Result<()> {
        self.name = validate_name(name)?;
        self.touch();
        Ok(())
    }

    pub fn update_email(&mut self, email: &str) -> Result<()> {
        self.email = validate_email(email)?;
        self.touch();
        Ok(())
    }

    pub fn update_password(&mut self, password: &str) -> Result<()> {
        validate_password(password)?;
        self.password_hash = hash_password(password)?;
        self.touch();
        Ok(())
    }

    /// 校验明文密码
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }

    /// token 中携带的用户摘要（未持久化的客户没有身份）
    pub fn identity(&self) -> Option<UserIdentity> {
        self.id.map(|id| UserIdentity {
            id,
            name: self.name.clone(),
            email: self.email.clone(),
        })
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_name(name: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(ServerError::Validation("Name cannot be empty".to_string()));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(ServerError::Validation(format!(
            "Name cannot exceed {} characters",
            NAME_MAX_LEN
        )));
    }
    Ok(name.to_string())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(ServerError::Validation(format!(
            "Password must be at least {} characters long",
            PASSWORD_MIN_LEN
        )));
    }
    Ok(())
}

/// 校验邮箱格式（不做任何规范化，含空白即视为非法）
pub fn validate_email(email: &str) -> Result<String> {
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(ServerError::Validation(format!(
            "Email cannot exceed {} characters",
            EMAIL_MAX_LEN
        )));
    }
    if !is_valid_email(email) {
        return Err(ServerError::Validation("Invalid email format".to_string()));
    }
    Ok(email.to_string())
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.is_empty() {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~.".contains(c));
    if !local_ok {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_hashes_password() {
        let client = Client::new("Alice", "alice@example.com", "123456").unwrap();
        assert_eq!(client.id(), None);
        assert_eq!(client.name(), "Alice");
        assert_ne!(client.password_hash(), "123456");
        assert!(client.verify_password("123456"));
        assert!(!client.verify_password("654321"));
    }

    #[test]
    fn test_new_client_rejects_invalid_fields() {
        assert!(matches!(
            Client::new("   ", "alice@example.com", "123456"),
            Err(ServerError::Validation(_))
        ));
        assert!(matches!(
            Client::new(&"a".repeat(256), "alice@example.com", "123456"),
            Err(ServerError::Validation(_))
        ));
        assert!(matches!(
            Client::new("Alice", "not-an-email", "123456"),
            Err(ServerError::Validation(_))
        ));
        assert!(matches!(
            Client::new("Alice", "alice@example.com", "12345"),
            Err(ServerError::Validation(_))
        ));
    }

    #[test]
    fn test_name_at_limit_is_accepted() {
        assert!(Client::new(&"a".repeat(255), "alice@example.com", "123456").is_ok());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
        assert!(validate_email(" a@b.com").is_err());

        for bad in [
            "",
            "@example.com",
            "user@",
            "user@localhost",
            "user@@example.com",
            "us er@example.com",
            ".user@example.com",
            "user@-example.com",
            "user@example..com",
        ] {
            assert!(validate_email(bad).is_err(), "{} should be rejected", bad);
        }

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_mutators_validate_and_touch() {
        let mut client = Client::new("Alice", "alice@example.com", "123456").unwrap();
        let before = client.updated_at();

        assert!(client.update_name("").is_err());
        assert_eq!(client.name(), "Alice");

        client.update_name("Alice Cooper").unwrap();
        client.update_email("cooper@example.com").unwrap();
        assert!(client.update_email("broken").is_err());
        assert_eq!(client.email(), "cooper@example.com");

        client.update_password("new-secret").unwrap();
        assert!(client.verify_password("new-secret"));
        assert!(client.update_password("123").is_err());
        assert!(client.updated_at() >= before);
    }

    #[test]
    fn test_serialization_never_exposes_password() {
        let client = Client::new("Alice", "alice@example.com", "123456")
            .unwrap()
            .persisted(7);
        let json = serde_json::to_value(&client).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["email"], "alice@example.com");
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("$2b$"));
    }

    #[test]
    fn test_restore_skips_validation() {
        let now = Utc::now();
        let client = Client::restore(
            1,
            "Legacy".to_string(),
            "legacy@example.com".to_string(),
            "$2b$04$invalidbutstoredhash".to_string(),
            now,
            now,
        );
        assert_eq!(client.id(), Some(1));
        assert_eq!(
            client.identity(),
            Some(UserIdentity {
                id: 1,
                name: "Legacy".to_string(),
                email: "legacy@example.com".to_string(),
            })
        );
    }
}
