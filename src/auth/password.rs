/// 密码加密和验证模块
///
/// 使用 bcrypt 算法进行密码加密（行业标准）
use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::ServerError;

/// 密码加密成本（默认值12，适合大多数场景）
///
/// 成本值越高，加密越安全，但也越慢：
/// - 10: 约 80ms（适合高并发场景）
/// - 12: 约 300ms（默认，平衡安全和性能）
/// - 14: 约 1200ms（高安全场景）
///
/// 单元测试下使用 bcrypt 允许的最小值 4。
pub const PASSWORD_COST: u32 = if cfg!(test) { 4 } else { DEFAULT_COST };

/// 加密密码
///
/// # 返回
/// - Ok(String): 加密后的密码哈希（60字符）
/// - Err: 加密失败
pub fn hash_password(password: &str) -> Result<String, ServerError> {
    hash(password, PASSWORD_COST)
        .map_err(|e| ServerError::Internal(format!("密码加密失败: {}", e)))
}

/// 验证密码
///
/// 慢哈希比较，哈希格式损坏时同样视为不匹配并记录告警。
pub fn verify_password(password: &str, hash: &str) -> bool {
    match verify(password, hash) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::warn!("⚠️ 密码哈希校验失败: {}", e);
            false
        }
    }
}
