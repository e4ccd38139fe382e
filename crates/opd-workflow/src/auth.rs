//! 角色授权
//!
//! 两个静态角色凭据作为可注入配置，鉴权产物是显式传递的授权上下文，
//! 任何持久化变更操作都必须携带它，不存在进程级的全局会话状态。

use opd_core::{OpdError, Result};
use serde::{Deserialize, Serialize};

/// 操作角色
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,  // 管理员
    Doctor, // 医生
}

impl Role {
    /// 是否允许推进就诊状态
    pub fn can_update_status(&self) -> bool {
        matches!(self, Role::Admin | Role::Doctor)
    }

    /// 是否允许手动升级危急程度
    pub fn can_escalate(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// 授权上下文，变更操作的显式凭证
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub role: Role,
}

/// 单个角色的登录凭据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub user_id: String,
    pub password: String,
}

/// 角色凭据表，由配置注入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialTable {
    pub admin: Credential,
    pub doctor: Credential,
}

impl Default for CredentialTable {
    fn default() -> Self {
        Self {
            admin: Credential {
                user_id: "admin".to_string(),
                password: "admin123".to_string(),
            },
            doctor: Credential {
                user_id: "doctor".to_string(),
                password: "doctor123".to_string(),
            },
        }
    }
}

impl CredentialTable {
    /// 校验凭据，成功时返回对应角色的授权上下文
    pub fn authenticate(&self, user_id: &str, password: &str) -> Result<AuthContext> {
        if user_id == self.admin.user_id && password == self.admin.password {
            return Ok(AuthContext { role: Role::Admin });
        }
        if user_id == self.doctor.user_id && password == self.doctor.password {
            return Ok(AuthContext { role: Role::Doctor });
        }
        Err(OpdError::Permission(
            "Invalid user id or password".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate_known_roles() {
        let table = CredentialTable::default();

        let ctx = table.authenticate("admin", "admin123").unwrap();
        assert_eq!(ctx.role, Role::Admin);

        let ctx = table.authenticate("doctor", "doctor123").unwrap();
        assert_eq!(ctx.role, Role::Doctor);
    }

    #[test]
    fn test_authenticate_rejects_bad_credentials() {
        let table = CredentialTable::default();

        assert!(table.authenticate("admin", "wrong").is_err());
        assert!(table.authenticate("nurse", "admin123").is_err());
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.can_update_status());
        assert!(Role::Doctor.can_update_status());
        assert!(Role::Admin.can_escalate());
        assert!(!Role::Doctor.can_escalate());
    }
}
