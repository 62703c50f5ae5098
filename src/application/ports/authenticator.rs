//! Authenticator Port - 调用方身份校验

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("缺少访问令牌")]
    MissingToken,

    #[error("访问令牌无效")]
    InvalidToken,
}

/// 已认证的调用方
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".to_string(),
        }
    }
}

/// Authenticator Port
pub trait AuthenticatorPort: Send + Sync {
    /// 校验 Bearer 令牌
    fn authenticate(&self, token: Option<&str>) -> Result<Principal, AuthError>;
}
