//! Static Token Authenticator - 基于配置令牌表的调用方校验
//!
//! 令牌格式为 `name:secret` 或单独的 `secret`，后者的调用方名称按序号生成

use crate::application::ports::{AuthError, AuthenticatorPort, Principal};

pub struct StaticTokenAuthenticator {
    enabled: bool,
    /// (调用方名称, 令牌)
    tokens: Vec<(String, String)>,
}

impl StaticTokenAuthenticator {
    pub fn new(enabled: bool, tokens: &[String]) -> Self {
        let tokens = tokens
            .iter()
            .map(|raw| raw.trim())
            .filter(|raw| !raw.is_empty())
            .enumerate()
            .map(|(i, raw)| match raw.split_once(':') {
                Some((name, secret)) if !name.is_empty() && !secret.is_empty() => {
                    (name.to_string(), secret.to_string())
                }
                _ => (format!("client-{}", i + 1), raw.to_string()),
            })
            .collect();

        Self { enabled, tokens }
    }

    /// 关闭校验，所有请求视为匿名调用方
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            tokens: Vec::new(),
        }
    }
}

impl AuthenticatorPort for StaticTokenAuthenticator {
    fn authenticate(&self, token: Option<&str>) -> Result<Principal, AuthError> {
        if !self.enabled {
            return Ok(Principal::anonymous());
        }

        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        self.tokens
            .iter()
            .find(|(_, secret)| secret == token)
            .map(|(name, _)| Principal { name: name.clone() })
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_allows_anonymous() {
        let auth = StaticTokenAuthenticator::disabled();
        assert_eq!(auth.authenticate(None), Ok(Principal::anonymous()));
    }

    #[test]
    fn test_named_and_bare_tokens() {
        let auth = StaticTokenAuthenticator::new(
            true,
            &["editor:s3cret".to_string(), "plain-token".to_string()],
        );

        assert_eq!(auth.authenticate(Some("s3cret")).unwrap().name, "editor");
        assert_eq!(auth.authenticate(Some("plain-token")).unwrap().name, "client-2");
        assert_eq!(auth.authenticate(Some("nope")), Err(AuthError::InvalidToken));
        assert_eq!(auth.authenticate(Some("  ")), Err(AuthError::MissingToken));
        assert_eq!(auth.authenticate(None), Err(AuthError::MissingToken));
    }
}
