//! Sender configuration from environment variables

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::transaction::{ProviderConfig, DEFAULT_DEEP_LINK_PREFIX, DEFAULT_RPC_URL};

/// Settings shared by the senders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    /// toncenter-compatible API base URL
    pub rpc_url: String,
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub rpc_timeout: u64,
    /// Deep link scheme
    pub deep_link_prefix: String,
    /// Workchain of the mnemonic wallet
    pub workchain: i32,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            api_key: None,
            rpc_timeout: 30,
            deep_link_prefix: DEFAULT_DEEP_LINK_PREFIX.to_string(),
            workchain: 0,
        }
    }
}

impl SenderConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            rpc_url: lookup("TON_RPC_URL").unwrap_or(defaults.rpc_url),
            api_key: lookup("TON_API_KEY").filter(|key| !key.is_empty()),
            rpc_timeout: parse_var(&lookup, "TON_RPC_TIMEOUT", defaults.rpc_timeout)?,
            deep_link_prefix: lookup("TON_DEEP_LINK_PREFIX").unwrap_or(defaults.deep_link_prefix),
            workchain: parse_var(&lookup, "TON_WORKCHAIN", defaults.workchain)?,
        })
    }

    /// RPC client settings
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            url: self.rpc_url.clone(),
            api_key: self.api_key.clone(),
            timeout: Some(self.rpc_timeout),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", key, value, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<SenderConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SenderConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, SenderConfig::default());
        assert_eq!(config.rpc_url, "https://toncenter.com/api/v2");
        assert_eq!(config.deep_link_prefix, "ton");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("TON_RPC_URL", "https://testnet.toncenter.com/api/v2"),
            ("TON_API_KEY", "secret"),
            ("TON_RPC_TIMEOUT", "5"),
            ("TON_DEEP_LINK_PREFIX", "tonkeeper"),
            ("TON_WORKCHAIN", "-1"),
        ])
        .unwrap();

        assert_eq!(config.workchain, -1);
        assert_eq!(config.deep_link_prefix, "tonkeeper");
        let provider = config.provider_config();
        assert_eq!(provider.api_key.as_deref(), Some("secret"));
        assert_eq!(provider.timeout, Some(5));
    }

    #[test]
    fn test_invalid_number() {
        let error = config_from(&[("TON_RPC_TIMEOUT", "soon")]).unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }
}
