//! Node configuration.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use decipher_core::{DecipherError, Result, MAX_SOURCES};
use decipher_lifecycle::GenerationConfig;
use serde::{Deserialize, Serialize};

/// Where uploaded files go and how they are addressed publicly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local directory that object keys are resolved against.
    pub root: PathBuf,

    /// Prefix of every public file URL. The node itself serves `root` under `/files`.
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("uploads"),
            public_base_url: "http://localhost:3000/files".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    pub max_sources: usize,
    pub max_upload_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_sources: MAX_SOURCES,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Full configuration of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Research service client settings.
    pub research: GenerationConfig,

    /// Shared secret for worker write-back routes. `None` disables them.
    pub internal_api_key: Option<String>,

    pub storage: StorageConfig,

    pub limits: Limits,

    /// Development session table: token to user id.
    pub session_tokens: HashMap<String, String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            research: GenerationConfig::default(),
            internal_api_key: None,
            storage: StorageConfig::default(),
            limits: Limits::default(),
            session_tokens: HashMap::new(),
        }
    }
}

impl NodeConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("DECIPHER_BIND_ADDR") {
            config.bind_addr = parse("DECIPHER_BIND_ADDR", &addr)?;
        }
        if let Some(url) = lookup("BACKEND_API_URL") {
            config.research.base_url = url;
        }
        config.research.api_key = lookup("BACKEND_API_KEY").filter(|k| !k.is_empty());
        if let Some(secs) = lookup("DECIPHER_REQUEST_TIMEOUT_SECS") {
            config.research.timeout_secs = parse("DECIPHER_REQUEST_TIMEOUT_SECS", &secs)?;
        }
        config.internal_api_key = lookup("DECIPHER_INTERNAL_API_KEY").filter(|k| !k.is_empty());
        if let Some(dir) = lookup("DECIPHER_UPLOAD_DIR") {
            config.storage.root = PathBuf::from(dir);
        }
        if let Some(url) = lookup("DECIPHER_PUBLIC_URL") {
            config.storage.public_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(max) = lookup("DECIPHER_MAX_SOURCES") {
            config.limits.max_sources = parse("DECIPHER_MAX_SOURCES", &max)?;
        }
        if let Some(max) = lookup("DECIPHER_MAX_UPLOAD_BYTES") {
            config.limits.max_upload_bytes = parse("DECIPHER_MAX_UPLOAD_BYTES", &max)?;
        }
        if let Some(table) = lookup("DECIPHER_SESSION_TOKENS") {
            config.session_tokens = parse_session_tokens(&table)?;
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| DecipherError::validation(format!("invalid {key} '{value}': {e}")))
}

/// Parse `token=user,token=user`.
fn parse_session_tokens(table: &str) -> Result<HashMap<String, String>> {
    table
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((token, user)) if !token.is_empty() && !user.is_empty() => {
                Ok((token.to_string(), user.to_string()))
            }
            _ => Err(DecipherError::validation(format!(
                "invalid DECIPHER_SESSION_TOKENS entry '{entry}'"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = NodeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.research.base_url, "http://localhost:8000/api");
        assert_eq!(config.research.timeout_secs, 30);
        assert_eq!(config.limits.max_sources, 20);
        assert_eq!(config.limits.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.internal_api_key.is_none());
        assert!(config.session_tokens.is_empty());
    }

    #[test]
    fn test_env_overlay() {
        let config = NodeConfig::from_lookup(lookup_from(&[
            ("DECIPHER_BIND_ADDR", "127.0.0.1:8080"),
            ("BACKEND_API_URL", "http://research:8000/api"),
            ("BACKEND_API_KEY", "k"),
            ("DECIPHER_MAX_SOURCES", "5"),
            ("DECIPHER_PUBLIC_URL", "https://cdn.example.com/"),
            ("DECIPHER_SESSION_TOKENS", "t1=alice, t2=bob"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.research.base_url, "http://research:8000/api");
        assert_eq!(config.research.api_key.as_deref(), Some("k"));
        assert_eq!(config.limits.max_sources, 5);
        assert_eq!(config.storage.public_base_url, "https://cdn.example.com");
        assert_eq!(config.session_tokens.get("t2").map(String::as_str), Some("bob"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = NodeConfig::from_lookup(lookup_from(&[("DECIPHER_MAX_SOURCES", "many")]))
            .unwrap_err();
        assert!(matches!(err, DecipherError::Validation { .. }));

        assert!(
            NodeConfig::from_lookup(lookup_from(&[("DECIPHER_SESSION_TOKENS", "nouser")]))
                .is_err()
        );
    }
}
