// src/config.rs

use std::env;
use std::path::PathBuf;
use tracing::warn;

use crate::error::ConfigurationError;
use crate::sys::proxy::{validate_proxy_host, NoProxyPatterns, ProxyPolicy};
use crate::sys::secrets::MaskedValue;
use crate::sys::server::{InMemoryServerRegistry, ServerDescriptor};
use crate::sys::traits::{ExecutionNode, ProxySource};

#[derive(Debug)]
pub struct BuilderConfig {
    // 🛡️ Target server & identity
    pub server_url: String,
    pub username: String,
    pub password: MaskedValue,
    pub servers_file: Option<PathBuf>,

    // 📂 Execution node
    pub node: ExecutionNode,

    // 🌐 Network
    pub proxy: Option<ProxyPolicy>,
}

impl BuilderConfig {
    pub fn load() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = lookup("SCOMMAND_SERVER_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigurationError::MissingVariable("SCOMMAND_SERVER_URL"))?;

        let node = ExecutionNode::new(
            lookup("SCOMMAND_NODE_NAME").unwrap_or_else(|| "local".to_string()),
            lookup("SCOMMAND_NODE_ROOT").unwrap_or_else(|| "/var/lib/scommand".to_string()),
        );

        Ok(Self {
            server_url,
            username: lookup("SCOMMAND_USERNAME").unwrap_or_default(),
            password: MaskedValue::new(lookup("SCOMMAND_PASSWORD").unwrap_or_default()),
            servers_file: lookup("SCOMMAND_SERVERS_FILE").map(PathBuf::from),
            node,
            proxy: load_proxy(&lookup),
        })
    }

    /// Servers from `SCOMMAND_SERVERS_FILE`, plus the server given inline
    /// when credentials were supplied for it.
    pub fn registry(&self) -> Result<InMemoryServerRegistry, ConfigurationError> {
        let mut registry = match &self.servers_file {
            Some(path) => InMemoryServerRegistry::load(path)?,
            None => InMemoryServerRegistry::new(),
        };
        if !self.username.is_empty() {
            registry.register(ServerDescriptor::new(
                &self.server_url,
                self.username.clone(),
                self.password.duplicate(),
            )?);
        }
        Ok(registry)
    }
}

impl ProxySource for BuilderConfig {
    fn current_proxy_policy(&self) -> Option<&ProxyPolicy> {
        self.proxy.as_ref()
    }
}

/// Reads the proxy section. Malformed settings never abort the build: they
/// are logged and the invocation goes out without a proxy.
fn load_proxy<F>(lookup: &F) -> Option<ProxyPolicy>
where
    F: Fn(&str) -> Option<String>,
{
    // Blank host means no proxy; everything else in the section is ignored then.
    let host = lookup("SCOMMAND_PROXY_HOST").filter(|h| !h.trim().is_empty())?;
    let host = host.trim().to_string();
    if let Err(e) = validate_proxy_host(&host) {
        warn!("Ignoring proxy configuration: {}", e);
        return None;
    }

    let port = match lookup("SCOMMAND_PROXY_PORT") {
        Some(raw) => match raw.trim().parse::<u16>() {
            Ok(port) => Some(port),
            Err(e) => {
                warn!("Ignoring proxy configuration: invalid SCOMMAND_PROXY_PORT '{}': {}", raw, e);
                return None;
            }
        },
        None => None,
    };

    let no_proxy = match lookup("SCOMMAND_NO_PROXY") {
        Some(list) => match NoProxyPatterns::from_hosts(&list) {
            Ok(patterns) => patterns,
            Err(e) => {
                warn!("Ignoring proxy configuration: {}", e);
                return None;
            }
        },
        None => NoProxyPatterns::new(),
    };

    Some(ProxyPolicy {
        host: Some(host),
        port,
        username: lookup("SCOMMAND_PROXY_USER"),
        password: lookup("SCOMMAND_PROXY_PASSWORD").map(MaskedValue::new),
        no_proxy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::traits::ServerRegistry;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<BuilderConfig, ConfigurationError> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        BuilderConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn server_url_is_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingVariable("SCOMMAND_SERVER_URL")));
    }

    #[test]
    fn defaults_apply_without_proxy() {
        let config = config_from(&[("SCOMMAND_SERVER_URL", "http://ct.example.com/concerto")]).unwrap();
        assert_eq!(config.node.name, "local");
        assert_eq!(config.node.root, PathBuf::from("/var/lib/scommand"));
        assert!(config.current_proxy_policy().is_none());
    }

    #[test]
    fn proxy_section_is_parsed() {
        let config = config_from(&[
            ("SCOMMAND_SERVER_URL", "http://ct.example.com/concerto"),
            ("SCOMMAND_PROXY_HOST", " proxy.local "),
            ("SCOMMAND_PROXY_PORT", "3128"),
            ("SCOMMAND_PROXY_USER", "bob"),
            ("SCOMMAND_PROXY_PASSWORD", "pw"),
            ("SCOMMAND_NO_PROXY", "localhost,*.internal"),
        ])
        .unwrap();
        let proxy = config.current_proxy_policy().unwrap();
        assert_eq!(proxy.proxy_host(), Some("proxy.local"));
        assert_eq!(proxy.port, Some(3128));
        assert_eq!(proxy.proxy_username(), Some("bob"));
        assert_eq!(proxy.no_proxy.len(), 2);
    }

    #[test]
    fn blank_proxy_host_disables_proxy() {
        let config = config_from(&[
            ("SCOMMAND_SERVER_URL", "http://ct.example.com/"),
            ("SCOMMAND_PROXY_HOST", "  "),
            ("SCOMMAND_PROXY_PORT", "not-a-port"),
        ])
        .unwrap();
        assert!(config.proxy.is_none());
    }

    #[test]
    fn bad_proxy_port_drops_proxy() {
        for port in ["70000", "abc", "-1"] {
            let config = config_from(&[
                ("SCOMMAND_SERVER_URL", "http://ct.example.com/"),
                ("SCOMMAND_PROXY_HOST", "proxy.local"),
                ("SCOMMAND_PROXY_PORT", port),
            ])
            .unwrap();
            assert!(config.current_proxy_policy().is_none(), "port {}", port);
        }
    }

    #[test]
    fn invalid_proxy_host_drops_proxy() {
        let config = config_from(&[
            ("SCOMMAND_SERVER_URL", "http://ct.example.com/"),
            ("SCOMMAND_PROXY_HOST", "proxy local"),
            ("SCOMMAND_PROXY_PORT", "3128"),
        ])
        .unwrap();
        assert!(config.proxy.is_none());
    }

    #[test]
    fn proxy_without_port_is_kept() {
        let config = config_from(&[
            ("SCOMMAND_SERVER_URL", "http://ct.example.com/"),
            ("SCOMMAND_PROXY_HOST", "proxy.local"),
        ])
        .unwrap();
        let proxy = config.current_proxy_policy().unwrap();
        assert_eq!(proxy.proxy_host(), Some("proxy.local"));
        assert_eq!(proxy.port, None);
    }

    #[test]
    fn inline_server_is_registered() {
        let config = config_from(&[
            ("SCOMMAND_SERVER_URL", "http://ct.example.com/concerto"),
            ("SCOMMAND_USERNAME", "admin"),
            ("SCOMMAND_PASSWORD", "pw"),
        ])
        .unwrap();
        let registry = config.registry().unwrap();
        let server = registry.lookup_server(&config.server_url).unwrap();
        assert_eq!(server.username, "admin");
        assert!(server.password.use_secret(|p| p == "pw"));
    }

    #[test]
    fn no_credentials_means_empty_registry() {
        let config = config_from(&[("SCOMMAND_SERVER_URL", "http://ct.example.com/")]).unwrap();
        assert!(config.registry().unwrap().is_empty());
    }
}
