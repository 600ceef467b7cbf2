// src/sys/server.rs

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use url::Url;

use crate::error::ConfigurationError;
use crate::sys::secrets::MaskedValue;
use crate::sys::traits::ServerRegistry;

/// One configured CloudTest server. Read-only once registered.
///
/// `url` is the parsed form used for lookups; the text as configured is kept
/// separately because that is what goes on the command line.
#[derive(Debug)]
pub struct ServerDescriptor {
    pub url: Url,
    configured: String,
    pub username: String,
    pub password: MaskedValue,
}

impl ServerDescriptor {
    pub fn new(url: &str, username: impl Into<String>, password: impl Into<MaskedValue>) -> Result<Self, ConfigurationError> {
        let configured = url.trim().to_string();
        let url = Url::parse(&configured).map_err(|source| ConfigurationError::InvalidUrl {
            url: configured.clone(),
            source,
        })?;
        Ok(Self {
            url,
            configured,
            username: username.into(),
            password: password.into(),
        })
    }

    /// The URL exactly as configured (case, default port and path untouched).
    pub fn as_configured(&self) -> &str {
        &self.configured
    }

    /// Destination host used for the proxy decision, sliced from the
    /// configured text so its case survives.
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()?;
        let rest = self.configured.split_once("://").map(|(_, rest)| rest)?;
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
        let host = if host_port.starts_with('[') {
            host_port.find(']').map_or(host_port, |end| &host_port[..=end])
        } else {
            host_port.split(':').next().unwrap_or_default()
        };
        Some(host).filter(|h| !h.is_empty())
    }
}

/// On-disk shape of a registry entry. Converted immediately so the password
/// lives in a `MaskedValue` from then on.
#[derive(Deserialize)]
struct RawServer {
    url: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Servers keyed by URL (as written in the configuration).
#[derive(Debug, Default)]
pub struct InMemoryServerRegistry {
    servers: HashMap<String, ServerDescriptor>,
}

impl InMemoryServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, server: ServerDescriptor) {
        self.servers.insert(server.url.as_str().to_string(), server);
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Parses a JSON array of `{ "url", "username", "password" }` objects.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let raw: Vec<RawServer> =
            serde_json::from_str(json).map_err(|e| ConfigurationError::Registry(e.to_string()))?;
        let mut registry = Self::new();
        for entry in raw {
            registry.register(ServerDescriptor::new(&entry.url, entry.username, entry.password)?);
        }
        Ok(registry)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::Registry(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

impl ServerRegistry for InMemoryServerRegistry {
    fn lookup_server(&self, url: &str) -> Option<&ServerDescriptor> {
        if let Some(server) = self.servers.get(url) {
            return Some(server);
        }
        // Tolerate the normalised form ("http://host" vs "http://host/").
        let normalised = Url::parse(url).ok()?;
        self.servers.get(normalised.as_str())
    }
}
