use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::error::InstallationError;
use crate::sys::proxy::ProxyPolicy;
use crate::sys::server::ServerDescriptor;

/// Append-only progress stream of the running build step.
/// Sends are best-effort: a closed receiver never fails the build.
pub type LogSink = mpsc::Sender<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePlatform { Unix, Windows }

/// The machine the tool is installed on and launched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionNode {
    pub name: String,
    /// Root directory under which tools are materialised on this node.
    pub root: PathBuf,
    pub platform: NodePlatform,
}

impl ExecutionNode {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            platform: if cfg!(windows) { NodePlatform::Windows } else { NodePlatform::Unix },
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

// ==============================================================================
// 1. Tool Installation
// ==============================================================================

#[async_trait]
pub trait ToolInstaller: Send + Sync {
    /// Makes the tool available on `node` and returns its executable path.
    /// May block on network or disk for the duration of the install.
    async fn install(&self, node: &ExecutionNode, log: &LogSink) -> Result<PathBuf, InstallationError>;
}

// ==============================================================================
// 2. Server Registry
// ==============================================================================

pub trait ServerRegistry: Send + Sync {
    /// Looks up a configured server by its URL.
    fn lookup_server(&self, url: &str) -> Option<&ServerDescriptor>;
}

// ==============================================================================
// 3. Proxy Configuration Store
// ==============================================================================

pub trait ProxySource: Send + Sync {
    fn current_proxy_policy(&self) -> Option<&ProxyPolicy>;
}

impl ProxySource for ProxyPolicy {
    fn current_proxy_policy(&self) -> Option<&ProxyPolicy> {
        Some(self)
    }
}

impl ProxySource for Option<ProxyPolicy> {
    fn current_proxy_policy(&self) -> Option<&ProxyPolicy> {
        self.as_ref()
    }
}
