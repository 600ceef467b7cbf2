// src/sys/install.rs

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

use crate::error::InstallationError;
use crate::sys::traits::{ExecutionNode, LogSink, NodePlatform, ToolInstaller};

// ==============================================================================
// 1. Location Cache
// ==============================================================================

/// Remembers where the tool lives for the lifetime of one builder.
///
/// A builder can be asked for arguments several times within one build step
/// (once per composition, say); the installer runs on the first call only.
/// The slot is written once and never invalidated. The cache is owned by a
/// single builder that runs on one build thread and is never shared across
/// concurrent executions, so `&mut self` is all the synchronisation it needs.
pub struct ToolLocationCache {
    installer: Arc<dyn ToolInstaller>,
    location: Option<PathBuf>,
}

impl ToolLocationCache {
    pub fn new(installer: Arc<dyn ToolInstaller>) -> Self {
        Self {
            installer,
            location: None,
        }
    }

    /// Returns the cached path, installing on `node` first if the slot is empty.
    /// Once filled, `node` and `log` are ignored.
    pub async fn resolve(&mut self, node: &ExecutionNode, log: &LogSink) -> Result<PathBuf, InstallationError> {
        if let Some(path) = &self.location {
            debug!("SCommand location cached at {}", path.display());
            return Ok(path.clone());
        }

        let path = self.installer.install(node, log).await?;
        info!("SCommand resolved on node '{}' at {}", node.name, path.display());
        self.location = Some(path.clone());
        Ok(path)
    }

    pub fn cached(&self) -> Option<&PathBuf> {
        self.location.as_ref()
    }
}

// ==============================================================================
// 2. Node-Local Installer
// ==============================================================================

/// Locates SCommand under `<node root>/tools/scommand/bin`.
/// Fetching the distribution onto the node is handled upstream.
pub struct NodeToolInstaller {
    tool_dir: PathBuf,
}

impl NodeToolInstaller {
    pub fn new() -> Self {
        Self {
            tool_dir: PathBuf::from("tools").join("scommand"),
        }
    }

    /// Overrides the tool directory, relative to the node root.
    pub fn with_tool_dir(tool_dir: impl Into<PathBuf>) -> Self {
        Self { tool_dir: tool_dir.into() }
    }

    pub fn executable_path(&self, node: &ExecutionNode) -> PathBuf {
        let file = match node.platform {
            NodePlatform::Unix => "scommand",
            NodePlatform::Windows => "scommand.bat",
        };
        node.root.join(&self.tool_dir).join("bin").join(file)
    }
}

impl Default for NodeToolInstaller {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolInstaller for NodeToolInstaller {
    async fn install(&self, node: &ExecutionNode, log: &LogSink) -> Result<PathBuf, InstallationError> {
        if node.root.as_os_str().is_empty() {
            return Err(InstallationError::Rejected {
                node: node.name.clone(),
                reason: "node has no root directory".into(),
            });
        }

        let path = self.executable_path(node);
        let _ = log
            .send(format!("Locating SCommand on {} at {}\n", node.name, path.display()))
            .await;

        let metadata = match fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(InstallationError::NotFound {
                    node: node.name.clone(),
                    path,
                });
            }
            Err(source) => {
                return Err(InstallationError::Io {
                    node: node.name.clone(),
                    source,
                });
            }
        };

        if !metadata.is_file() {
            return Err(InstallationError::NotExecutable(path));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if node.platform == NodePlatform::Unix && metadata.permissions().mode() & 0o111 == 0 {
                return Err(InstallationError::NotExecutable(path));
            }
        }

        let _ = log.send(format!("SCommand ready: {}\n", path.display())).await;
        Ok(path)
    }
}
