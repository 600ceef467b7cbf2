//! Error types for the SCommand builder

use std::path::PathBuf;
use thiserror::Error;

/// The system configuration cannot produce an invocation.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// No server registered under the builder's URL
    #[error("No server is configured for '{server}' in the system configuration.")]
    NoServerConfigured { server: String },

    #[error("Missing required setting: {0}")]
    MissingVariable(&'static str),

    #[error("Invalid server URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid proxy host: {0}")]
    InvalidProxyHost(String),

    /// A no-proxy pattern did not compile
    #[error("Invalid no-proxy pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to load server registry: {0}")]
    Registry(String),
}

/// The tool could not be materialised on the execution node.
#[derive(Error, Debug)]
pub enum InstallationError {
    #[error("SCommand not found on node '{node}' at {path}")]
    NotFound { node: String, path: PathBuf },

    #[error("SCommand at {0} is not executable")]
    NotExecutable(PathBuf),

    #[error("Installation I/O failure on node '{node}': {source}")]
    Io {
        node: String,
        #[source]
        source: std::io::Error,
    },

    /// The installer refused the request (e.g. unsupported node)
    #[error("Installer rejected node '{node}': {reason}")]
    Rejected { node: String, reason: String },
}

/// Anything that aborts argument assembly for a build step.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Installation(#[from] InstallationError),
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;
