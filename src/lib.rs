//! Builds SCommand invocations: server connection settings plus the network
//! proxy policy, with the tool installed at most once per builder.

pub mod config;
pub mod error;
pub mod sys;

pub use crate::error::{BuildError, ConfigurationError, InstallationError};
pub use crate::sys::args::{Arg, ArgumentList, REDACTION_MARKER};
pub use crate::sys::builder::SCommandBuilder;
pub use crate::sys::install::{NodeToolInstaller, ToolLocationCache};
pub use crate::sys::proxy::{is_proxy_applicable, NoProxyPatterns, ProxyPolicy};
pub use crate::sys::secrets::MaskedValue;
pub use crate::sys::server::{InMemoryServerRegistry, ServerDescriptor};
pub use crate::sys::traits::{ExecutionNode, LogSink, ProxySource, ServerRegistry, ToolInstaller};
