// src/sys/builder.rs

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ConfigurationError, Result};
use crate::sys::args::ArgumentList;
use crate::sys::install::ToolLocationCache;
use crate::sys::proxy::{is_proxy_applicable, ProxyPolicy};
use crate::sys::server::ServerDescriptor;
use crate::sys::traits::{ExecutionNode, LogSink, ProxySource, ServerRegistry, ToolInstaller};

/// Assembles the SCommand argument list for one configured server.
///
/// Owns its tool location cache, so one builder instance installs the tool at
/// most once. Create a new builder per build step.
pub struct SCommandBuilder {
    /// URL of the CloudTest server, as stored in the registry.
    url: String,
    scommand: ToolLocationCache,
}

impl SCommandBuilder {
    pub fn new(url: impl Into<String>, installer: Arc<dyn ToolInstaller>) -> Self {
        Self {
            url: url.into(),
            scommand: ToolLocationCache::new(installer),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn server<'r>(&self, registry: &'r dyn ServerRegistry) -> Option<&'r ServerDescriptor> {
        registry.lookup_server(&self.url)
    }

    /// Resolves the server, installs the tool if needed, and returns the
    /// connection and proxy arguments in launch order.
    ///
    /// Fails with a configuration error before touching the installer when
    /// the server is unknown.
    pub async fn scommand_args(
        &mut self,
        registry: &dyn ServerRegistry,
        proxy: &dyn ProxySource,
        node: &ExecutionNode,
        log: &LogSink,
    ) -> Result<ArgumentList> {
        let server = self
            .server(registry)
            .ok_or_else(|| ConfigurationError::NoServerConfigured {
                server: self.url.clone(),
            })?;

        let scommand = self.scommand.resolve(node, log).await?;

        let mut args = ArgumentList::new();
        args.add(scommand.to_string_lossy())
            .add(format!("url={}", server.as_configured()))
            .add(format!("username={}", server.username))
            .add_masked_pair("password", &server.password);

        if let Some(policy) = proxy.current_proxy_policy() {
            append_proxy_args(&mut args, policy, server.host().unwrap_or_default());
        }

        info!("SCommand invocation: {}", args);
        Ok(args)
    }
}

/// Adds the `httpproxy*` arguments when the proxy applies to `destination_host`.
pub fn append_proxy_args(args: &mut ArgumentList, policy: &ProxyPolicy, destination_host: &str) {
    if !is_proxy_applicable(policy, destination_host) {
        return;
    }
    let Some(host) = policy.proxy_host() else {
        return;
    };

    debug!("Routing SCommand traffic for {} through proxy {}", destination_host, host);
    args.add(format!("httpproxyhost={}", host));
    if let Some(port) = policy.port {
        args.add(format!("httpproxyport={}", port));
    }

    if let Some(username) = policy.proxy_username() {
        args.add(format!("httpproxyusername={}", username));
        match &policy.password {
            Some(password) => {
                args.add_masked_pair("httpproxypassword", password);
            }
            None => {
                args.add_masked("httpproxypassword=");
            }
        }
    }
}
