// 🛡️ Collaborator contracts live in traits; everything else is a concrete piece of the build step.

pub mod traits;     // Installer, registry and proxy-store contracts
pub mod secrets;    // Memory hygiene (MaskedValue)
pub mod args;       // Plain/masked argument tokens
pub mod proxy;      // Proxy policy & no-proxy matching
pub mod server;     // Server descriptors & registry
pub mod install;    // Tool location cache & node installer
pub mod builder;    // SCommand argument assembly
