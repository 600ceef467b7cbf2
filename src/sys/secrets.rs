// src/sys/secrets.rs

use secrecy::{ExposeSecret, Secret};
use std::fmt;

/// MaskedValue holds a password (server or proxy) for the lifetime of one
/// build step.
///
/// 1. It cannot be accidentally logged (`{:?}` prints `[REDACTED]`).
/// 2. The backing `String` is zeroized when the value is dropped.
pub struct MaskedValue {
    value: Secret<String>,
}

impl MaskedValue {
    /// Takes ownership of the plaintext so no second copy is left behind.
    pub fn new(raw: String) -> Self {
        Self {
            value: Secret::new(raw),
        }
    }

    /// Lends the plaintext to `action`. The borrow cannot escape the closure.
    pub fn use_secret<F, R>(&self, action: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        action(self.value.expose_secret())
    }

    pub fn is_empty(&self) -> bool {
        self.use_secret(str::is_empty)
    }

    /// Copies the plaintext into a fresh `MaskedValue`.
    pub fn duplicate(&self) -> Self {
        Self::new(self.use_secret(str::to_owned))
    }
}

impl fmt::Debug for MaskedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MaskedValue([REDACTED])")
    }
}

impl From<String> for MaskedValue {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for MaskedValue {
    fn from(raw: &str) -> Self {
        Self::new(raw.to_owned())
    }
}
