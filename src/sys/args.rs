// src/sys/args.rs

use std::fmt;
use tokio::process::Command;

use crate::sys::secrets::MaskedValue;

/// Shown in place of every masked token when a command line is rendered.
pub const REDACTION_MARKER: &str = "****";

/// One token of an SCommand invocation.
///
/// 🛡️ Every producer has to choose a variant, so a secret can never slip into
/// the command line as a plain string by accident.
#[derive(Debug)]
pub enum Arg {
    Plain(String),
    Masked(MaskedValue),
}

impl Arg {
    pub fn is_masked(&self) -> bool {
        matches!(self, Arg::Masked(_))
    }

    /// Runs `action` on the verbatim token, secrets included.
    pub fn with_value<F, R>(&self, action: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        match self {
            Arg::Plain(value) => action(value),
            Arg::Masked(secret) => secret.use_secret(action),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Plain(value) => f.write_str(value),
            Arg::Masked(_) => f.write_str(REDACTION_MARKER),
        }
    }
}

/// Ordered argument list handed to the process launcher.
///
/// `Display` is the loggable form; `to_command` is the executable form.
#[derive(Debug, Default)]
pub struct ArgumentList {
    args: Vec<Arg>,
}

impl ArgumentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: impl Into<String>) -> &mut Self {
        self.args.push(Arg::Plain(value.into()));
        self
    }

    pub fn add_masked(&mut self, value: impl Into<MaskedValue>) -> &mut Self {
        self.args.push(Arg::Masked(value.into()));
        self
    }

    /// Appends `key=value` as a masked token without copying the secret into a
    /// plain `String` along the way.
    pub fn add_masked_pair(&mut self, key: &str, secret: &MaskedValue) -> &mut Self {
        let token = secret.use_secret(|plain| {
            let mut token = String::with_capacity(key.len() + 1 + plain.len());
            token.push_str(key);
            token.push('=');
            token.push_str(plain);
            token
        });
        self.add_masked(MaskedValue::new(token))
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.args.iter()
    }

    /// Verbatim tokens for execution. Keep the result out of any log.
    pub fn expose_all(&self) -> Vec<String> {
        self.args.iter().map(|arg| arg.with_value(str::to_owned)).collect()
    }

    /// Builds the launcher command: first token is the program, the rest are
    /// passed as discrete argv entries (no shell interpretation).
    pub fn to_command(&self) -> Option<Command> {
        let (program, rest) = self.args.split_first()?;
        let mut command = program.with_value(|program| Command::new(program));
        for arg in rest {
            arg.with_value(|value| {
                command.arg(value);
            });
        }
        Some(command)
    }
}

impl fmt::Display for ArgumentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, arg) in self.args.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", arg)?;
        }
        Ok(())
    }
}
