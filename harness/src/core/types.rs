//! Shared deterministic types for the script contract.
//!
//! These types define the stable contract between a question script and the
//! host that runs it. They must not depend on external state or I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigurationError;

/// Version string reported in every self-description.
pub const CONTRACT_VERSION: &str = "1.0.0";

/// Argument that asks a script to describe itself instead of running.
pub const INFO_FLAG: &str = "--info";

/// Declared output encoding of a question script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Text,
    Csv,
    Json,
}

impl OutputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputKind::Text => "text",
            OutputKind::Csv => "csv",
            OutputKind::Json => "json",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output configuration a script declares before running.
///
/// `columns` is only meaningful for [`OutputKind::Csv`], where it is required
/// and must be non-empty. Construction does not validate; [`ScriptConfig::validate`]
/// is called by the runner before anything else happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptConfig {
    #[serde(rename = "type")]
    pub kind: OutputKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
}

impl ScriptConfig {
    pub fn new(kind: OutputKind, columns: Vec<String>) -> Self {
        Self { kind, columns }
    }

    pub fn text() -> Self {
        Self::new(OutputKind::Text, Vec::new())
    }

    pub fn json() -> Self {
        Self::new(OutputKind::Json, Vec::new())
    }

    pub fn csv<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            OutputKind::Csv,
            columns.into_iter().map(Into::into).collect(),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.kind == OutputKind::Csv && self.columns.is_empty() {
            return Err(ConfigurationError::MissingColumns);
        }
        Ok(())
    }

    /// Self-description for this configuration.
    pub fn describe(&self) -> SelfDescription {
        let columns = match self.kind {
            OutputKind::Csv => self.columns.clone(),
            OutputKind::Text | OutputKind::Json => Vec::new(),
        };
        SelfDescription {
            version: CONTRACT_VERSION.to_string(),
            output: self.kind,
            columns,
        }
    }
}

/// Machine-readable description of a script's output contract (`--info`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfDescription {
    pub version: String,
    pub output: OutputKind,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// True if `args` requests a self-description.
pub fn wants_info<S: AsRef<str>>(args: &[S]) -> bool {
    args.iter().any(|arg| arg.as_ref() == INFO_FLAG)
}
