//! Error types for the script contract.
//!
//! Every variant funnels to the same user-visible report line; the split only
//! matters for diagnostics and tests.

use thiserror::Error;

use crate::core::types::OutputKind;

/// Invalid output configuration, detected before a script runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("CSV output type requires columns to be specified")]
    MissingColumns,
}

/// A row whose runtime shape does not match the declared output kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Row with type \"{kind}\" is not {expected}")]
pub struct EmissionShapeError {
    pub kind: OutputKind,
    pub expected: &'static str,
}

impl EmissionShapeError {
    pub fn for_kind(kind: OutputKind) -> Self {
        let expected = match kind {
            OutputKind::Text => "a string or number",
            OutputKind::Csv => "an array",
            OutputKind::Json => "an object",
        };
        Self { kind, expected }
    }

    /// A NaN or infinite number, which no output kind can represent.
    pub fn non_finite(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Text => Self {
                kind,
                expected: "a finite number",
            },
            OutputKind::Csv | OutputKind::Json => Self::for_kind(kind),
        }
    }
}

/// Any failure that ends a script run.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    EmissionShape(#[from] EmissionShapeError),

    /// Raised by the question's own logic.
    #[error("{0:#}")]
    Logic(anyhow::Error),
}

impl ScriptError {
    /// Classify an error surfaced by logic, recovering contract errors that
    /// were propagated through `anyhow` with `?`.
    pub fn from_logic(err: anyhow::Error) -> Self {
        let err = match err.downcast::<EmissionShapeError>() {
            Ok(shape) => return ScriptError::EmissionShape(shape),
            Err(err) => err,
        };
        match err.downcast::<ScriptError>() {
            Ok(script) => script,
            Err(err) => ScriptError::Logic(err),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScriptError::Configuration(_) => "configuration",
            ScriptError::EmissionShape(_) => "emission_shape",
            ScriptError::Logic(_) => "logic",
        }
    }
}
