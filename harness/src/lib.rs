//! Execution contract for project question scripts.
//!
//! A question script answers one question about a project ("does it have a
//! README?") and prints its answer as text, CSV rows or JSON records. This
//! crate provides both sides of that contract:
//!
//! - **[`core`]**: Pure, deterministic logic (output kinds, configuration
//!   validation, row shape checks and encodings, error taxonomy).
//! - **[`script`]**: The runner every question script calls: `--info`
//!   handling, the emit/return calling convention, error reporting.
//! - **[`io`]**: Side-effecting helpers: the dependency manifest registry and
//!   file lookups used by question logic, plus process plumbing used by hosts.
//!
//! [`report`] renders host-side results as tables.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod report;
pub mod script;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::error::{ConfigurationError, EmissionShapeError, ScriptError};
pub use crate::core::types::{OutputKind, ScriptConfig, SelfDescription};
pub use crate::io::registry::DependencyRegistry;
pub use crate::script::{Emitter, RunOptions, ScriptOutcome, execute, run};
