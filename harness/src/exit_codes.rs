//! Stable exit codes for question scripts and harness CLI commands.

/// Script succeeded, printed its self-description, or every project run succeeded.
pub const OK: i32 = 0;
/// Invalid configuration, script failure, or at least one failed project run.
pub const FAILED: i32 = 1;
