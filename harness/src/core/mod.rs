//! Deterministic, pure logic for the script contract.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values and return deterministic outputs suitable for tests.

pub mod error;
pub mod presence;
pub mod row;
pub mod types;
