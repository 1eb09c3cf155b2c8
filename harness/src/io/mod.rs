//! I/O helpers: manifest and file lookups for question logic, process
//! plumbing for hosts.

pub mod config;
pub mod host;
pub mod lookup;
pub mod process;
pub mod registry;
