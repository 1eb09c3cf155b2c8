//! Test-only helpers for running scripts and building project fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::types::ScriptConfig;
use crate::script::{Emitter, RunOptions, ScriptOutcome, run};

/// Owned argument list from string literals.
pub fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Run `logic` with captured output and no arguments.
///
/// Panics if the configuration is invalid.
pub fn run_captured<F, R>(config: &ScriptConfig, logic: F) -> ScriptOutcome
where
    F: FnOnce(&mut Emitter<'_>) -> anyhow::Result<R>,
    R: Serialize,
{
    run(config, &[], &RunOptions::captured(), logic).expect("valid script config")
}

/// Write `package.json` with `contents` into `dir`, returning its path.
pub fn write_manifest(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("package.json");
    fs::write(&path, contents).expect("write package.json");
    path
}

/// Temporary project directory populated with `(relative path, contents)` files.
pub fn project_with_files(files: &[(&str, &str)]) -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    for (rel, contents) in files {
        let path = temp.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, contents).expect("write fixture file");
    }
    temp
}
