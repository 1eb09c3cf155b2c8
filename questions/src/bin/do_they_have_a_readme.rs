//! Does the project have a README?

use std::process::ExitCode;

use anyhow::Context;

fn main() -> ExitCode {
    harness::execute(questions::readme_config(), |_| {
        let root = std::env::current_dir().context("read current directory")?;
        Ok(questions::has_readme(&root))
    })
}
