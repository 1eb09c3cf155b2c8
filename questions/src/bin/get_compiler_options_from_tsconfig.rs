use std::process::ExitCode;

use anyhow::Context;

fn main() -> ExitCode {
    harness::execute(questions::compiler_options_config(), |_| {
        let root = std::env::current_dir().context("read current directory")?;
        questions::compiler_options(&root)
    })
}
