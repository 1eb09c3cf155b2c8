use std::process::ExitCode;

use harness::DependencyRegistry;

fn main() -> ExitCode {
    let registry = DependencyRegistry::from_env();
    harness::execute(questions::test_framework_config(), |_| {
        Ok(questions::test_framework(&registry))
    })
}
