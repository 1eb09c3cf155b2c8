//! List every declared dependency as `name,version,section`.

use std::process::ExitCode;

use harness::DependencyRegistry;

fn main() -> ExitCode {
    let registry = DependencyRegistry::from_env();
    harness::execute(questions::dependencies_config(), |out| {
        questions::emit_dependencies(&registry, out)
    })
}
