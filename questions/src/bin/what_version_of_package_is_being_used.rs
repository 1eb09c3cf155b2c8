//! What version of a package is being used?
//!
//! Usage: `what-version-of-package-is-being-used <package>`

use std::process::ExitCode;

use harness::DependencyRegistry;

fn main() -> ExitCode {
    let registry = DependencyRegistry::from_env();
    harness::execute(questions::package_version_config(), |out| {
        questions::package_version(&registry, out.args())
    })
}
