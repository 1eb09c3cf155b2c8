//! Question logic shared by the question binaries.
//!
//! Each binary in `src/bin` declares its output configuration and hands one of
//! these functions to [`harness::execute`]. Keeping the logic here lets tests
//! drive it through [`harness::run`] with captured output.

use std::path::Path;

use anyhow::{Result, anyhow, bail};
use harness::io::lookup;
use harness::{DependencyRegistry, Emitter, ScriptConfig};
use serde_json::Value;
use tracing::debug;

/// Frameworks recognised in `devDependencies`, in priority order.
const TEST_FRAMEWORKS: [(&str, &str); 3] = [
    ("jest", "Jest"),
    ("mocha", "Mocha"),
    ("@testing-library", "Testing Library"),
];

pub fn readme_config() -> ScriptConfig {
    ScriptConfig::text()
}

/// `Yes` if the project root has a `README.md`.
pub fn has_readme(root: &Path) -> &'static str {
    if root.join("README.md").is_file() {
        "Yes"
    } else {
        "No"
    }
}

pub fn package_version_config() -> ScriptConfig {
    ScriptConfig::text()
}

/// Version of the package named by the first argument, from runtime then dev dependencies.
///
/// Unknown packages produce no output.
pub fn package_version(registry: &DependencyRegistry, args: &[String]) -> Result<Option<String>> {
    let name = args
        .iter()
        .find(|arg| !arg.starts_with("--"))
        .ok_or_else(|| anyhow!("expected a package name argument"))?;
    let version = registry
        .dependency(name)
        .or_else(|| registry.dev_dependency(name));
    debug!(package = %name, found = version.is_some(), "package lookup");
    Ok(version)
}

pub fn test_framework_config() -> ScriptConfig {
    ScriptConfig::csv(["framework", "version"])
}

/// `[framework, version]` of the first known test framework, or `N/A,N/A`.
pub fn test_framework(registry: &DependencyRegistry) -> [String; 2] {
    for (package, label) in TEST_FRAMEWORKS {
        if let Some(version) = registry.dev_dependency(package) {
            return [label.to_string(), version];
        }
    }
    ["N/A".to_string(), "N/A".to_string()]
}

pub fn dependencies_config() -> ScriptConfig {
    ScriptConfig::csv(["name", "version", "section"])
}

/// Emit one `name,version,section` row per declared dependency.
pub fn emit_dependencies(registry: &DependencyRegistry, out: &mut Emitter<'_>) -> Result<()> {
    let sections = [
        ("dependencies", registry.get_dependencies()),
        ("devDependencies", registry.get_dev_dependencies()),
        ("peerDependencies", registry.get_peer_dependencies()),
    ];
    for (section, entries) in sections {
        for (name, version) in entries {
            out.emit([name, version, section.to_string()])?;
        }
    }
    Ok(())
}

pub fn compiler_options_config() -> ScriptConfig {
    ScriptConfig::json()
}

/// `compilerOptions` object from `tsconfig.json` in the project root.
pub fn compiler_options(root: &Path) -> Result<Value> {
    let path = root.join("tsconfig.json");
    match lookup::value(&path, "compilerOptions") {
        Some(options @ Value::Object(_)) => Ok(options),
        Some(_) => bail!("compilerOptions in {} is not an object", path.display()),
        None => bail!("compiler options not found in {}", path.display()),
    }
}
