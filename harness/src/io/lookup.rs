//! Field lookup in project files.
//!
//! JSON files are addressed with a dot-separated key path
//! (`dependencies.typescript.version`). XML files only support extracting the
//! text of the first element with a given tag name.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Read `accessor` from the file at `path`.
///
/// Returns `None` if the field is missing or the file cannot be read or parsed.
pub fn value(path: &Path, accessor: &str) -> Option<Value> {
    match read_value(path, accessor) {
        Ok(found) => found,
        Err(err) => {
            let reason = format!("{err:#}");
            debug!(path = %path.display(), err = %reason, "failed to read value");
            None
        }
    }
}

fn read_value(path: &Path, accessor: &str) -> Result<Option<Value>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "json" => {
            let contents = read(path)?;
            let document: Value = serde_json::from_str(&contents)
                .with_context(|| format!("parse {}", path.display()))?;
            Ok(nested_value(&document, accessor).cloned())
        }
        "xml" => {
            let contents = read(path)?;
            Ok(xml_tag_text(&contents, accessor)?.map(Value::String))
        }
        other => bail!("unsupported file type: {other:?}"),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// Follow a dot-separated key path. Numeric segments index into arrays.
pub fn nested_value<'a>(document: &'a Value, accessor: &str) -> Option<&'a Value> {
    accessor
        .split('.')
        .try_fold(document, |current, key| match current {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|idx| items.get(idx)),
            _ => None,
        })
        .filter(|found| !found.is_null())
}

/// Trimmed text of the first `<tag ...>...</tag>` element.
pub fn xml_tag_text(contents: &str, tag: &str) -> Result<Option<String>> {
    let escaped = regex::escape(tag);
    let pattern = format!(r"(?s)<{escaped}(?:\s[^>]*)?>(.*?)</{escaped}>");
    let re = Regex::new(&pattern).map_err(|err| anyhow!("invalid tag {tag:?}: {err}"))?;
    Ok(re
        .captures(contents)
        .and_then(|caps| caps.get(1))
        .map(|text| text.as_str().trim().to_string()))
}
