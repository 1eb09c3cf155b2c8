//! Summary tables for question runs across projects.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::core::types::SelfDescription;
use crate::io::host::QuestionRun;

const BASE_HEADERS: [&str; 2] = ["Project Path", "Status"];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub projects: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_runs(runs: &[QuestionRun]) -> Self {
        let succeeded = runs.iter().filter(|run| run.status.is_success()).count();
        Self {
            projects: runs.len(),
            succeeded,
            failed: runs.len() - succeeded,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Markdown table with one row per stdout line of each run.
pub fn markdown_table(runs: &[QuestionRun]) -> String {
    let headers = [BASE_HEADERS[0], BASE_HEADERS[1], "Output"];
    let mut out = String::new();
    out.push_str(&format!("| {} |\n", headers.join(" | ")));
    out.push_str(&format!("|{}\n", " --- |".repeat(headers.len())));
    for run in runs {
        let project = run.project.display().to_string();
        let status = run.status.to_string();
        for line in output_lines(run) {
            let cells = [project.as_str(), status.as_str(), line];
            let escaped: Vec<String> = cells.iter().map(|cell| cell.replace('|', "\\|")).collect();
            out.push_str(&format!("| {} |\n", escaped.join(" | ")));
        }
    }
    out
}

/// CSV table: project and status followed by the script's declared columns.
///
/// Each stdout line of a run becomes one record, split on `,`.
pub fn csv_table(info: &SelfDescription, runs: &[QuestionRun]) -> String {
    let mut headers: Vec<&str> = BASE_HEADERS.to_vec();
    if info.columns.is_empty() {
        headers.push("Output");
    } else {
        headers.extend(info.columns.iter().map(String::as_str));
    }

    let mut out = String::new();
    push_record(&mut out, &headers);
    for run in runs {
        let project = run.project.display().to_string();
        let status = run.status.to_string();
        for line in output_lines(run) {
            let mut record = vec![project.as_str(), status.as_str()];
            record.extend(line.split(','));
            push_record(&mut out, &record);
        }
    }
    out
}

/// One entry of the JSON results array.
///
/// `Output` holds stdout parsed as JSON; stdout that does not parse is kept
/// verbatim under `StdOut` instead.
#[derive(Debug, Serialize)]
struct JsonRecord<'a> {
    #[serde(rename = "Project Path")]
    project: &'a Path,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Output", skip_serializing_if = "Option::is_none")]
    output: Option<Value>,
    #[serde(rename = "StdOut", skip_serializing_if = "Option::is_none")]
    raw_stdout: Option<&'a str>,
    #[serde(rename = "StdErr", skip_serializing_if = "Option::is_none")]
    stderr: Option<&'a str>,
}

impl<'a> JsonRecord<'a> {
    fn from_run(run: &'a QuestionRun) -> Self {
        let (output, raw_stdout) = match serde_json::from_str::<Value>(&run.stdout) {
            Ok(parsed) => (Some(parsed), None),
            Err(_) => (None, Some(run.stdout.as_str())),
        };
        Self {
            project: &run.project,
            status: run.status.to_string(),
            output,
            raw_stdout,
            stderr: Some(run.stderr.as_str()).filter(|text| !text.trim().is_empty()),
        }
    }
}

/// Pretty-printed JSON array with one entry per run.
pub fn json_table(runs: &[QuestionRun]) -> Result<String> {
    let records: Vec<JsonRecord<'_>> = runs.iter().map(JsonRecord::from_run).collect();
    let mut out = serde_json::to_string_pretty(&records).context("serialize json results")?;
    out.push('\n');
    Ok(out)
}

/// Stdout lines of a run; an empty output still yields one (empty) line.
fn output_lines(run: &QuestionRun) -> Vec<&str> {
    if run.stdout.is_empty() {
        return vec![""];
    }
    run.stdout.lines().collect()
}

fn push_record(out: &mut String, fields: &[&str]) {
    let quoted: Vec<String> = fields.iter().map(|field| csv_field(field)).collect();
    out.push_str(&quoted.join(","));
    out.push('\n');
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
