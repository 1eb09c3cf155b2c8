//! Host side of the script contract: probing and running question scripts.
//!
//! A question script is an external command (argv). The host asks it for its
//! self-description with `--info`, then runs it once per project directory
//! and records what it printed.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::core::types::{INFO_FLAG, SelfDescription};
use crate::io::config::HarnessConfig;
use crate::io::process::{CommandLimits, command_from_argv, run_command_with_timeout};
use crate::io::registry::MANIFEST_ENV;

/// How a question run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed { exit_code: Option<i32> },
    TimedOut,
}

impl RunStatus {
    pub fn is_success(self) -> bool {
        matches!(self, RunStatus::Success)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => f.write_str("Success"),
            RunStatus::Failed {
                exit_code: Some(code),
            } => write!(f, "Failed (exit code {code})"),
            RunStatus::Failed { exit_code: None } => f.write_str("Failed"),
            RunStatus::TimedOut => f.write_str("Timed out"),
        }
    }
}

/// Output of one question script in one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRun {
    pub project: PathBuf,
    pub status: RunStatus,
    /// Trimmed stdout.
    pub stdout: String,
    /// Trimmed stderr.
    pub stderr: String,
}

/// Ask a question script for its self-description.
#[instrument(skip_all, fields(program = ?command.first()))]
pub fn describe_script(command: &[String], limits: CommandLimits) -> Result<SelfDescription> {
    let mut cmd = command_from_argv(command)?;
    cmd.arg(INFO_FLAG);
    let output = run_command_with_timeout(cmd, limits).context("run script with --info")?;
    if output.timed_out {
        return Err(anyhow!("script --info timed out after {:?}", limits.timeout));
    }
    if !output.status.success() {
        return Err(anyhow!(
            "script --info failed with status {:?}: {}",
            output.status.code(),
            output.stderr_text().trim()
        ));
    }
    let info = parse_self_description(&output.stdout_text())?;
    debug!(output = %info.output, columns = info.columns.len(), "script described");
    Ok(info)
}

/// Parse the single `--info` line printed by a question script.
pub fn parse_self_description(stdout: &str) -> Result<SelfDescription> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| anyhow!("script printed no self-description"))?;
    serde_json::from_str(line).context("parse script self-description")
}

/// Run a question script inside `project_dir` with question-specific `args`.
///
/// The configured manifest path is passed to the script through
/// [`MANIFEST_ENV`]. A non-zero exit or timeout is recorded in the returned
/// status; only a failure to launch the script is an error.
#[instrument(skip_all, fields(project = %project_dir.display()))]
pub fn run_question(
    command: &[String],
    project_dir: &Path,
    args: &[String],
    config: &HarnessConfig,
) -> Result<QuestionRun> {
    let limits = config.limits();
    let mut cmd = command_from_argv(command)?;
    cmd.args(args)
        .current_dir(project_dir)
        .env(MANIFEST_ENV, &config.manifest_path);
    info!("running question");

    let output = run_command_with_timeout(cmd, limits)
        .with_context(|| format!("run question in {}", project_dir.display()))?;

    let status = if output.timed_out {
        warn!(timeout_secs = limits.timeout.as_secs(), "question timed out");
        RunStatus::TimedOut
    } else if output.status.success() {
        RunStatus::Success
    } else {
        debug!(exit_code = ?output.status.code(), "question failed");
        RunStatus::Failed {
            exit_code: output.status.code(),
        }
    };

    Ok(QuestionRun {
        project: project_dir.to_path_buf(),
        status,
        stdout: output.stdout_text().trim().to_string(),
        stderr: output.stderr_text().trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::OutputKind;

    #[test]
    fn parses_self_description_line() {
        let info =
            parse_self_description("\n{\"version\":\"1.0.0\",\"output\":\"json\",\"columns\":[]}\n")
                .expect("parse");
        assert_eq!(info.output, OutputKind::Json);
        assert!(info.columns.is_empty());
    }

    #[test]
    fn rejects_empty_self_description() {
        let err = parse_self_description("  \n").unwrap_err();
        assert!(err.to_string().contains("no self-description"));
    }

    #[test]
    fn status_labels() {
        assert_eq!(RunStatus::Success.to_string(), "Success");
        assert_eq!(
            RunStatus::Failed { exit_code: Some(1) }.to_string(),
            "Failed (exit code 1)"
        );
        assert_eq!(RunStatus::TimedOut.to_string(), "Timed out");
    }

    #[cfg(unix)]
    #[test]
    fn describe_script_appends_info_flag() {
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            r#"[ "$1" = "--info" ] && echo '{"version":"1.0.0","output":"csv","columns":["a"]}'"#
                .to_string(),
            "question".to_string(),
        ];
        let info = describe_script(&command, CommandLimits::default()).expect("describe");
        assert_eq!(info.output, OutputKind::Csv);
        assert_eq!(info.columns, vec!["a"]);
    }

    #[cfg(unix)]
    #[test]
    fn run_question_uses_project_dir_and_records_failures() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("README.md"), "# hi").expect("write");

        let ok = run_question(
            &["sh".to_string(), "-c".to_string(), "ls".to_string()],
            temp.path(),
            &[],
            &HarnessConfig::default(),
        )
        .expect("run");
        assert_eq!(ok.status, RunStatus::Success);
        assert_eq!(ok.stdout, "README.md");

        let failed = run_question(
            &[
                "sh".to_string(),
                "-c".to_string(),
                "echo boom >&2; exit 1".to_string(),
            ],
            temp.path(),
            &[],
            &HarnessConfig::default(),
        )
        .expect("run");
        assert_eq!(failed.status, RunStatus::Failed { exit_code: Some(1) });
        assert_eq!(failed.stderr, "boom");
    }

    #[cfg(unix)]
    #[test]
    fn run_question_passes_manifest_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = HarnessConfig {
            manifest_path: PathBuf::from("web/package.json"),
            ..HarnessConfig::default()
        };
        let run = run_question(
            &[
                "sh".to_string(),
                "-c".to_string(),
                "echo \"$HARNESS_MANIFEST\"".to_string(),
            ],
            temp.path(),
            &[],
            &config,
        )
        .expect("run");
        assert_eq!(run.stdout, "web/package.json");
    }
}
