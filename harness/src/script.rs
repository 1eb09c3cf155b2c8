//! Script execution contract.
//!
//! A question script declares a [`ScriptConfig`] and a unit of logic. [`run`]
//! validates the configuration, answers `--info` without running the logic,
//! and otherwise drives the logic through an [`Emitter`], encoding every row
//! according to the declared [`OutputKind`].
//!
//! Logic uses the hybrid calling convention: it may push any number of rows
//! through [`Emitter::emit`] and may also return one terminal value, which is
//! emitted last unless it is void (`()`, `None`).
//!
//! [`run`] never terminates the process. It returns a [`ScriptOutcome`] and the
//! caller decides; [`execute`] is the entry point for real question binaries.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::core::error::{ConfigurationError, EmissionShapeError, ScriptError};
use crate::core::presence::{Presence, presence};
use crate::core::row::encode_row;
use crate::core::types::{OutputKind, ScriptConfig, wants_info};
use crate::exit_codes;
use crate::logging;

/// Prefix of the single stderr line written when a run fails.
pub const ERROR_PREFIX: &str = "[ERROR] Script execution failed: ";

/// Controls where script output goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Collect stdout/stderr lines in memory instead of writing to the real streams.
    pub capture_output: bool,
}

impl RunOptions {
    pub fn captured() -> Self {
        Self {
            capture_output: true,
        }
    }
}

/// Result of a single script run.
///
/// `stdout`/`stderr` are only populated when output was captured.
#[derive(Debug)]
pub struct ScriptOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Rows successfully written, including a terminal value.
    pub rows_emitted: usize,
    pub failure: Option<ScriptError>,
}

impl ScriptOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == exit_codes::OK
    }

    pub fn process_exit_code(&self) -> ExitCode {
        to_exit_code(self.exit_code)
    }
}

enum Stream {
    Stdout,
    Stderr,
    Captured(Vec<u8>),
}

impl Stream {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self {
            Stream::Stdout => {
                let mut handle = io::stdout().lock();
                writeln!(handle, "{line}")?;
                handle.flush()
            }
            Stream::Stderr => {
                let mut handle = io::stderr().lock();
                writeln!(handle, "{line}")?;
                handle.flush()
            }
            Stream::Captured(buf) => {
                buf.extend_from_slice(line.as_bytes());
                buf.push(b'\n');
                Ok(())
            }
        }
    }

    fn into_captured(self) -> String {
        match self {
            Stream::Captured(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Stream::Stdout | Stream::Stderr => String::new(),
        }
    }
}

struct Console {
    out: Stream,
    err: Stream,
}

impl Console {
    fn new(options: &RunOptions) -> Self {
        if options.capture_output {
            Self {
                out: Stream::Captured(Vec::new()),
                err: Stream::Captured(Vec::new()),
            }
        } else {
            Self {
                out: Stream::Stdout,
                err: Stream::Stderr,
            }
        }
    }

    fn report(&mut self, err: &ScriptError) {
        let line = error_line(err);
        if let Err(write_err) = self.err.write_line(&line) {
            warn!(err = %write_err, "failed to write error report");
        }
    }
}

/// Emission handle passed to script logic.
pub struct Emitter<'a> {
    kind: OutputKind,
    args: &'a [String],
    console: &'a mut Console,
    rows: usize,
    failed: Option<EmissionShapeError>,
}

impl<'a> Emitter<'a> {
    /// Invocation arguments, opaque to the runner.
    pub fn args(&self) -> &'a [String] {
        self.args
    }

    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    /// Rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Validate `row` against the declared kind and write it as one output record.
    ///
    /// A shape failure is latched: the run fails even if the caller drops the
    /// returned error, and every later emission is refused.
    pub fn emit<T: Serialize>(&mut self, row: T) -> Result<(), ScriptError> {
        self.check_latched()?;
        match presence(&row) {
            Presence::Void => Err(self.latch(EmissionShapeError::for_kind(self.kind))),
            Presence::NonFinite => Err(self.latch(EmissionShapeError::non_finite(self.kind))),
            Presence::Present => self.emit_serialized(&row),
        }
    }

    fn emit_serialized<T: Serialize>(&mut self, row: &T) -> Result<(), ScriptError> {
        let value = match serde_json::to_value(row) {
            Ok(value) => value,
            Err(err) => {
                debug!(err = %err, "row failed to serialize");
                return Err(self.latch(EmissionShapeError::for_kind(self.kind)));
            }
        };
        self.emit_value(&value)
    }

    fn emit_value(&mut self, value: &Value) -> Result<(), ScriptError> {
        self.check_latched()?;
        let encoded = match encode_row(self.kind, value) {
            Ok(encoded) => encoded,
            Err(err) => return Err(self.latch(err)),
        };
        self.console
            .out
            .write_line(&encoded)
            .context("write row")
            .map_err(ScriptError::Logic)?;
        self.rows += 1;
        Ok(())
    }

    fn check_latched(&self) -> Result<(), ScriptError> {
        match &self.failed {
            Some(failed) => Err(ScriptError::EmissionShape(failed.clone())),
            None => Ok(()),
        }
    }

    fn latch(&mut self, err: EmissionShapeError) -> ScriptError {
        debug!(kind = %self.kind, rows = self.rows, "row shape mismatch");
        self.failed.get_or_insert(err).clone().into()
    }
}

/// Run script `logic` under `config`.
///
/// Returns `Err` only for an invalid configuration, before any output is
/// written. Every other failure is reported on stderr and reflected in the
/// outcome's exit code.
#[instrument(skip_all, fields(kind = %config.kind, capture = options.capture_output))]
pub fn run<F, R>(
    config: &ScriptConfig,
    args: &[String],
    options: &RunOptions,
    logic: F,
) -> Result<ScriptOutcome, ConfigurationError>
where
    F: FnOnce(&mut Emitter<'_>) -> anyhow::Result<R>,
    R: Serialize,
{
    config.validate()?;
    let mut console = Console::new(options);

    if wants_info(args) {
        debug!("writing self-description");
        let written = serde_json::to_string(&config.describe())
            .context("serialize self-description")
            .and_then(|line| console.out.write_line(&line).context("write self-description"));
        let failure = written.err().map(ScriptError::Logic);
        if let Some(err) = &failure {
            console.report(err);
        }
        return Ok(finish(console, 0, failure));
    }

    let mut emitter = Emitter {
        kind: config.kind,
        args,
        console: &mut console,
        rows: 0,
        failed: None,
    };
    let result = match logic(&mut emitter) {
        Ok(terminal) => complete(&mut emitter, terminal),
        Err(err) => Err(ScriptError::from_logic(err)),
    };
    let rows = emitter.rows;

    if let Err(err) = &result {
        debug!(class = err.label(), rows, "script failed");
        console.report(err);
    } else {
        debug!(rows, "script completed");
    }
    Ok(finish(console, rows, result.err()))
}

fn complete<R: Serialize>(emitter: &mut Emitter<'_>, terminal: R) -> Result<(), ScriptError> {
    emitter.check_latched()?;
    if presence(&terminal) == Presence::Void {
        return Ok(());
    }
    emitter.emit(terminal)
}

fn finish(console: Console, rows: usize, failure: Option<ScriptError>) -> ScriptOutcome {
    let exit_code = if failure.is_some() {
        exit_codes::FAILED
    } else {
        exit_codes::OK
    };
    ScriptOutcome {
        exit_code,
        stdout: console.out.into_captured(),
        stderr: console.err.into_captured(),
        rows_emitted: rows,
        failure,
    }
}

/// The stderr line reported for a failed run.
pub fn error_line(err: &ScriptError) -> String {
    format!("{ERROR_PREFIX}{err}")
}

/// Process entry point for question binaries.
///
/// Reads invocation arguments, writes to the real standard streams and maps
/// every failure, including an invalid configuration, to exit code 1.
pub fn execute<F, R>(config: ScriptConfig, logic: F) -> ExitCode
where
    F: FnOnce(&mut Emitter<'_>) -> anyhow::Result<R>,
    R: Serialize,
{
    logging::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&config, &args, &RunOptions::default(), logic) {
        Ok(outcome) => outcome.process_exit_code(),
        Err(err) => {
            eprintln!("{}", error_line(&ScriptError::from(err)));
            to_exit_code(exit_codes::FAILED)
        }
    }
}

fn to_exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{args, run_captured};
    use anyhow::bail;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn csv_without_columns_fails_before_logic() {
        let called = Cell::new(false);
        for cfg in [
            ScriptConfig::csv(Vec::<String>::new()),
            ScriptConfig::new(OutputKind::Csv, Vec::new()),
        ] {
            let err = run(&cfg, &[], &RunOptions::captured(), |_| {
                called.set(true);
                Ok(json!([]))
            })
            .unwrap_err();
            assert_eq!(err, ConfigurationError::MissingColumns);
        }
        assert!(!called.get());
    }

    #[test]
    fn configuration_checked_before_info() {
        let err = run(
            &ScriptConfig::csv(Vec::<String>::new()),
            &args(&["--info"]),
            &RunOptions::captured(),
            |_| Ok(()),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "CSV output type requires columns to be specified"
        );
    }

    #[test]
    fn info_prints_description_without_running_logic() {
        let called = Cell::new(false);
        let outcome = run(
            &ScriptConfig::csv(["name", "version"]),
            &args(&["typescript", "--info"]),
            &RunOptions::captured(),
            |_| {
                called.set(true);
                Ok(())
            },
        )
        .expect("run");

        assert!(!called.get());
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.rows_emitted, 0);
        assert_eq!(
            outcome.stdout,
            "{\"version\":\"1.0.0\",\"output\":\"csv\",\"columns\":[\"name\",\"version\"]}\n"
        );
        let parsed: Value = serde_json::from_str(outcome.stdout.trim()).expect("json");
        assert_eq!(
            parsed,
            json!({"version": "1.0.0", "output": "csv", "columns": ["name", "version"]})
        );
    }

    #[test]
    fn info_for_text_reports_empty_columns() {
        let outcome = run(
            &ScriptConfig::text(),
            &args(&["--info"]),
            &RunOptions::captured(),
            |_| -> anyhow::Result<()> { bail!("must not run") },
        )
        .expect("run");
        assert_eq!(
            outcome.stdout,
            "{\"version\":\"1.0.0\",\"output\":\"text\",\"columns\":[]}\n"
        );
        assert!(outcome.stderr.is_empty());
    }

    #[test]
    fn returned_text_is_emitted_once() {
        let outcome = run_captured(&ScriptConfig::text(), |_| Ok("Yes"));
        assert_eq!(outcome.stdout, "Yes\n");
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.rows_emitted, 1);
    }

    #[test]
    fn emitted_text_row() {
        let outcome = run_captured(&ScriptConfig::text(), |out| {
            out.emit("test string")?;
            Ok(())
        });
        assert_eq!(outcome.stdout, "test string\n");
    }

    #[test]
    fn returned_csv_row() {
        let outcome = run_captured(&ScriptConfig::csv(["name", "version"]), |_| {
            Ok(["some-name", "some-version"])
        });
        assert_eq!(outcome.stdout, "some-name,some-version\n");
    }

    #[test]
    fn emitted_csv_rows_keep_order() {
        let outcome = run_captured(&ScriptConfig::csv(["col1", "col2"]), |out| {
            out.emit(["row1", "row2"])?;
            out.emit(["row3", "row4"])?;
            Ok(())
        });
        assert_eq!(outcome.stdout, "row1,row2\nrow3,row4\n");
        assert_eq!(outcome.rows_emitted, 2);
    }

    #[test]
    fn emitted_json_row_is_pretty_printed() {
        let outcome = run_captured(&ScriptConfig::json(), |out| {
            out.emit(json!({"key": "value"}))?;
            Ok(())
        });
        assert_eq!(outcome.stdout, "{\n  \"key\": \"value\"\n}\n");
    }

    #[test]
    fn multiple_json_rows_are_not_wrapped_in_an_array() {
        let outcome = run_captured(&ScriptConfig::json(), |out| {
            out.emit(json!({"a": 1}))?;
            Ok(json!({"b": 2}))
        });
        assert_eq!(outcome.stdout, "{\n  \"a\": 1\n}\n{\n  \"b\": 2\n}\n");
    }

    #[test]
    fn hybrid_emits_terminal_value_last() {
        let outcome = run_captured(&ScriptConfig::text(), |out| {
            out.emit("first")?;
            out.emit(2)?;
            Ok("last")
        });
        assert_eq!(outcome.stdout, "first\n2\nlast\n");
        assert_eq!(outcome.rows_emitted, 3);
    }

    #[test]
    fn void_terminal_values_are_not_emitted() {
        let outcome = run_captured(&ScriptConfig::text(), |_| Ok(None::<String>));
        assert_eq!(outcome.stdout, "");
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.rows_emitted, 0);
    }

    #[test]
    fn non_finite_terminal_value_fails() {
        for value in [f64::NAN, f64::INFINITY] {
            let outcome = run_captured(&ScriptConfig::text(), |_| Ok(value));
            assert_eq!(outcome.exit_code, 1, "value {value}");
            assert_eq!(outcome.stdout, "");
            assert_eq!(
                outcome.stderr,
                "[ERROR] Script execution failed: Row with type \"text\" is not a finite number\n"
            );
        }
    }

    #[test]
    fn non_finite_emitted_row_fails() {
        let outcome = run_captured(&ScriptConfig::text(), |out| {
            out.emit(1.5)?;
            out.emit(f64::NAN)?;
            Ok(())
        });
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(outcome.stdout, "1.5\n");
        assert_eq!(outcome.rows_emitted, 1);
        assert!(outcome.stderr.ends_with("is not a finite number\n"));
    }

    #[test]
    fn large_finite_numbers_are_emitted() {
        let outcome = run_captured(&ScriptConfig::text(), |_| Ok(1e21_f64));
        assert_eq!(outcome.stdout, "1e+21\n");
    }

    #[test]
    fn text_rejects_object_row() {
        let outcome = run_captured(&ScriptConfig::text(), |out| {
            out.emit(json!({"a": "b"}))?;
            Ok(())
        });
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(outcome.stdout, "");
        assert_eq!(
            outcome.stderr,
            "[ERROR] Script execution failed: Row with type \"text\" is not a string or number\n"
        );
    }

    #[test]
    fn csv_rejects_non_array_row() {
        let outcome = run_captured(&ScriptConfig::csv(["col1"]), |out| {
            out.emit(json!({}))?;
            Ok(())
        });
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(
            outcome.stderr,
            "[ERROR] Script execution failed: Row with type \"csv\" is not an array\n"
        );
    }

    #[test]
    fn json_rejects_non_object_row() {
        let outcome = run_captured(&ScriptConfig::json(), |out| {
            out.emit("not an object")?;
            Ok(())
        });
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(
            outcome.stderr,
            "[ERROR] Script execution failed: Row with type \"json\" is not an object\n"
        );
    }

    #[test]
    fn json_rejects_returned_array() {
        let outcome = run_captured(&ScriptConfig::json(), |_| Ok(vec![1, 2]));
        assert_eq!(outcome.exit_code, 1);
        assert!(
            outcome
                .stderr
                .starts_with("[ERROR] Script execution failed: Row with type \"json\"")
        );
    }

    #[test]
    fn swallowed_shape_error_still_fails_the_run() {
        let outcome = run_captured(&ScriptConfig::text(), |out| {
            let _ignored = out.emit(json!(["wrong"]));
            let refused = out.emit("after");
            assert!(refused.is_err());
            Ok(())
        });
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(outcome.stdout, "");
        assert_eq!(outcome.stderr.lines().count(), 1);
        assert!(matches!(
            outcome.failure,
            Some(ScriptError::EmissionShape(_))
        ));
    }

    #[test]
    fn rows_before_a_failure_stay_emitted() {
        let outcome = run_captured(&ScriptConfig::csv(["a"]), |out| -> anyhow::Result<()> {
            out.emit(["kept"])?;
            bail!("boom");
        });
        assert_eq!(outcome.stdout, "kept\n");
        assert_eq!(outcome.rows_emitted, 1);
        assert_eq!(outcome.stderr, "[ERROR] Script execution failed: boom\n");
        assert_eq!(outcome.exit_code, 1);
    }

    #[test]
    fn logic_error_is_reported_with_its_message() {
        let outcome = run_captured(&ScriptConfig::text(), |_| -> anyhow::Result<()> {
            bail!("Test error")
        });
        assert_eq!(outcome.stderr, "[ERROR] Script execution failed: Test error\n");
        assert_eq!(outcome.exit_code, 1);
        assert!(matches!(outcome.failure, Some(ScriptError::Logic(_))));
    }

    #[test]
    fn logic_sees_invocation_args() {
        let outcome = run(
            &ScriptConfig::text(),
            &args(&["typescript"]),
            &RunOptions::captured(),
            |out| Ok(out.args().join(" ")),
        )
        .expect("run");
        assert_eq!(outcome.stdout, "typescript\n");
    }
}
