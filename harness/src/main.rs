//! Run question scripts across projects.
//!
//! `harness info` prints a script's self-description; `harness run` runs the
//! script in every given project directory and prints a summary table.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use harness::exit_codes;
use harness::io::config::{DEFAULT_CONFIG, load_config};
use harness::io::host::{QuestionRun, describe_script, run_question};
use harness::logging;
use harness::report::{RunSummary, csv_table, json_table, markdown_table};
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "harness",
    version,
    about = "Run question scripts across projects"
)]
struct Cli {
    /// Config file (defaults apply if missing).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the self-description (`--info`) of a question script.
    Info {
        /// Script command line, e.g. `./target/debug/do-they-have-a-readme`.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        script: Vec<String>,
    },
    /// Run a question script in each project and print a summary table.
    Run {
        /// Project directory to run the script in (repeatable).
        #[arg(long = "project", short = 'p', required = true)]
        projects: Vec<PathBuf>,

        /// Table format for the summary.
        #[arg(long, value_enum, default_value_t = TableFormat::Markdown)]
        format: TableFormat,

        /// Script command line followed by question-specific arguments.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        script: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TableFormat {
    Markdown,
    Csv,
    Json,
}

fn main() -> ExitCode {
    logging::init();
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::from(exit_codes::FAILED as u8)
        }
    }
}

fn run() -> Result<u8> {
    let cli = Cli::parse();
    match cli.command {
        Command::Info { script } => cmd_info(&cli.config, &script),
        Command::Run {
            projects,
            format,
            script,
        } => cmd_run(&cli.config, &script, &projects, format),
    }
}

fn cmd_info(config_path: &Path, script: &[String]) -> Result<u8> {
    let config = load_config(config_path)?;
    let info = describe_script(script, config.limits())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&info).context("serialize self-description")?
    );
    Ok(exit_codes::OK as u8)
}

fn cmd_run(
    config_path: &Path,
    script: &[String],
    projects: &[PathBuf],
    format: TableFormat,
) -> Result<u8> {
    let config = load_config(config_path)?;
    let info = describe_script(script, config.limits())?;
    debug!(output = %info.output, projects = projects.len(), "script described");

    // Question scripts are absolute or resolved against the current directory,
    // not the project directory they run in.
    let command = resolve_program(script)?;
    let runs = projects
        .iter()
        .map(|project| run_question(&command, project, &[], &config))
        .collect::<Result<Vec<QuestionRun>>>()?;

    let table = match format {
        TableFormat::Markdown => markdown_table(&runs),
        TableFormat::Csv => csv_table(&info, &runs),
        TableFormat::Json => json_table(&runs)?,
    };
    print!("{table}");

    let summary = RunSummary::from_runs(&runs);
    info!(
        projects = summary.projects,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "run finished"
    );
    if summary.all_succeeded() {
        Ok(exit_codes::OK as u8)
    } else {
        Ok(exit_codes::FAILED as u8)
    }
}

/// Make a relative program path absolute so it survives the change of working directory.
fn resolve_program(script: &[String]) -> Result<Vec<String>> {
    let mut command = script.to_vec();
    if let Some(program) = command.first_mut() {
        let path = Path::new(program.as_str());
        if path.components().count() > 1 && path.is_relative() {
            let cwd = std::env::current_dir().context("read current directory")?;
            *program = cwd.join(path).display().to_string();
        }
    }
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_info() {
        let cli = Cli::parse_from(["harness", "info", "./question", "--verbose"]);
        match cli.command {
            Command::Info { script } => assert_eq!(script, vec!["./question", "--verbose"]),
            Command::Run { .. } => panic!("expected info"),
        }
        assert_eq!(cli.config, PathBuf::from("harness.toml"));
    }

    #[test]
    fn parse_run_with_projects() {
        let cli = Cli::parse_from([
            "harness",
            "run",
            "--project",
            "a",
            "-p",
            "b",
            "--format",
            "csv",
            "node",
            "question.js",
            "typescript",
        ]);
        match cli.command {
            Command::Run {
                projects,
                format,
                script,
            } => {
                assert_eq!(projects, vec![PathBuf::from("a"), PathBuf::from("b")]);
                assert_eq!(format, TableFormat::Csv);
                assert_eq!(script, vec!["node", "question.js", "typescript"]);
            }
            Command::Info { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::parse_from(["harness", "run", "-p", "a", "--format", "json", "./q"]);
        match cli.command {
            Command::Run { format, .. } => assert_eq!(format, TableFormat::Json),
            Command::Info { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn resolve_program_keeps_bare_names() {
        let command = resolve_program(&["node".to_string(), "a.js".to_string()]).expect("resolve");
        assert_eq!(command, vec!["node", "a.js"]);
    }

    #[test]
    fn resolve_program_anchors_relative_paths() {
        let command = resolve_program(&["./bin/question".to_string()]).expect("resolve");
        assert!(Path::new(&command[0]).is_absolute());
        assert!(command[0].ends_with("bin/question"));
    }
}
