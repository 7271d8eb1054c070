//! relayout CLI - layout-preserving source regeneration
//!
//! Each source file is paired with two tree documents next to it:
//! - `Foo.scala.orig.json`: the tree a parser produced for `Foo.scala`
//! - `Foo.scala.edit.json`: the tree after a transformation
//!
//! Only the regions the transformation changed are reprinted. Everything
//! else, comments and blank lines included, is kept byte for byte.

mod config;
mod output;
mod process;

use anyhow::Result;
use clap::Parser;
use colored::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use config::Config;
use output::{EditInfo, OutputFormat, Reporter};
use process::{process_file, write_file, Inputs, Settings};

#[derive(Parser)]
#[command(name = "relayout")]
#[command(version)]
#[command(about = "Regenerate transformed source code while keeping its layout")]
struct Cli {
    /// Source files, edited tree files (*.edit.json) or directories to process
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Original tree document (default: <source>.orig.json)
    #[arg(long, value_name = "PATH", requires = "edited")]
    original: Option<PathBuf>,

    /// Edited tree document (default: <source>.edit.json)
    #[arg(long, value_name = "PATH", requires = "original")]
    edited: Option<PathBuf>,

    /// Report what would change without writing (default mode)
    #[arg(long, conflicts_with = "fix")]
    check: bool,

    /// Write regenerated source back to the files
    #[arg(long, conflicts_with = "check")]
    fix: bool,

    /// Show verbose output and debug logs
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Output format: text, json, diff
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Indentation for newly printed code: a number of spaces or "tab"
    #[arg(long, value_name = "INDENT")]
    indent: Option<String>,

    /// Line ending for newly printed code: lf or crlf (default: detect)
    #[arg(long, value_name = "ENDING")]
    line_ending: Option<String>,

    /// Path to config file (default: auto-detect .relayout.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    no_config: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

/// Log to stderr, filtered by `RELAYOUT_LOG` unless `--verbose` asks for debug
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("RELAYOUT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .init();
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = if cli.no_config {
        Config::default()
    } else if let Some(config_path) = &cli.config {
        tracing::debug!(path = %config_path.display(), "using config");
        Config::load_path(config_path)?
    } else {
        match Config::load()? {
            Some((cfg, path)) => {
                tracing::debug!(path = %path.display(), "using config");
                cfg
            }
            None => Config::default(),
        }
    };

    // Command line wins over the config file
    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        let format = cli
            .format
            .as_deref()
            .or(config.output.format.as_deref())
            .unwrap_or("text");
        OutputFormat::from_str(format).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid output format '{}'. Valid options: text, json, diff",
                format
            )
        })?
    };

    let settings = Settings {
        indent: config.indent_style(cli.indent.as_deref())?,
        line_ending: config.line_ending(cli.line_ending.as_deref())?,
    };

    let fix_mode = cli.fix;
    let check_mode = !fix_mode;

    if cli.verbose && output_format == OutputFormat::Text {
        println!(
            "{}: {}",
            "Mode".bold(),
            if fix_mode { "fix" } else { "check" }
        );
        println!("{}: {:?}", "Indent".bold(), settings.indent);
        println!();
    }

    let (inputs, missing_paths) = collect_inputs(&cli, &config)?;

    // Process files in parallel
    let results: Vec<FileResult> = inputs
        .par_iter()
        .map(|inputs| process_file_to_result(inputs, settings))
        .collect();

    // Sort results by path for deterministic output
    let mut sorted_results: Vec<_> = results.into_iter().zip(inputs.iter()).collect();
    sorted_results.sort_by(|a, b| a.1.source.cmp(&b.1.source));

    let mut reporter = Reporter::new(output_format, cli.verbose);

    for path in &missing_paths {
        if output_format == OutputFormat::Text {
            eprintln!(
                "{}: Path does not exist: {}",
                "Warning".yellow(),
                path.display()
            );
        }
    }

    for (result, inputs) in sorted_results {
        report_result(&inputs.source, result, fix_mode, &mut reporter)?;
    }

    let summary = reporter.summary();
    let exit_code = if summary.errors > 0 {
        ExitCode::from(1)
    } else if check_mode && summary.files_with_changes > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    reporter.finish(check_mode)?;

    Ok(exit_code)
}

/// Resolve command-line paths to regeneration inputs
fn collect_inputs(cli: &Cli, config: &Config) -> Result<(Vec<Inputs>, Vec<PathBuf>)> {
    if let (Some(original), Some(edited)) = (&cli.original, &cli.edited) {
        if cli.paths.len() != 1 {
            anyhow::bail!("--original and --edited take exactly one source file");
        }
        let inputs = Inputs {
            source: cli.paths[0].clone(),
            original: original.clone(),
            edited: edited.clone(),
        };
        return Ok((vec![inputs], Vec::new()));
    }

    let mut inputs = Vec::new();
    let mut missing_paths = Vec::new();

    for path in &cli.paths {
        if path.is_file() {
            inputs.push(Inputs::for_path(path));
        } else if path.is_dir() {
            inputs.extend(edited_trees_under(path, config));
        } else {
            missing_paths.push(path.clone());
        }
    }

    Ok((inputs, missing_paths))
}

/// Every `*.edit.json` below `dir`, paired with its source
fn edited_trees_under(dir: &Path, config: &Config) -> Vec<Inputs> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| Inputs::for_edited_tree(e.path()))
        .filter(|inputs| !config.should_exclude(&inputs.source))
        .collect()
}

/// Result of processing a single file (for parallel processing)
enum FileResult {
    /// Edited tree matches the original
    NoChanges { warnings: Vec<String> },
    /// File has changes to report/apply
    HasChanges {
        edits: Vec<EditInfo>,
        warnings: Vec<String>,
        old_source: String,
        new_source: String,
    },
    Error(String),
}

/// Process a file and return a result (no output, suitable for parallel execution)
fn process_file_to_result(inputs: &Inputs, settings: Settings) -> FileResult {
    match process_file(inputs, settings) {
        Ok(result) => match result.new_source {
            Some(new_source) if !result.edits.is_empty() => FileResult::HasChanges {
                edits: result.edits,
                warnings: result.warnings,
                old_source: result.old_source,
                new_source,
            },
            _ => FileResult::NoChanges {
                warnings: result.warnings,
            },
        },
        Err(e) => FileResult::Error(format!("{:#}", e)),
    }
}

/// Report a file result and optionally apply fixes
fn report_result(
    path: &Path,
    result: FileResult,
    fix_mode: bool,
    reporter: &mut Reporter,
) -> Result<()> {
    match result {
        FileResult::NoChanges { warnings } => {
            reporter.report_skipped(path, warnings);
        }
        FileResult::HasChanges {
            edits,
            warnings,
            old_source,
            new_source,
        } => {
            if fix_mode {
                write_file(path, &new_source)?;
                reporter.report_fix(path, edits, warnings);
            } else {
                reporter.report_check(path, edits, warnings, &old_source, &new_source);
            }
        }
        FileResult::Error(msg) => {
            reporter.report_error(path, &msg);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "relayout", "--fix", "--indent", "4", "--format", "diff", "src",
        ])
        .unwrap();
        assert!(cli.fix);
        assert_eq!(cli.indent.as_deref(), Some("4"));
        assert_eq!(cli.format.as_deref(), Some("diff"));
        assert_eq!(cli.paths, vec![PathBuf::from("src")]);

        assert!(Cli::try_parse_from(["relayout", "--fix", "--check", "src"]).is_err());
        assert!(Cli::try_parse_from(["relayout", "--original", "a.json", "A.scala"]).is_err());
    }

    #[test]
    fn test_collect_inputs_from_directory() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let generated = temp.path().join("generated");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&generated).unwrap();
        fs::write(src.join("Main.scala"), "").unwrap();
        fs::write(src.join("Main.scala.edit.json"), "{}").unwrap();
        fs::write(src.join("Main.scala.orig.json"), "{}").unwrap();
        fs::write(generated.join("Gen.scala.edit.json"), "{}").unwrap();

        let config: Config = toml::from_str("[paths]\nexclude = [\"generated/\"]").unwrap();
        let missing = temp.path().join("missing");
        let cli = Cli::try_parse_from([
            OsStr::new("relayout"),
            temp.path().as_os_str(),
            missing.as_os_str(),
        ])
        .unwrap();

        let (inputs, missing_paths) = collect_inputs(&cli, &config).unwrap();
        assert_eq!(inputs, vec![Inputs::for_source(&src.join("Main.scala"))]);
        assert_eq!(missing_paths, vec![missing]);
    }

    #[test]
    fn test_explicit_tree_paths() {
        let cli = Cli::try_parse_from([
            "relayout",
            "--original",
            "before.json",
            "--edited",
            "after.json",
            "A.scala",
        ])
        .unwrap();
        let (inputs, _) = collect_inputs(&cli, &Config::default()).unwrap();
        assert_eq!(
            inputs,
            vec![Inputs {
                source: PathBuf::from("A.scala"),
                original: PathBuf::from("before.json"),
                edited: PathBuf::from("after.json"),
            }]
        );
    }
}
