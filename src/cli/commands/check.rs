//! `apival check` command - Check JSON payloads against a YAML schema

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::document::{load_data, load_schema, LoadError, SyntaxError};
use crate::schema::{CompiledSchema, ReportMode, Validator, ViolationReport};

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// YAML schema file
    pub schema: PathBuf,

    /// JSON payload files, or directories to search for *.json files
    #[arg(required = true)]
    pub data: Vec<PathBuf>,

    /// Report every violation instead of only the first
    #[arg(long)]
    pub all: bool,

    /// Continue checking after the first failing file
    #[arg(long)]
    pub keep_going: bool,

    /// Show summary only, don't show individual errors
    #[arg(long)]
    pub summary: bool,
}

/// Check statistics
#[derive(Default)]
struct CheckStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    total_errors: usize,
}

/// Per-file result for `--format json`
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    errors: Vec<String>,
}

/// Result of checking one payload file
struct FileOutcome {
    messages: Vec<String>,
    report: Option<miette::Report>,
}

pub fn run(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let mode = if args.all {
        ReportMode::All
    } else {
        config.report_mode()
    };
    let json_output = global.format == OutputFormat::Json;
    let chatty = !json_output && !global.quiet;
    let per_file = !json_output && !args.summary;

    let schema = load_schema(&args.schema).map_err(load_error_report)?;
    let compiled = Validator::new(mode)
        .compile(&schema)
        .map_err(|v| miette::miette!("{}: {}", args.schema.display(), v))?;

    let files = expand_paths(&args.data);
    if files.is_empty() {
        return Err(miette::miette!("No JSON files found to check"));
    }

    if chatty {
        println!(
            "{} Checking {} file(s) against {}...\n",
            style("→").blue(),
            files.len(),
            args.schema.display()
        );
    }

    let mut stats = CheckStats::default();
    let mut reports = Vec::new();

    for path in &files {
        stats.files_checked += 1;
        let outcome = check_file(&compiled, path);
        let valid = outcome.messages.is_empty();

        if valid {
            stats.files_passed += 1;
            // --quiet keeps failures only
            if per_file && chatty {
                println!("{} {}", style("✓").green(), path.display());
            }
        } else {
            stats.files_failed += 1;
            stats.total_errors += outcome.messages.len();

            if per_file {
                println!(
                    "{} {} - {} error(s)",
                    style("✗").red(),
                    path.display(),
                    outcome.messages.len()
                );
                if let Some(report) = &outcome.report {
                    println!("{:?}", report);
                }
            }
        }

        if json_output {
            reports.push(FileReport {
                file: path.display().to_string(),
                valid,
                errors: outcome.messages,
            });
        }

        if !valid && !args.keep_going {
            break;
        }
    }

    if json_output {
        let rendered = serde_json::to_string_pretty(&reports)
            .map_err(|e| miette::miette!("Failed to serialize results: {}", e))?;
        println!("{}", rendered);
    } else if chatty {
        print_summary(&stats);
    }

    if stats.files_failed > 0 {
        if stats.files_failed == 1 {
            Err(miette::miette!("Validation failed: 1 file has errors"))
        } else {
            Err(miette::miette!(
                "Validation failed: {} files have errors",
                stats.files_failed
            ))
        }
    } else {
        if chatty {
            println!("{} All files passed validation!", style("✓").green().bold());
        }
        Ok(())
    }
}

fn check_file(compiled: &CompiledSchema, path: &Path) -> FileOutcome {
    match load_data(path) {
        Ok(payload) => {
            let violations = compiled.validate(payload.value());
            let report = (!violations.is_empty()).then(|| {
                miette::Report::new(ViolationReport::new(
                    &path.display().to_string(),
                    &payload,
                    &violations,
                ))
            });
            FileOutcome {
                messages: violations.iter().map(|v| v.to_string()).collect(),
                report,
            }
        }
        Err(err) => FileOutcome {
            messages: vec![err.to_string()],
            report: Some(load_error_report(err)),
        },
    }
}

/// Turn a loader failure into a report, with a source snippet when possible
fn load_error_report(err: LoadError) -> miette::Report {
    match SyntaxError::from_load_error(&err) {
        Some(diagnostic) => miette::Report::new(diagnostic),
        None => miette::miette!("{}", err),
    }
}

fn print_summary(stats: &CheckStats) {
    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Check Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Files checked:  {}", style(stats.files_checked).cyan());
    println!("  Files passed:   {}", style(stats.files_passed).green());
    println!("  Files failed:   {}", style(stats.files_failed).red());
    println!("  Total errors:   {}", style(stats.total_errors).red());
    println!();
}

/// Expand directories into the *.json files below them.
///
/// Plain paths are kept even if missing so the loader reports them.
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                .map(|e| e.path().to_path_buf())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_expand_paths_walks_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("b.json"), "{}").unwrap();
        fs::write(tmp.path().join("nested/a.json"), "{}").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();

        let files = expand_paths(&[tmp.path().to_path_buf()]);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "json"));
    }

    #[test]
    fn test_expand_paths_keeps_missing_files() {
        let missing = PathBuf::from("/definitely/not/here.json");
        assert_eq!(expand_paths(&[missing.clone()]), vec![missing]);
    }

    #[test]
    fn test_check_file_outcomes() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.json");
        let bad = tmp.path().join("bad.json");
        fs::write(&good, r#"{"name": "Test"}"#).unwrap();
        fs::write(&bad, r#"{"name": 1}"#).unwrap();

        let schema = crate::document::Schema::from_yaml_str(
            "type: object\nproperties:\n  name:\n    type: string\n",
        )
        .unwrap();
        let compiled = Validator::default().compile(&schema).unwrap();

        let outcome = check_file(&compiled, &good);
        assert!(outcome.messages.is_empty());
        assert!(outcome.report.is_none());

        let outcome = check_file(&compiled, &bad);
        assert_eq!(outcome.messages.len(), 1);
        assert!(outcome.report.is_some());

        let outcome = check_file(&compiled, &tmp.path().join("absent.json"));
        assert!(outcome.messages[0].starts_with("JSON data file not found: "));
    }
}
