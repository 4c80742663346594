//! Command-line wrapper around `cargo test` for the Books API suite.
//!
//! Builds the cargo invocation from flags, runs it sequentially, and writes
//! optional reports under the configured reports directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use books_core::{logging, Config};
use clap::Parser;
use thiserror::Error;
use tracing::{error, info, warn};

/// Package holding the test cases.
pub const TEST_PACKAGE: &str = "books-core";

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "books-runner", about = "Run Books API automation tests")]
pub struct Args {
    /// Test labels to run (e.g. smoke, crud, negative). Any match selects a test.
    #[arg(long, num_args = 1..)]
    pub markers: Vec<String>,

    /// Generate an HTML summary at <reports>/report.html
    #[arg(long)]
    pub html_report: bool,

    /// Collect coverage with cargo-llvm-cov into <reports>/coverage
    #[arg(long)]
    pub coverage: bool,

    /// Show test output as it is printed
    #[arg(short, long)]
    pub verbose: bool,

    /// Fetch dependencies before running tests
    #[arg(long)]
    pub install_deps: bool,

    /// Remove generated reports before running tests
    #[arg(long)]
    pub clean: bool,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0} failed")]
    StepFailed(&'static str),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> RunnerError + '_ {
    move |source| RunnerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Install stderr logging and check the configuration.
///
/// An invalid configuration is only warned about; the run continues.
pub fn startup(config: &Config) -> bool {
    logging::init_stderr(config);
    config.warn_if_invalid()
}

/// Arguments passed to `cargo` for the test step.
pub fn cargo_test_args(args: &Args, reports_dir: &Path) -> Vec<String> {
    let mut cmd: Vec<String> = if args.coverage {
        vec![
            "llvm-cov".into(),
            "-p".into(),
            TEST_PACKAGE.into(),
            "--html".into(),
            "--output-dir".into(),
            reports_dir.join("coverage").display().to_string(),
        ]
    } else {
        vec!["test".into(), "-p".into(), TEST_PACKAGE.into()]
    };

    cmd.push("--".into());
    cmd.push("--test-threads=1".into());
    cmd.extend(args.markers.iter().map(|m| label_filter(m)));
    if args.verbose {
        cmd.push("--nocapture".into());
    }
    cmd
}

/// A bare label selects its module; anything with a path is used as given.
fn label_filter(marker: &str) -> String {
    if marker.contains("::") {
        marker.to_string()
    } else {
        format!("{marker}::")
    }
}

/// Counts aggregated from libtest `test result:` lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: u32,
    pub failed: u32,
    pub ignored: u32,
}

impl RunSummary {
    pub fn parse(output: &str) -> Self {
        output
            .lines()
            .filter_map(|line| line.trim().strip_prefix("test result:"))
            .fold(Self::default(), |mut total, rest| {
                for part in rest.split(';') {
                    let mut words = part.split_whitespace().rev();
                    let (Some(label), Some(count)) = (words.next(), words.next()) else {
                        continue;
                    };
                    let Ok(count) = count.parse::<u32>() else {
                        continue;
                    };
                    match label {
                        "passed" => total.passed += count,
                        "failed" => total.failed += count,
                        "ignored" => total.ignored += count,
                        _ => {}
                    }
                }
                total
            })
    }

    pub fn total(&self) -> u32 {
        self.passed + self.failed + self.ignored
    }
}

pub fn write_html_report(reports_dir: &Path, summary: &RunSummary, success: bool) -> Result<PathBuf, RunnerError> {
    fs::create_dir_all(reports_dir).map_err(io_error(reports_dir))?;
    let path = reports_dir.join("report.html");
    let verdict = if success { "passed" } else { "failed" };
    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Books API test report</title></head>\n<body>\n\
         <h1>Books API test report</h1>\n<p>Run {verdict}.</p>\n<table>\n\
         <tr><th>Passed</th><td>{}</td></tr>\n<tr><th>Failed</th><td>{}</td></tr>\n\
         <tr><th>Ignored</th><td>{}</td></tr>\n<tr><th>Total</th><td>{}</td></tr>\n\
         </table>\n</body>\n</html>\n",
        summary.passed,
        summary.failed,
        summary.ignored,
        summary.total()
    );
    fs::write(&path, html).map_err(io_error(&path))?;
    Ok(path)
}

/// Remove generated reports. Returns how many entries were deleted.
pub fn clean_reports(reports_dir: &Path) -> Result<usize, RunnerError> {
    let entries = match fs::read_dir(reports_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(io_error(reports_dir)(err)),
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry.map_err(io_error(reports_dir))?.path();
        if path.is_dir() && path.file_name().is_some_and(|n| n == "coverage") {
            fs::remove_dir_all(&path).map_err(io_error(&path))?;
            removed += 1;
        } else if path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e, "html" | "xml" | "json"))
        {
            fs::remove_file(&path).map_err(io_error(&path))?;
            removed += 1;
        }
    }
    info!(removed, dir = %reports_dir.display(), "Cleaned generated reports");
    Ok(removed)
}

fn run_cargo(cmd_args: &[String], description: &'static str) -> Result<Output, RunnerError> {
    info!(command = %format!("cargo {}", cmd_args.join(" ")), "{description}");
    let output = Command::new("cargo")
        .args(cmd_args)
        .output()
        .map_err(|source| RunnerError::Spawn {
            program: "cargo".to_string(),
            source,
        })?;
    print!("{}", String::from_utf8_lossy(&output.stdout));
    eprint!("{}", String::from_utf8_lossy(&output.stderr));
    if output.status.success() {
        info!("{description} completed successfully");
    } else {
        error!(code = ?output.status.code(), "{description} failed");
    }
    Ok(output)
}

/// Execute the requested steps. `Ok(true)` means every test passed.
pub fn run(args: &Args, reports_dir: &Path) -> Result<bool, RunnerError> {
    if args.install_deps {
        let output = run_cargo(&["fetch".to_string()], "Installing dependencies")?;
        if !output.status.success() {
            return Err(RunnerError::StepFailed("Installing dependencies"));
        }
    }

    if args.clean {
        clean_reports(reports_dir)?;
    }
    fs::create_dir_all(reports_dir).map_err(io_error(reports_dir))?;

    let output = run_cargo(&cargo_test_args(args, reports_dir), "Running API tests")?;
    let success = output.status.success();
    let summary = RunSummary::parse(&String::from_utf8_lossy(&output.stdout));
    info!(passed = summary.passed, failed = summary.failed, ignored = summary.ignored, "Test summary");

    if args.html_report {
        let path = write_html_report(reports_dir, &summary, success)?;
        println!("HTML Report: {}", path.display());
    }
    if args.coverage {
        println!("Coverage Report: {}", reports_dir.join("coverage").join("index.html").display());
    }
    if !success {
        warn!("Some tests failed. Check the output above for details.");
    }
    Ok(success)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("books-runner").chain(argv.iter().copied()))
    }

    #[test]
    fn startup_reports_invalid_config() {
        assert!(startup(&Config::default()));

        let bad_scheme = Config::default().with_base_url("ftp://books.local");
        assert!(!startup(&bad_scheme));

        let bad_level = Config {
            log_level: "TRACE".to_string(),
            ..Config::default()
        };
        assert!(!startup(&bad_level));
    }

    #[test]
    fn default_run_is_sequential_cargo_test() {
        let cmd = cargo_test_args(&args(&[]), Path::new("reports"));
        assert_eq!(cmd, ["test", "-p", "books-core", "--", "--test-threads=1"]);
    }

    #[test]
    fn markers_become_module_filters() {
        let parsed = args(&["--markers", "smoke", "crud", "-v"]);
        assert_eq!(parsed.markers, ["smoke", "crud"]);

        let cmd = cargo_test_args(&parsed, Path::new("reports"));
        assert_eq!(
            &cmd[3..],
            ["--", "--test-threads=1", "smoke::", "crud::", "--nocapture"]
        );
    }

    #[test]
    fn qualified_marker_is_kept() {
        assert_eq!(label_filter("edge::very_long_title"), "edge::very_long_title");
    }

    #[test]
    fn coverage_uses_llvm_cov() {
        let cmd = cargo_test_args(&args(&["--coverage"]), Path::new("out"));
        assert_eq!(cmd[0], "llvm-cov");
        assert!(cmd.contains(&"--html".to_string()));
        let dir = cmd.iter().position(|a| a == "--output-dir").unwrap();
        assert_eq!(Path::new(&cmd[dir + 1]), Path::new("out").join("coverage"));
    }

    #[test]
    fn summary_sums_every_test_binary() {
        let output = "\
running 3 tests
test smoke::get_all_books ... ok
test result: ok. 3 passed; 0 failed; 1 ignored; 0 measured; 0 filtered out; finished in 0.20s

test result: FAILED. 5 passed; 2 failed; 0 ignored; 0 measured; 4 filtered out; finished in 1.01s
";
        let summary = RunSummary::parse(output);
        assert_eq!(
            summary,
            RunSummary {
                passed: 8,
                failed: 2,
                ignored: 1
            }
        );
        assert_eq!(summary.total(), 11);
    }

    #[test]
    fn summary_of_unrelated_output_is_empty() {
        assert_eq!(RunSummary::parse("error: could not compile"), RunSummary::default());
    }

    #[test]
    fn html_report_lists_counts() {
        let dir = tempfile::tempdir().unwrap();
        let summary = RunSummary {
            passed: 4,
            failed: 1,
            ignored: 0,
        };
        let path = write_html_report(dir.path(), &summary, false).unwrap();

        let html = fs::read_to_string(path).unwrap();
        assert!(html.contains("Run failed."));
        assert!(html.contains("<tr><th>Failed</th><td>1</td></tr>"));
        assert!(html.contains("<tr><th>Total</th><td>5</td></tr>"));
    }

    #[test]
    fn clean_removes_only_generated_reports() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["report.html", "junit.xml", "results.json", "notes.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("coverage")).unwrap();
        fs::write(dir.path().join("coverage").join("index.html"), "x").unwrap();

        assert_eq!(clean_reports(dir.path()).unwrap(), 4);
        assert!(dir.path().join("notes.txt").exists());
        assert!(!dir.path().join("coverage").exists());
    }

    #[test]
    fn clean_tolerates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(clean_reports(&dir.path().join("absent")).unwrap(), 0);
    }
}
