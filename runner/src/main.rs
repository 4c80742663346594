use std::process::ExitCode;

use books_core::Config;
use books_runner::{run, startup, Args};
use clap::Parser;
use tracing::error;

fn main() -> ExitCode {
    let args = Args::parse();
    let config = Config::from_env();
    startup(&config);

    println!("Books API Automation Test Runner");
    println!("{}", "=".repeat(50));

    match run(&args, &config.reports_dir) {
        Ok(true) => {
            println!("All tests completed successfully!");
            println!("All reports: {}", config.reports_dir.display());
            ExitCode::SUCCESS
        }
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %err, "Runner failed");
            ExitCode::FAILURE
        }
    }
}
