// src/main.rs

use anyhow::Result;
use dismv2::cli::{self, ParsedArgs};
use dismv2::{Config, LogLevel, ServicingContext, ServicingRouter};
use std::env;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let invocation = match cli::parse_args(args)? {
        ParsedArgs::Help => {
            print!("{}", cli::help_text());
            return Ok(());
        }
        ParsedArgs::Run(invocation) => invocation,
    };

    // ========== INITIALIZE CONTEXT ==========
    let config = Config::resolve(invocation.scratch_dir.clone(), invocation.log_level);
    init_logging(config.log_level);

    for token in &invocation.ignored {
        tracing::warn!("Ignoring unrecognised argument: {}", token);
    }

    tracing::debug!(
        "State directory: {}, native tool: {} (delegation {})",
        config.state_dir.display(),
        config.tool,
        if config.native_platform { "enabled" } else { "disabled" }
    );

    let ctx = ServicingContext::new(config);
    let mut router = ServicingRouter::with_native_tool(ctx);

    // ========== EXECUTE ==========
    let report = router.dispatch(&invocation)?;
    print!("{}", report);

    Ok(())
}

/// Logs go to stderr so stdout carries only the report. `RUST_LOG` wins over `/LogLevel`.
fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
