//! Interactive command gate binary.
//!
//! Validates a proposed shell command against prefix allow/deny lists and,
//! when it passes (or a human approves it), executes it in the sandbox.
//! Approved prefixes persist to a local file so an interactive user builds
//! a trusted command set over time.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cmdgate::security::{GateConfig, ValidationOutcome, validate_with_config};
use cmdgate::session::{ApprovedPrefixStore, ExecutionMode, SessionPrefixes};
use cmdgate::shell::run_sandboxed;
use cmdgate::utils;

// Conventional exit code for a command killed on timeout (128 + SIGKILL mirrors
// what coreutils' timeout(1) reports).
const EXIT_DENIED: i32 = 1;
const EXIT_TIMED_OUT: i32 = 124;

#[derive(Parser, Debug)]
#[command(
    name = "cmdgate",
    about = "Validate a shell command against prefix allow/deny lists and run it if authorized"
)]
struct Args {
    /// Command line to validate and execute
    command: String,

    /// Expected prefix for each command segment (repeatable)
    #[arg(short = 'p', long = "prefix")]
    prefixes: Vec<String>,

    /// Allow-list prefix (repeatable)
    #[arg(long = "allow")]
    allow: Vec<String>,

    /// Deny-list prefix (repeatable)
    #[arg(long = "deny")]
    deny: Vec<String>,

    /// Merge the built-in read-only default allow list
    #[arg(long)]
    defaults: bool,

    /// JSON file with allow/deny/include_default_lists configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Timeout in seconds for command execution
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Skip validation: this exact invocation was already approved by a human
    #[arg(long)]
    approved: bool,

    /// Do not read or write the local approved-prefix file
    #[arg(long)]
    no_store: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging before anything else
    utils::logger::init_logging();

    let args = Args::parse();
    let config = load_config(&args)?;

    let mode = if args.no_store {
        ExecutionMode::Served
    } else {
        ExecutionMode::Interactive
    };
    let store = ApprovedPrefixStore::new(mode, None);

    let mut session = SessionPrefixes::new();
    session.approve_all(store.load());

    if !args.approved {
        match validate_with_config(&args.command, &args.prefixes, &config, &session) {
            ValidationOutcome::Allowed => {}
            outcome @ ValidationOutcome::Denied { .. } => {
                if let Some(text) = outcome.denial_text() {
                    eprintln!("{text}");
                }
                std::process::exit(EXIT_DENIED);
            }
            ValidationOutcome::ApprovalRequired { prefixes, .. } => {
                if !prompt_approval(&prefixes)? {
                    eprintln!("Command not approved.");
                    std::process::exit(EXIT_DENIED);
                }
                session.approve_all(&prefixes);
                if !args.no_store {
                    store.save(&prefixes)?;
                    info!("saved {} approved prefix(es) to {}", prefixes.len(), store.path().display());
                }
            }
        }
    }

    let result = run_sandboxed(&args.command, args.timeout).await?;
    if !result.output.is_empty() {
        println!("{}", result.output);
    }

    if result.timed_out {
        eprintln!(
            "Error: Command '{}' timed out after {} seconds.",
            args.command, args.timeout
        );
        std::process::exit(EXIT_TIMED_OUT);
    }
    match result.exit_code {
        Some(0) => Ok(()),
        Some(code) => {
            eprintln!(
                "Error: Command '{}' returned non-zero exit status {code}",
                args.command
            );
            std::process::exit(code);
        }
        None => {
            eprintln!("Error: Command '{}' was terminated by a signal", args.command);
            std::process::exit(EXIT_DENIED);
        }
    }
}

fn load_config(args: &Args) -> Result<GateConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid config JSON in {}", path.display()))?
        }
        None => GateConfig::default(),
    };

    config.allow.extend(args.allow.iter().cloned());
    config.deny.extend(args.deny.iter().cloned());
    if args.defaults {
        config.include_default_lists = true;
    }
    Ok(config)
}

/// Ask the user to approve the pending prefixes. Defaults to no.
fn prompt_approval(prefixes: &[String]) -> Result<bool> {
    eprint!(
        "Command prefix(es) not in allow list: {}. Approve for this session? [y/N] ",
        prefixes.join(", ")
    );
    std::io::stderr().flush().context("failed to flush prompt")?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read approval answer")?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
