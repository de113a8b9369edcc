//! # Casbin CLI
//!
//! Command-line front end for evaluating access control decisions against a
//! Casbin model and policy.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Basic ACL
//! casbin enforce -m basic_model.conf -p basic_policy.csv alice data1 read
//!
//! # RBAC with domains, with an explanation
//! casbin enforceEx -m rbac_with_domains_model.conf -p rbac_with_domains_policy.csv \
//!     alice domain1 data1 read
//!
//! # ABAC with a structured subject
//! casbin enforce -m abac_rule_model.conf -p abac_rule_policy.csv '{"Age":30}' /data1 read
//! ```
//!
//! Each run prints exactly one line to stdout:
//!
//! ```json
//! {"allow":true,"explain":[]}
//! ```
//!
//! ## Exit Codes
//!
//! Enforcement always exits with **0**, whether access was allowed, denied,
//! or could not be evaluated. Problems are described on stderr only.

use anyhow::Context;
use casbin_cli::engine::ENGINE_VERSION;
use casbin_cli::{run, EnforcementMode};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const ROOT_DESCRIPTION: &str = "Casbin is a powerful and efficient open-source access control library. \
It provides support for enforcing authorization based on various access control models.";

const ENFORCE_EXAMPLES: &str = r#"Examples:
  casbin enforce -m model.conf -p policy.csv alice data1 read
  casbin enforce -m rbac_model.conf -p rbac_policy.csv alice domain1 data1 read
  casbin enforce -m abac_model.conf -p abac_policy.csv '{"Age":30}' /data1 read

For structured parameters use {"field":value}; one field per argument."#;

/// Command-line interface for the Casbin enforcer
#[derive(Parser)]
#[command(name = "casbin", about = ROOT_DESCRIPTION, long_about = None)]
struct Cli {
    /// Print debug logging to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test if a 'subject' can access an 'object' with a given 'action' based on the policy
    #[command(after_help = ENFORCE_EXAMPLES)]
    Enforce(EnforceOpts),

    /// Same as `enforce`, and explain an allow decision
    #[command(name = "enforceEx", after_help = ENFORCE_EXAMPLES)]
    EnforceEx(EnforceOpts),
}

/// Options shared by both enforcement commands
#[derive(Args)]
struct EnforceOpts {
    /// Path to the model configuration file (ACL, RBAC, ABAC, ...)
    #[arg(short, long)]
    model: PathBuf,

    /// Path to the policy file (CSV rules)
    #[arg(short, long)]
    policy: PathBuf,

    /// Request values in model order, e.g. `alice data1 read`
    ///
    /// For ABAC subjects pass `{"attribute":value}`.
    #[arg(allow_hyphen_values = true)]
    arguments: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // `--version` is only honoured in first position, before clap sees it
    let Some(first) = std::env::args_os().nth(1) else {
        println!("{}", ROOT_DESCRIPTION);
        println!("\nUse 'casbin --help' for more information.");
        return Ok(());
    };
    if matches!(first.to_str(), Some("--version" | "-v")) {
        println!("casbin-cli {}", env!("CARGO_PKG_VERSION"));
        println!("casbin-rs {}", ENGINE_VERSION);
        return Ok(());
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (opts, mode) = match cli.command {
        Commands::Enforce(opts) => (opts, EnforcementMode::Enforce),
        Commands::EnforceEx(opts) => (opts, EnforcementMode::EnforceEx),
    };

    let result = run(&opts.model, &opts.policy, &opts.arguments, mode).await;
    let json = result.to_json().context("failed to render result")?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json).context("failed to write result")?;
    Ok(())
}

/// Route `tracing` output to stderr
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown unless
/// `--verbose` was given.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
