//! bearer-guard CLI - encode, decode and validate tokens from a shell.
//!
//! This is the entry point for the `bguard` binary.

mod commands;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use bearer_guard_auth::{JwtConfig, TokenFactory};

use commands::Command;

/// bearer-guard CLI - encode, decode and validate tokens.
#[derive(Parser, Debug)]
#[command(name = "bguard")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Signing secret (PEM key material for RS*, PS*, ES* and EdDSA).
    #[arg(long, env = "JWT_SECRET", hide_env_values = true, global = true)]
    secret: Option<String>,

    /// Algorithm name, e.g. HS256.
    #[arg(long, env = "JWT_ALGO", global = true)]
    algorithm: Option<String>,

    /// Clock-skew leeway in seconds for exp/nbf checks.
    #[arg(long, env = "JWT_LEEWAY", default_value_t = 0, global = true)]
    leeway: u64,

    /// Enable debug logging.
    #[arg(long, default_value = "false", global = true)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        tracing_subscriber::fmt()
            .with_env_filter("bearer_guard=debug,warn")
            .with_writer(std::io::stderr)
            .init();
    }

    let config = JwtConfig {
        secret: args.secret,
        algorithm: args.algorithm,
        leeway_seconds: args.leeway,
        ..JwtConfig::default()
    };
    let factory = TokenFactory::from_config(Arc::new(config));

    match commands::execute(&args.command, &factory) {
        Ok(outcome) => {
            println!("{}", outcome.output);
            if outcome.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
