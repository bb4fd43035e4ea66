//! # tierpay CLI entry point
//!
//! Parses command-line arguments, loads the role table once, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tierpay_cli::check::{run_check, CheckArgs};
use tierpay_cli::quote::{run_quote, QuoteArgs};
use tierpay_cli::roles::{run_roles, RolesArgs};
use tierpay_cli::slabs::{run_slabs, SlabsArgs};
use tierpay_cli::validate::{run_validate, ValidateArgs};
use tierpay_cli::{load_role_table, Context};

/// Role, permission and commission queries for the reseller network.
#[derive(Parser, Debug)]
#[command(name = "tierpay", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    /// Ignored when RUST_LOG is set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Role table YAML. Defaults to $TIERPAY_ROLE_TABLE, then the builtin table.
    #[arg(long, global = true, value_name = "PATH")]
    role_table: Option<PathBuf>,

    /// Emit results and logs as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the role ladder or one role's permissions.
    Roles(RolesArgs),

    /// Check whether a role may perform an action.
    Check(CheckArgs),

    /// Check rate files against the commission hierarchy.
    Validate(ValidateArgs),

    /// Check, resolve against, or sort a slab file.
    Slabs(SlabsArgs),

    /// Compute the payout for an amount.
    Quote(QuoteArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "tierpay CLI starting");

    let table = match load_role_table(cli.role_table.as_deref()) {
        Ok(table) => table,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(2);
        }
    };
    let ctx = Context::new(table, cli.json);

    let result = match cli.command {
        Commands::Roles(args) => run_roles(&args, &ctx),
        Commands::Check(args) => run_check(&args, &ctx),
        Commands::Validate(args) => run_validate(&args, &ctx),
        Commands::Slabs(args) => run_slabs(&args, &ctx),
        Commands::Quote(args) => run_quote(&args, &ctx),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
