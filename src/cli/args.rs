//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Relax development server with live component reload
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: relax.toml)
    #[arg(short = 'C', long, default_value = "relax.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start development server with live reload
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },

    /// Load every template module and report errors
    #[command(visible_alias = "c")]
    Check {
        /// Enable verbose output
        #[arg(short = 'V', long)]
        verbose: bool,
    },
}

/// Arguments of `relax serve`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<std::net::IpAddr>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable live reload
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub reload: Option<bool>,

    /// Watch in a supervisor process and restart the server on code changes
    #[arg(short, long)]
    pub supervise: bool,

    /// Run as a worker spawned by the supervisor
    #[arg(long, hide = true)]
    pub worker: bool,

    /// Enable verbose output
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }

    pub fn serve_args(&self) -> Option<&ServeArgs> {
        match &self.command {
            Commands::Serve { args } => Some(args),
            Commands::Check { .. } => None,
        }
    }

    pub const fn verbose(&self) -> bool {
        match &self.command {
            Commands::Serve { args } => args.verbose,
            Commands::Check { verbose } => *verbose,
        }
    }
}
