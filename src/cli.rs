//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pagecast static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: pagecast.toml)
    #[arg(short = 'C', long, default_value = "pagecast.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a starter pagecast.toml
    Init,

    /// Create the project folder skeleton
    Setup,

    /// Mirror the asset directories into the build folder continuously
    Watch,
}

impl Cli {
    pub fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_with_root() {
        let cli = Cli::try_parse_from(["pagecast", "--root", "/tmp/site", "watch"]).unwrap();
        assert_eq!(cli.root.as_deref(), Some(std::path::Path::new("/tmp/site")));
        assert!(matches!(cli.command, Commands::Watch));
    }

    #[test]
    fn test_parse_custom_config_name() {
        let cli = Cli::try_parse_from(["pagecast", "-C", "site.toml", "init"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(cli.is_init());
    }

    #[test]
    fn test_no_command_is_an_error() {
        assert!(Cli::try_parse_from(["pagecast"]).is_err());
    }
}
