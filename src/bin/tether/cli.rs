//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Tether - links the packages of a JavaScript monorepo together
#[derive(Parser)]
#[command(name = "tether")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Workspace root (defaults to the nearest directory with tether.toml)
    #[arg(long, global = true, env = "TETHER_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Link local packages together and install external dependencies
    Bootstrap(BootstrapArgs),

    /// Show what bootstrap would install and link, without changing anything
    Plan(PlanArgs),

    /// List the packages of the workspace
    Ls(LsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by `bootstrap` and `plan`.
#[derive(Args, Clone)]
pub struct StrategyArgs {
    /// Bootstrap strategy, `<local>[:<external>]` (e.g. `default:root`)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Skip packages whose name matches this glob
    #[arg(long)]
    pub ignore: Option<String>,
}

#[derive(Args)]
pub struct BootstrapArgs {
    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Maximum number of concurrent actions (0 = unbounded)
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// npm-compatible client used to install external dependencies
    #[arg(long, env = "TETHER_NPM_CLIENT")]
    pub npm_client: Option<String>,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct LsArgs {
    /// Print the packages as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bootstrap() {
        let cli = Cli::try_parse_from([
            "tether",
            "bootstrap",
            "--strategy",
            "link:root",
            "-j",
            "2",
            "--root",
            "/ws",
        ])
        .unwrap();

        assert_eq!(cli.root, Some(PathBuf::from("/ws")));
        match cli.command {
            Commands::Bootstrap(args) => {
                assert_eq!(args.strategy.strategy.as_deref(), Some("link:root"));
                assert_eq!(args.concurrency, Some(2));
            }
            _ => panic!("expected bootstrap"),
        }
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["tether", "-v", "-q", "ls"]).is_err());
    }
}
