//! CLI argument parsing for the node labeler

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// GKE Node Labeler - topology and GPU failure prediction labels for Kubernetes nodes
#[derive(Debug, Parser)]
#[command(name = "labeler")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/labeler/config.yaml", global = true)]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LABELER_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Output logs in JSON format
    #[arg(long, default_value = "false", env = "LABELER_LOG_JSON", global = true)]
    pub log_json: bool,

    /// Dry run mode - log label patches but don't send them
    #[arg(long, default_value = "false", global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Keep the local node's physical topology labels up to date
    Topology {
        /// Run a single update cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Label all GPU nodes with the GPU failure prediction, once
    Predict {
        /// Google Cloud project (overrides config; discovered from the metadata server if unset)
        #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
        project_id: Option<String>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["labeler", "topology"]).unwrap();
        assert_eq!(cli.config.to_str().unwrap(), "/etc/labeler/config.yaml");
        assert_eq!(cli.log_level, "info");
        assert!(!cli.dry_run);
        assert!(matches!(cli.command, Command::Topology { once: false }));
    }

    #[test]
    fn test_cli_custom_config() {
        let cli = Cli::try_parse_from(["labeler", "-c", "/custom/config.yaml", "topology"]).unwrap();
        assert_eq!(cli.config.to_str().unwrap(), "/custom/config.yaml");
    }

    #[test]
    fn test_cli_topology_once() {
        let cli = Cli::try_parse_from(["labeler", "topology", "--once", "--dry-run"]).unwrap();
        assert!(cli.dry_run);
        assert!(matches!(cli.command, Command::Topology { once: true }));
    }

    #[test]
    fn test_cli_predict_project() {
        let cli = Cli::try_parse_from(["labeler", "predict", "--project-id", "proj"]).unwrap();
        match cli.command {
            Command::Predict { project_id } => assert_eq!(project_id.as_deref(), Some("proj")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["labeler"]).is_err());
    }
}
