//! Command-line interface definition for Chatkeep
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to inspect and edit the local conversation store.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chatkeep - local conversation store with one-shot remote sync
///
/// Conversations are kept in a local key-value store and mirrored into a
/// cookie jar. When a history endpoint is configured, the remote copy
/// replaces local state once at startup.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatkeep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Skip the startup sync
    #[arg(long)]
    pub no_sync: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Chatkeep
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// List conversations, newest first
    List,

    /// Start a new conversation and select it
    New,

    /// Show the messages of a conversation
    Show {
        /// Conversation id (defaults to the selected conversation)
        id: Option<String>,
    },

    /// Append a message to a conversation
    Say {
        /// Conversation id
        id: String,

        /// Message text
        content: String,

        /// Author role (user, assistant)
        #[arg(short, long, default_value = "user")]
        role: String,
    },

    /// Rename a conversation
    Rename {
        /// Conversation id
        id: String,

        /// New title
        title: String,
    },

    /// Delete a conversation
    Delete {
        /// Conversation id
        id: String,
    },

    /// Replace local conversations with the remote history
    Sync,

    /// Check that the history endpoint is reachable
    Check,

    /// Show the identity cookies
    Registry,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether the startup sync should run before `command`
    pub fn wants_startup_sync(&self) -> bool {
        !self.no_sync && !matches!(self.command, Commands::Sync | Commands::Check)
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            data_dir: None,
            verbose: false,
            no_sync: false,
            command: Commands::List,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(!cli.no_sync);
        assert_eq!(cli.command, Commands::List);
    }

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::try_parse_from(["chatkeep", "list"]).unwrap();
        assert_eq!(cli.command, Commands::List);
        assert!(cli.wants_startup_sync());
    }

    #[test]
    fn test_cli_parse_show_without_id() {
        let cli = Cli::try_parse_from(["chatkeep", "show"]).unwrap();
        assert_eq!(cli.command, Commands::Show { id: None });
    }

    #[test]
    fn test_cli_parse_say_with_role() {
        let cli =
            Cli::try_parse_from(["chatkeep", "say", "abc", "hello there", "--role", "assistant"])
                .unwrap();
        if let Commands::Say { id, content, role } = cli.command {
            assert_eq!(id, "abc");
            assert_eq!(content, "hello there");
            assert_eq!(role, "assistant");
        } else {
            panic!("Expected Say command");
        }
    }

    #[test]
    fn test_cli_parse_say_default_role() {
        let cli = Cli::try_parse_from(["chatkeep", "say", "abc", "hi"]).unwrap();
        if let Commands::Say { role, .. } = cli.command {
            assert_eq!(role, "user");
        } else {
            panic!("Expected Say command");
        }
    }

    #[test]
    fn test_cli_parse_rename() {
        let cli = Cli::try_parse_from(["chatkeep", "rename", "abc", "Trip plans"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Rename {
                id: "abc".to_string(),
                title: "Trip plans".to_string()
            }
        );
    }

    #[test]
    fn test_cli_parse_delete_requires_id() {
        assert!(Cli::try_parse_from(["chatkeep", "delete"]).is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "chatkeep",
            "--no-sync",
            "--verbose",
            "--data-dir",
            "/tmp/ck",
            "--config",
            "custom.yaml",
            "registry",
        ])
        .unwrap();
        assert!(cli.no_sync);
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/ck")));
        assert_eq!(cli.config, Some("custom.yaml".to_string()));
        assert!(!cli.wants_startup_sync());
    }

    #[test]
    fn test_sync_and_check_skip_startup_sync() {
        let sync = Cli::try_parse_from(["chatkeep", "sync"]).unwrap();
        let check = Cli::try_parse_from(["chatkeep", "check"]).unwrap();
        assert!(!sync.wants_startup_sync());
        assert!(!check.wants_startup_sync());
    }

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["chatkeep"]).is_err());
    }
}
