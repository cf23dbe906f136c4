/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `conversations` lists, shows and edits stored conversations
- `sync` runs or probes the remote history endpoint
- `identity` prints the identity cookies

Handlers print to stdout and leave process setup to `main`.
*/

use crate::conversation::ConversationStore;
use crate::error::Result;
use colored::Colorize;

// Conversation listing and editing
pub mod conversations;

// Remote history command handlers
pub mod sync {
    //! Startup and on-demand history sync.

    use super::*;
    use crate::sync::{SyncManager, SyncOutcome};

    /// Run the one-shot sync and report the outcome
    ///
    /// Returns the outcome so callers can decide whether to keep going.
    pub async fn run_sync(manager: &SyncManager, store: &mut ConversationStore) -> SyncOutcome {
        let outcome = manager.run(store).await;
        match &outcome {
            SyncOutcome::Replaced { .. } => println!("{}", outcome.to_string().green()),
            SyncOutcome::Failed(_) | SyncOutcome::Malformed(_) => {
                println!("{}", outcome.to_string().yellow())
            }
            _ => println!("{}", outcome),
        }
        outcome
    }

    /// Probe the configured endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint is configured or it is unreachable
    pub async fn check(manager: &SyncManager) -> Result<()> {
        let status = manager.probe().await?;
        println!(
            "{} {}",
            "History endpoint reachable:".green(),
            status.as_u16()
        );
        Ok(())
    }
}

// Identity cookie inspection
pub mod identity {
    //! Read-only view of the identity cookies.

    use super::*;
    use crate::identity::AnonymousSession;

    /// Print the anonymous session id and the registered conversation ids
    ///
    /// # Errors
    ///
    /// Returns an error if a new session id cannot be stored
    pub fn show_registry(store: &ConversationStore, session: &AnonymousSession) -> Result<()> {
        let session_id = session.id()?;
        let ids = store.registry().list();

        println!("\n{} {}", "Anonymous session:".bold(), session_id.cyan());
        println!("{} ({})", "Registered conversations".bold(), ids.len());
        for id in &ids {
            let marker = if store.selected_id() == Some(id.as_str()) {
                "*"
            } else {
                " "
            };
            println!(" {} {}", marker, id);
        }
        println!();
        Ok(())
    }
}
