use crate::conversation::{Conversation, ConversationStore, Message, Role};
use crate::error::{ChatkeepError, Result};
use colored::Colorize;
use prettytable::{format, Table};

/// Widest title shown in the list table, in characters
const LIST_TITLE_WIDTH: usize = 40;

/// Print every conversation, newest first
pub fn list(store: &ConversationStore) {
    let conversations = store.conversations();
    if conversations.is_empty() {
        println!("{}", "No conversations stored.".yellow());
        return;
    }

    println!("\nConversations:");
    conversation_table(conversations, store.selected_id()).printstd();
    println!();
    println!("Use {} to read one.", "chatkeep show <ID>".cyan());
    println!();
}

/// Build the list table; the selected row is marked with `*`
pub fn conversation_table(conversations: &[Conversation], selected: Option<&str>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "",
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for conversation in conversations {
        let marker = if selected == Some(conversation.id.as_str()) {
            "*"
        } else {
            ""
        };
        let updated = conversation.updated_at.format("%Y-%m-%d %H:%M").to_string();

        table.add_row(prettytable::row![
            marker,
            conversation.id.cyan(),
            shorten(&conversation.title, LIST_TITLE_WIDTH),
            conversation.messages.len(),
            updated
        ]);
    }

    table
}

fn shorten(title: &str, width: usize) -> String {
    if title.chars().count() > width {
        let head: String = title.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

/// Create a conversation and print its id
pub fn create(store: &mut ConversationStore) -> String {
    let id = store.create();
    println!("{} {}", "Created conversation".green(), id.cyan());
    id
}

/// Print one conversation; `None` shows the selected one
///
/// # Errors
///
/// Returns `ChatkeepError::NotFound` for an unknown id
pub fn show(store: &ConversationStore, id: Option<&str>) -> Result<()> {
    let conversation = match id {
        Some(id) => store.get(id),
        None => store.current(),
    }
    .ok_or_else(|| ChatkeepError::NotFound(id.unwrap_or("<selected>").to_string()))?;

    println!("\n{} ({})", conversation.title.bold(), conversation.id.cyan());
    println!(
        "Created {}, updated {}\n",
        conversation.created_at.format("%Y-%m-%d %H:%M"),
        conversation.updated_at.format("%Y-%m-%d %H:%M")
    );

    if conversation.messages.is_empty() {
        println!("{}", "No messages yet.".yellow());
    }

    for message in &conversation.messages {
        let speaker = match message.role {
            Role::User => "user".green().bold(),
            Role::Assistant => "assistant".blue().bold(),
        };
        println!(
            "[{}] {}: {}",
            message.timestamp.format("%H:%M:%S"),
            speaker,
            message.content
        );

        for attachment in store.attachments_for(&message.id) {
            println!("    {} {}", "attachment:".dimmed(), attachment.name);
        }
    }
    println!();

    Ok(())
}

/// Append one message to a conversation
///
/// # Errors
///
/// Returns `ChatkeepError::NotFound` for an unknown id and
/// `ChatkeepError::Config` for an unknown role
pub fn say(store: &mut ConversationStore, id: &str, content: &str, role: &str) -> Result<()> {
    let role: Role = role.parse().map_err(ChatkeepError::Config)?;
    let mut messages = store
        .get(id)
        .ok_or_else(|| ChatkeepError::NotFound(id.to_string()))?
        .messages
        .clone();

    messages.push(Message::new(role, content));
    store.update(id, messages);

    if let Some(conversation) = store.get(id) {
        println!(
            "{} {} ({} messages)",
            "Updated".green(),
            conversation.title,
            conversation.messages.len()
        );
    }
    Ok(())
}

/// Set a conversation title
///
/// # Errors
///
/// Returns `ChatkeepError::NotFound` for an unknown id
pub fn rename(store: &mut ConversationStore, id: &str, title: &str) -> Result<()> {
    if !store.rename(id, title) {
        return Err(ChatkeepError::NotFound(id.to_string()).into());
    }
    println!("{}", format!("Renamed {} to {}", id, title).green());
    Ok(())
}

/// Delete a conversation
///
/// # Errors
///
/// Returns `ChatkeepError::NotFound` for an unknown id
pub fn delete(store: &mut ConversationStore, id: &str) -> Result<()> {
    if !store.delete(id) {
        return Err(ChatkeepError::NotFound(id.to_string()).into());
    }
    println!("{}", format!("Deleted conversation {}", id).green());
    Ok(())
}
