//! Line commands for the interactive client.

use crate::error::CommandError;
use crate::locator::parse_locator;
use crate::message::Message;
use crate::model::CommentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    Toggle,
    Page,
    GoTo,
    Comment,
    Reply,
    Edit,
    Delete,
    Reload,
    Help,
    Quit,
}

#[derive(Clone)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub id: CommandId,
}

pub fn get_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            name: "t",
            usage: "t <id>",
            description: "Expand or collapse the thread containing a comment",
            id: CommandId::Toggle,
        },
        CommandSpec {
            name: "p",
            usage: "p <root-id> <page>",
            description: "Show a page of a thread's replies",
            id: CommandId::Page,
        },
        CommandSpec {
            name: "g",
            usage: "g <locator>",
            description: "Jump to a comment (#comment-<id>, commentId=<id>, or <id>)",
            id: CommandId::GoTo,
        },
        CommandSpec {
            name: "c",
            usage: "c <text>",
            description: "Post a new comment",
            id: CommandId::Comment,
        },
        CommandSpec {
            name: "r",
            usage: "r <id> <text>",
            description: "Reply to a comment",
            id: CommandId::Reply,
        },
        CommandSpec {
            name: "e",
            usage: "e <id> <text>",
            description: "Replace a comment's text",
            id: CommandId::Edit,
        },
        CommandSpec {
            name: "d",
            usage: "d <id>",
            description: "Delete a comment",
            id: CommandId::Delete,
        },
        CommandSpec {
            name: "l",
            usage: "l",
            description: "Reload comments",
            id: CommandId::Reload,
        },
        CommandSpec {
            name: "h",
            usage: "h",
            description: "Show this help",
            id: CommandId::Help,
        },
        CommandSpec {
            name: "q",
            usage: "q",
            description: "Quit",
            id: CommandId::Quit,
        },
    ]
}

/// One line per command, aligned on usage.
#[must_use]
pub fn help_text() -> String {
    let commands = get_commands();
    let width = commands.iter().map(|c| c.usage.len()).max().unwrap_or(0);
    commands
        .iter()
        .map(|c| format!("  {:width$}  {}\n", c.usage, c.description))
        .collect()
}

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns an error for unknown commands or missing/invalid arguments.
pub fn parse_command(line: &str) -> Result<Option<Message>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let Some(spec) = get_commands().into_iter().find(|c| c.name == name) else {
        return Err(CommandError::Unknown(name.to_string()));
    };
    let usage = || CommandError::Usage(spec.usage);

    let msg = match spec.id {
        CommandId::Toggle => Message::Toggle(parse_id(rest).ok_or_else(usage)?),
        CommandId::Page => {
            let (root, page) = rest.split_once(char::is_whitespace).ok_or_else(usage)?;
            Message::ChangePage {
                root: parse_id(root).ok_or_else(usage)?,
                page: page.trim().parse().map_err(|_| usage())?,
            }
        }
        CommandId::GoTo => {
            if rest.is_empty() {
                return Err(usage());
            }
            let id = parse_locator(rest).ok_or_else(|| CommandError::BadLocator(rest.to_string()))?;
            Message::GoTo(id)
        }
        CommandId::Comment => {
            if rest.is_empty() {
                return Err(usage());
            }
            Message::Create(rest.to_string())
        }
        CommandId::Reply => {
            let (parent, body) = id_and_text(rest).ok_or_else(usage)?;
            Message::Reply { parent, body }
        }
        CommandId::Edit => {
            let (id, body) = id_and_text(rest).ok_or_else(usage)?;
            Message::Edit { id, body }
        }
        CommandId::Delete => Message::Delete(parse_id(rest).ok_or_else(usage)?),
        CommandId::Reload => Message::Reload,
        CommandId::Help => Message::Help,
        CommandId::Quit => Message::Quit,
    };
    Ok(Some(msg))
}

fn parse_id(raw: &str) -> Option<CommentId> {
    raw.trim().trim_start_matches('#').parse().ok()
}

fn id_and_text(rest: &str) -> Option<(CommentId, String)> {
    let (id, body) = rest.split_once(char::is_whitespace)?;
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    Some((parse_id(id)?, body.to_string()))
}
