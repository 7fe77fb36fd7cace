use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::storage::{StorageClient, StoreError};
use crate::telegram::commands::{AddCommand, HelpCommand, ListCommand, RemoveCommand, StartCommand};
use crate::twitch::api::{LookupError, TwitchAPIClient, TwitchUser};

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Resolves a Twitch login to an existing channel.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    async fn find_channel(&self, login: &str) -> Result<Option<TwitchUser>, LookupError>;
}

#[async_trait]
impl ChannelDirectory for TwitchAPIClient {
    async fn find_channel(&self, login: &str) -> Result<Option<TwitchUser>, LookupError> {
        self.get_user_info(login).await
    }
}

pub struct CommandContext {
    pub store: Arc<StorageClient>,
    pub directory: Arc<dyn ChannelDirectory>,
    pub user_id: i64,
    pub display_name: String,
}

#[async_trait]
pub trait Command: Send + Sync {
    /// Name without the leading slash.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn usage(&self) -> &'static str {
        ""
    }

    /// Runs the command and returns the HTML reply.
    async fn execute(&self, ctx: &CommandContext, args: Vec<String>) -> Result<String, CommandError>;
}

pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut commands: Vec<Box<dyn Command>> = vec![
            Box::new(StartCommand),
            Box::new(AddCommand),
            Box::new(RemoveCommand),
            Box::new(ListCommand),
        ];
        let help = HelpCommand::new(&commands);
        commands.push(Box::new(help));

        CommandRegistry { commands }
    }

    pub fn find(&self, name: &str) -> Option<&dyn Command> {
        self.commands
            .iter()
            .find(|command| command.name().eq_ignore_ascii_case(name))
            .map(|command| command.as_ref())
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits `/cmd@bot arg1 arg2,arg3` into the command name and its arguments.
///
/// Returns `None` for plain text and for commands addressed to another bot.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<(String, Vec<String>)> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;

    let mut parts = rest.split(|c: char| c.is_whitespace() || c == ',').filter(|part| !part.is_empty());
    let head = parts.next()?;

    let name = match head.split_once('@') {
        Some((name, target)) => {
            let addressed_to_us = bot_username.map_or(true, |bot| bot.eq_ignore_ascii_case(target));
            if !addressed_to_us {
                return None;
            }
            name
        }
        None => head,
    };

    if name.is_empty() {
        return None;
    }

    Some((name.to_lowercase(), parts.map(str::to_string).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_arguments() {
        let (name, args) = parse_command("/add shroud, xqc  pokimane", None).unwrap();
        assert_eq!(name, "add");
        assert_eq!(args, vec!["shroud", "xqc", "pokimane"]);
    }

    #[test]
    fn handles_bot_mentions() {
        assert_eq!(
            parse_command("/List@NotifierBot", Some("notifierbot")),
            Some(("list".to_string(), vec![]))
        );
        assert_eq!(parse_command("/list@OtherBot", Some("notifierbot")), None);
    }

    #[test]
    fn ignores_plain_text() {
        assert_eq!(parse_command("hello there", None), None);
        assert_eq!(parse_command("/", None), None);
        assert_eq!(parse_command("/@bot", None), None);
    }

    #[test]
    fn registry_finds_all_commands() {
        let registry = CommandRegistry::new();
        for name in ["start", "help", "add", "remove", "list"] {
            assert!(registry.find(name).is_some(), "missing /{}", name);
        }
        assert!(registry.find("unknown").is_none());
    }
}
