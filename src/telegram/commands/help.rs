use async_trait::async_trait;

use crate::telegram::command_system::{Command, CommandContext, CommandError};
use crate::telegram::html::escape_html;

pub struct HelpCommand {
    text: String,
}

impl HelpCommand {
    pub fn new(commands: &[Box<dyn Command>]) -> Self {
        let mut text = String::from("<b>Available commands</b>\n");
        for command in commands {
            text.push_str(&command_line(command.name(), command.usage(), command.description()));
        }
        text.push_str(&command_line("help", "", "Show this message"));
        HelpCommand { text }
    }
}

fn command_line(name: &str, usage: &str, description: &str) -> String {
    if usage.is_empty() {
        format!("/{} - {}\n", name, escape_html(description))
    } else {
        format!("/{} {} - {}\n", name, escape_html(usage), escape_html(description))
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        "Show this message"
    }

    async fn execute(&self, _ctx: &CommandContext, _args: Vec<String>) -> Result<String, CommandError> {
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::command_system::CommandRegistry;
    use crate::telegram::commands::test_support::context;

    #[tokio::test]
    async fn lists_every_command() {
        let registry = CommandRegistry::new();
        let help = registry.find("help").unwrap();

        let reply = help.execute(&context(1, &[]), vec![]).await.unwrap();
        for name in ["/start", "/add &lt;channel&gt;", "/remove", "/list", "/help"] {
            assert!(reply.contains(name), "help is missing {}", name);
        }
    }
}
