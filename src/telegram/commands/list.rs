use async_trait::async_trait;

use crate::telegram::command_system::{Command, CommandContext, CommandError};

pub struct ListCommand;

#[async_trait]
impl Command for ListCommand {
    fn name(&self) -> &'static str {
        "list"
    }

    fn description(&self) -> &'static str {
        "Show the channels you follow"
    }

    async fn execute(&self, ctx: &CommandContext, _args: Vec<String>) -> Result<String, CommandError> {
        let channels = ctx.store.list_subscriptions_for_user(ctx.user_id)?;
        if channels.is_empty() {
            return Ok("You aren't following any channels yet. Use /add &lt;channel&gt; to start.".to_string());
        }

        let mut reply = format!("📺 You follow {} channel(s):\n", channels.len());
        for channel in &channels {
            // Stored names are validated logins, no escaping needed.
            reply.push_str(&format!("• <a href=\"https://twitch.tv/{0}\">{0}</a>\n", channel));
        }
        Ok(reply)
    }
}
