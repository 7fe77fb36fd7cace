use async_trait::async_trait;
use log::info;

use crate::telegram::command_system::{Command, CommandContext, CommandError};
use crate::telegram::html::escape_html;
use crate::twitch::utils::normalize_channel_name;

pub struct RemoveCommand;

#[async_trait]
impl Command for RemoveCommand {
    fn name(&self) -> &'static str {
        "remove"
    }

    fn description(&self) -> &'static str {
        "Stop following Twitch channels"
    }

    fn usage(&self) -> &'static str {
        "<channel> [channel…]"
    }

    async fn execute(&self, ctx: &CommandContext, args: Vec<String>) -> Result<String, CommandError> {
        if args.is_empty() {
            return Ok("Usage: /remove &lt;channel&gt; [channel…]".to_string());
        }

        let mut removed = Vec::new();
        let mut not_followed = Vec::new();

        for arg in &args {
            let channel = normalize_channel_name(arg).unwrap_or_else(|| arg.trim().to_lowercase());
            if channel.is_empty() || removed.contains(&channel) {
                continue;
            }

            if ctx.store.remove_subscription(ctx.user_id, &channel)? {
                info!("User {} unsubscribed from {}", ctx.user_id, channel);
                removed.push(channel);
            } else {
                not_followed.push(escape_html(&channel));
            }
        }

        let mut reply = String::new();
        if !removed.is_empty() {
            reply.push_str(&format!("🗑 Stopped following: {}\n", removed.join(", ")));
        }
        if !not_followed.is_empty() {
            reply.push_str(&format!("ℹ️ You weren't following: {}\n", not_followed.join(", ")));
        }
        Ok(reply.trim_end().to_string())
    }
}
