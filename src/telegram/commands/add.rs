use async_trait::async_trait;
use log::{info, warn};

use crate::telegram::command_system::{Command, CommandContext, CommandError};
use crate::telegram::html::escape_html;
use crate::twitch::utils::normalize_channel_name;

pub struct AddCommand;

#[async_trait]
impl Command for AddCommand {
    fn name(&self) -> &'static str {
        "add"
    }

    fn description(&self) -> &'static str {
        "Follow one or more Twitch channels"
    }

    fn usage(&self) -> &'static str {
        "<channel> [channel…]"
    }

    async fn execute(&self, ctx: &CommandContext, args: Vec<String>) -> Result<String, CommandError> {
        if args.is_empty() {
            return Ok("Usage: /add &lt;channel&gt; [channel…]\nExample: /add shroud".to_string());
        }

        let mut added = Vec::new();
        let mut already = Vec::new();
        let mut missing = Vec::new();
        let mut invalid = Vec::new();
        let mut unavailable = Vec::new();

        for arg in &args {
            let Some(login) = normalize_channel_name(arg) else {
                invalid.push(arg.clone());
                continue;
            };
            if added.contains(&login) || already.contains(&login) {
                continue;
            }

            match ctx.directory.find_channel(&login).await {
                Ok(Some(channel)) => {
                    if ctx.store.add_subscription(ctx.user_id, &channel.login)? {
                        info!("User {} subscribed to {}", ctx.user_id, channel.login);
                        added.push(channel.login);
                    } else {
                        already.push(channel.login);
                    }
                }
                Ok(None) => missing.push(login),
                Err(e) => {
                    warn!("Could not verify channel {}: {}", login, e);
                    unavailable.push(login);
                }
            }
        }

        let mut reply = String::new();
        push_section(&mut reply, "✅ Now following", &added);
        push_section(&mut reply, "ℹ️ Already following", &already);
        push_section(&mut reply, "❓ No such Twitch channel", &missing);
        push_section(&mut reply, "⚠️ Not a valid channel name", &invalid);
        push_section(&mut reply, "⏳ Couldn't reach Twitch, try again later for", &unavailable);
        Ok(reply.trim_end().to_string())
    }
}

fn push_section(reply: &mut String, title: &str, channels: &[String]) {
    if channels.is_empty() {
        return;
    }
    let names: Vec<String> = channels.iter().map(|channel| escape_html(channel)).collect();
    reply.push_str(&format!("{}: {}\n", title, names.join(", ")));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::commands::test_support::{args, context};

    #[tokio::test]
    async fn adds_existing_channels() {
        let ctx = context(1001, &["shroud", "xqc"]);

        let reply = AddCommand
            .execute(&ctx, args(&["Shroud", "https://twitch.tv/xqc"]))
            .await
            .unwrap();

        assert!(reply.contains("Now following: shroud, xqc"));
        assert_eq!(ctx.store.list_subscriptions_for_user(1001).unwrap(), vec!["shroud", "xqc"]);
    }

    #[tokio::test]
    async fn repeated_add_is_reported_not_duplicated() {
        let ctx = context(1001, &["shroud"]);
        AddCommand.execute(&ctx, args(&["shroud"])).await.unwrap();

        let reply = AddCommand.execute(&ctx, args(&["shroud", "@shroud"])).await.unwrap();

        assert_eq!(reply, "ℹ️ Already following: shroud");
        assert_eq!(ctx.store.get_all_subscriptions().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reports_unknown_invalid_and_unreachable_channels() {
        let ctx = context(1001, &["shroud"]);

        let reply = AddCommand
            .execute(&ctx, args(&["nobody_here", "bad-name", "broken", "shroud"]))
            .await
            .unwrap();

        assert!(reply.contains("Now following: shroud"));
        assert!(reply.contains("No such Twitch channel: nobody_here"));
        assert!(reply.contains("Not a valid channel name: bad-name"));
        assert!(reply.contains("try again later for: broken"));
        assert_eq!(ctx.store.list_subscriptions_for_user(1001).unwrap(), vec!["shroud"]);
    }

    #[tokio::test]
    async fn shows_usage_without_arguments() {
        let ctx = context(1001, &[]);
        let reply = AddCommand.execute(&ctx, vec![]).await.unwrap();
        assert!(reply.starts_with("Usage: /add"));
    }
}
