use async_trait::async_trait;

use crate::telegram::command_system::{Command, CommandContext, CommandError};
use crate::telegram::html::escape_html;

pub struct StartCommand;

#[async_trait]
impl Command for StartCommand {
    fn name(&self) -> &'static str {
        "start"
    }

    fn description(&self) -> &'static str {
        "Register and show the welcome message"
    }

    async fn execute(&self, ctx: &CommandContext, _args: Vec<String>) -> Result<String, CommandError> {
        Ok(format!(
            "👋 Hi, <b>{}</b>!\n\n\
             I'll message you whenever a Twitch channel you follow goes live.\n\n\
             • /add &lt;channel&gt; to follow a channel\n\
             • /remove &lt;channel&gt; to stop following it\n\
             • /list to see what you follow\n\
             • /help for the full command list",
            escape_html(&ctx.display_name)
        ))
    }
}
