use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::storage::StorageClient;
use crate::telegram::command_system::{parse_command, ChannelDirectory, CommandContext, CommandRegistry};
use crate::telegram::models::Message;
use crate::telegram::TelegramClient;

const RETRY_DELAY: Duration = Duration::from_secs(5);

const UNKNOWN_COMMAND_REPLY: &str = "I don't know that command. Send /help to see what I can do.";
const FAILURE_REPLY: &str = "Something went wrong on my side, please try again later.";

/// Routes incoming messages to commands. Every message from a user refreshes
/// their record in the store before the command runs.
pub struct CommandDispatcher {
    registry: CommandRegistry,
    store: Arc<StorageClient>,
    directory: Arc<dyn ChannelDirectory>,
    bot_username: Option<String>,
}

impl CommandDispatcher {
    pub fn new(
        registry: CommandRegistry,
        store: Arc<StorageClient>,
        directory: Arc<dyn ChannelDirectory>,
        bot_username: Option<String>,
    ) -> Self {
        CommandDispatcher {
            registry,
            store,
            directory,
            bot_username,
        }
    }

    /// Produces the reply for `message`, or `None` when it needs no answer.
    pub async fn dispatch(&self, message: &Message) -> Option<String> {
        let text = message.text.as_deref()?;
        let from = message.from.as_ref()?;
        if from.is_bot {
            return None;
        }

        let (name, args) = parse_command(text, self.bot_username.as_deref())?;
        let display_name = from.display_name().to_string();

        if let Err(e) = self.store.add_user(from.id, &display_name) {
            error!("Failed to register user {}: {}", from.id, e);
            return Some(FAILURE_REPLY.to_string());
        }

        let Some(command) = self.registry.find(&name) else {
            debug!("Unknown command /{} from user {}", name, from.id);
            return Some(UNKNOWN_COMMAND_REPLY.to_string());
        };

        let ctx = CommandContext {
            store: Arc::clone(&self.store),
            directory: Arc::clone(&self.directory),
            user_id: from.id,
            display_name,
        };

        info!("User {} ran /{}", from.id, name);
        match command.execute(&ctx, args).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                error!("Command /{} failed for user {}: {}", name, from.id, e);
                Some(FAILURE_REPLY.to_string())
            }
        }
    }
}

/// Long-polls Telegram for updates until `shutdown` fires. Each message is
/// handled on its own task so a slow command never stalls polling.
pub async fn run_update_loop(
    telegram: Arc<TelegramClient>,
    dispatcher: Arc<CommandDispatcher>,
    shutdown: CancellationToken,
) {
    info!("Starting Telegram update polling...");
    let mut offset: Option<i64> = None;

    loop {
        let result = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = telegram.get_updates(offset) => result,
        };

        let updates = match result {
            Ok(updates) => updates,
            Err(e) => {
                warn!("Failed to fetch Telegram updates: {}", e);
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => continue,
                }
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };

            let telegram = Arc::clone(&telegram);
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                if let Some(reply) = dispatcher.dispatch(&message).await {
                    if let Err(e) = telegram.send_message(message.chat.id, &reply).await {
                        error!("Failed to reply in chat {}: {}", message.chat.id, e);
                    }
                }
            });
        }
    }

    info!("Telegram update polling stopped.");
}
