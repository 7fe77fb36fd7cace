mod client;
pub mod command_system;
pub mod commands;
mod errors;
pub mod handler;
pub mod html;
pub mod models;

pub use client::TelegramClient;
pub use command_system::{ChannelDirectory, CommandContext, CommandError, CommandRegistry};
pub use errors::TelegramError;
pub use handler::{run_update_loop, CommandDispatcher};
