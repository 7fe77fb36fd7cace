mod client;
mod errors;
pub mod models;
pub mod requests;

pub use client::TwitchAPIClient;
pub use errors::LookupError;
pub use models::{StreamInfo, TwitchUser};
