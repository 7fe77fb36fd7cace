pub mod api;
pub mod utils;

pub use api::TwitchAPIClient;
