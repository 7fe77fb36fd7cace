mod client;
mod errors;
mod models;

pub use client::StorageClient;
pub use errors::StoreError;
pub use models::{NotifiedRecord, Subscription, User};
