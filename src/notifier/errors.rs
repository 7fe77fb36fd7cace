use thiserror::Error;

use crate::telegram::TelegramError;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),

    #[error("Delivery timed out")]
    Timeout,
}
