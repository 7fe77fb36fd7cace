use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid channel name: {0:?}")]
    InvalidChannel(String),

    #[error("Corrupt timestamp in column {column}: {value}")]
    CorruptTimestamp { column: &'static str, value: i64 },
}
