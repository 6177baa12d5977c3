use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("CSV is empty or rows could not be read")]
    EmptyCsv,

    #[error("No valid rows with Artist and Title were found in CSV")]
    NoValidRows,

    #[error("Failed to parse Discogs response: {0}")]
    JsonParse(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] vault_traits::error::BridgeError),
}

pub type Result<T> = std::result::Result<T, ImportError>;
