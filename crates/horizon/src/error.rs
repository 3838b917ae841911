#[derive(Debug, thiserror::Error)]
pub enum HorizonError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ledger responded {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HorizonError>;
