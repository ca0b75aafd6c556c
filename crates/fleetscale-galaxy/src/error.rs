use thiserror::Error;

pub type GalaxyResult<T> = Result<T, GalaxyError>;

#[derive(Debug, Error)]
pub enum GalaxyError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("galaxy returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("graphql error: {0}")]
    GraphQl(String),

    #[error("response has no data")]
    MissingData,

    #[error("application not found: {hostname}")]
    AppNotFound { hostname: String },

    #[error("invalid api key header value")]
    InvalidApiKey,

    #[error("invalid metric timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
