use thiserror::Error;

/// Failure of one pipeline stage. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Forecast API unreachable or answering with a non-success status.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// Forecast payload does not have the expected shape.
    #[error("unexpected {feed} payload for spot {spot_id}: {reason}")]
    Schema {
        spot_id: String,
        feed: String,
        reason: String,
    },

    /// Database or spreadsheet write failed.
    #[error("{target} storage failed: {reason}")]
    Storage {
        target: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, EtlError>;

impl EtlError {
    pub fn request(url: impl Into<String>, reason: impl ToString) -> Self {
        EtlError::Request {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn schema(spot_id: &str, feed: &str, reason: impl ToString) -> Self {
        EtlError::Schema {
            spot_id: spot_id.to_string(),
            feed: feed.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn storage(target: &'static str, reason: impl ToString) -> Self {
        EtlError::Storage {
            target,
            reason: reason.to_string(),
        }
    }

    /// Schema errors come back identical on every attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, EtlError::Schema { .. })
    }
}

impl From<tokio_postgres::Error> for EtlError {
    fn from(err: tokio_postgres::Error) -> Self {
        EtlError::storage("postgres", err)
    }
}

impl From<bb8::RunError<tokio_postgres::Error>> for EtlError {
    fn from(err: bb8::RunError<tokio_postgres::Error>) -> Self {
        EtlError::storage("postgres", err)
    }
}
