use thiserror::Error;

/// Core errors for the exporter
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Cluster API error: {0}")]
    Api(String),

    #[error("Unexpected cluster status entry type: {0}")]
    UnexpectedStatusType(String),

    #[error("Malformed cluster API response: {0}")]
    MalformedResponse(String),

    #[error("Host probe error: {0}")]
    Probe(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn api<S: Into<String>>(msg: S) -> Self {
        Self::Api(msg.into())
    }

    pub fn unexpected_status_type<S: Into<String>>(tag: S) -> Self {
        Self::UnexpectedStatusType(tag.into())
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn probe<S: Into<String>>(msg: S) -> Self {
        Self::Probe(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
