use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowlinkError {
    #[error("Resolution failed for {host}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no such host: {0}")]
    NoSuchHost(String),

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("got non 200 status code {0}")]
    Status(u16),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlowlinkError {
    /// Returns the underlying IO error kind for connection-level failures.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            FlowlinkError::Resolution { source, .. }
            | FlowlinkError::Connect { source, .. }
            | FlowlinkError::Io(source) => Some(source.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowlinkError>;
