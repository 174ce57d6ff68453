use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },
    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid api base address '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl ClientError {
    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ClientError::Rejected { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("sku must not be empty")]
    MissingSku,
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ControllerError {
    pub fn client(&self) -> Option<&ClientError> {
        match self {
            ControllerError::Client(err) => Some(err),
            ControllerError::MissingSku => None,
        }
    }
}
