use thiserror::Error;

#[derive(Debug, Error)]
pub enum GleanError {
    #[error("rate limited by {endpoint}")]
    RateLimited { endpoint: String },

    #[error("upstream error from {endpoint}: {message}")]
    Upstream {
        endpoint: String,
        message: String,
        status: Option<u16>,
    },

    #[error("auth failed for {endpoint}: {message}")]
    AuthFailed { endpoint: String, message: String },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("cannot read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl GleanError {
    /// Endpoint host for errors raised while talking to the remote endpoint.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::RateLimited { endpoint } => Some(endpoint),
            Self::Upstream { endpoint, .. } => Some(endpoint),
            Self::AuthFailed { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }

    /// True for failures of the HTTP exchange itself, as opposed to bad input.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Upstream { .. }
                | Self::AuthFailed { .. }
                | Self::Request(_)
        )
    }

    /// Produce a sanitized error message safe for showing to the user.
    /// Does not leak endpoint URLs, connection details, or upstream error bodies.
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited { .. } => "analysis endpoint is rate limiting requests".to_string(),
            Self::Upstream { status, .. } => match status {
                Some(code) => format!("analysis endpoint request failed with status {code}"),
                None => "analysis endpoint returned an unusable response".to_string(),
            },
            Self::AuthFailed { .. } => "analysis endpoint rejected the credentials".to_string(),
            Self::Request(e) if e.is_timeout() => "analysis endpoint timed out".to_string(),
            Self::Request(_) => "request to analysis endpoint failed".to_string(),
            Self::FileRead { path, .. } => format!("cannot read file: {path}"),
            Self::FileWrite { path, .. } => format!("cannot write file: {path}"),
            Self::UnsupportedFormat(ext) => format!("unsupported file format: {ext}"),
            Self::Spreadsheet(msg) => format!("spreadsheet could not be read: {msg}"),
            Self::InsufficientData(msg) => format!("insufficient data in file: {msg}"),
            Self::Config(msg) => format!("configuration error: {msg}"),
            Self::Other(msg) => msg.clone(),
        }
    }
}
