/// Boxed error produced by caller-supplied code such as a header supplier.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Rejected input to a builder setter. The builder is left unchanged.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be non-negative")]
    NegativeTimeout(&'static str),

    #[error(
        "Unsupported compression method. Compression method must be \"none\" or one of: [{}]",
        .supported.join(",")
    )]
    UnsupportedCompression { requested: String, supported: Vec<String> },

    #[error("invalid retry policy: {0}")]
    InvalidRetryPolicy(&'static str),

    #[error("invalid header {0:?}")]
    InvalidHeader(String),
}

/// TLS material that could not be turned into a client configuration.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("invalid PEM data")]
    Pem(#[source] std::io::Error),

    #[error("no valid certificate found")]
    NoCertificates,

    #[error("no valid private key found")]
    NoPrivateKey,

    #[error("rejected certificate")]
    Certificate(#[source] rustls::Error),

    #[error("failed to assemble TLS configuration")]
    Rustls(#[from] rustls::Error),
}

/// Failure while turning the accumulated configuration into an exporter.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("invalid TLS configuration")]
    Tls(#[from] TlsError),

    #[error("failed to create HTTP client")]
    Client(#[source] reqwest::Error),
}

/// Failure of a single export call.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("header supplier failed")]
    Headers(#[source] BoxError),

    #[error("invalid header {0:?}")]
    InvalidHeader(String),

    #[error("failed to encode request")]
    Encode(#[source] std::io::Error),

    #[error("failed to compress request with {encoding}")]
    Compress {
        encoding: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl ExportError {
    pub(crate) fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Whether sending the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExportError::Status { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            ExportError::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}
