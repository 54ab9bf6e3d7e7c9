use crate::{
    compression::Compressor,
    headers::HeaderSupplier,
    retry::RetryPolicy,
    tls::TlsMaterial,
};
use metrics_exporter_otlp_http_core::Encoding;
use std::{
    fmt,
    sync::Arc,
    time::Duration,
};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:4318/v1/metrics";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A duration given to a timeout setter. Signed durations can be negative,
/// in which case the setter rejects them.
pub trait IntoTimeout {
    /// `None` if the duration is negative.
    fn into_timeout(self) -> Option<Duration>;
}

impl IntoTimeout for Duration {
    fn into_timeout(self) -> Option<Duration> {
        Some(self)
    }
}

impl IntoTimeout for chrono::TimeDelta {
    fn into_timeout(self) -> Option<Duration> {
        self.to_std().ok()
    }
}

/// The configuration an exporter was built from. Frozen at build time, later
/// changes to the builder don't affect it.
#[derive(Clone)]
pub struct ExporterConfig {
    pub(crate) endpoint: String,
    pub(crate) timeout: Duration,
    pub(crate) connect_timeout: Duration,
    pub(crate) compressor: Option<Arc<dyn Compressor>>,
    pub(crate) constant_headers: Vec<(String, String)>,
    pub(crate) header_supplier: Option<Arc<dyn HeaderSupplier>>,
    pub(crate) tls: Option<TlsMaterial>,
    pub(crate) retry_policy: Option<RetryPolicy>,
    pub(crate) encoding: Encoding,
    pub(crate) self_metrics: bool,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            compressor: None,
            constant_headers: Vec::new(),
            header_supplier: None,
            tls: None,
            retry_policy: None,
            encoding: Encoding::Protobuf,
            self_metrics: false,
        }
    }
}

impl ExporterConfig {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Maximum time to wait for the collector to process a batch. Zero means
    /// no limit.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Maximum time to wait for a connection. Zero means no limit.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// The content encoding of the configured compressor, if any.
    pub fn compression(&self) -> Option<&str> {
        self.compressor.as_deref().map(|compressor| compressor.encoding())
    }

    pub fn compressor(&self) -> Option<&Arc<dyn Compressor>> {
        self.compressor.as_ref()
    }

    pub fn constant_headers(&self) -> &[(String, String)] {
        &self.constant_headers
    }

    pub fn header_supplier(&self) -> Option<&dyn HeaderSupplier> {
        self.header_supplier.as_deref()
    }

    pub fn tls(&self) -> Option<&TlsMaterial> {
        self.tls.as_ref()
    }

    /// `None` means retries are disabled.
    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn self_metrics(&self) -> bool {
        self.self_metrics
    }
}

impl fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("compression", &self.compression())
            .field("constant_headers", &self.constant_headers)
            .field("header_supplier", &self.header_supplier.is_some())
            .field("tls", &self.tls)
            .field("retry_policy", &self.retry_policy)
            .field("encoding", &self.encoding)
            .field("self_metrics", &self.self_metrics)
            .finish()
    }
}
