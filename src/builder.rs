use crate::{
    compression::CompressorRegistry,
    config::{
        ExporterConfig,
        IntoTimeout,
    },
    exporter::MetricExporter,
    headers::{
        check_header,
        HeaderSupplier,
        USER_AGENT,
    },
    http_transport::{
        HttpPostTransport,
        Transport,
    },
    retry::RetryPolicy,
    tls::TlsMaterial,
    BuildError,
    ConfigError,
};
use metrics_exporter_otlp_http_core::{
    AggregationTemporalitySelector,
    AlwaysCumulative,
    DefaultAggregationSelector,
    Encoding,
    StandardAggregation,
};
use std::{
    fmt,
    sync::Arc,
};

/// A builder for a [`MetricExporter`].
///
/// Setters validate their input immediately and leave the builder untouched
/// when they fail. [`build`](Self::build) snapshots the configuration, so the
/// builder can keep being changed and used for further exporters. That is why
/// setters take `&mut self` instead of consuming the builder.
pub struct MetricExporterBuilder {
    config: ExporterConfig,
    compressors: CompressorRegistry,
    temporality_selector: Arc<dyn AggregationTemporalitySelector>,
    aggregation_selector: Arc<dyn DefaultAggregationSelector>,
}

impl Default for MetricExporterBuilder {
    fn default() -> Self {
        let mut config = ExporterConfig::default();
        config
            .constant_headers
            .push(("User-Agent".to_string(), USER_AGENT.to_string()));

        Self {
            config,
            compressors: CompressorRegistry::builtin(),
            temporality_selector: Arc::new(AlwaysCumulative),
            aggregation_selector: Arc::new(StandardAggregation),
        }
    }
}

impl MetricExporterBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Default::default()
    }

    /// The configuration accumulated so far.
    pub fn config(&self) -> &ExporterConfig {
        &self.config
    }

    /// Maximum time to wait for the collector to process an exported batch.
    /// Defaults to 10s, zero disables the limit.
    pub fn set_timeout(&mut self, timeout: impl IntoTimeout) -> Result<&mut Self, ConfigError> {
        self.config.timeout = timeout
            .into_timeout()
            .ok_or(ConfigError::NegativeTimeout("timeout"))?;
        Ok(self)
    }

    /// Maximum time to wait for new connections to be established. Defaults
    /// to 10s, zero disables the limit.
    pub fn set_connect_timeout(&mut self, timeout: impl IntoTimeout) -> Result<&mut Self, ConfigError> {
        self.config.connect_timeout = timeout
            .into_timeout()
            .ok_or(ConfigError::NegativeTimeout("connect timeout"))?;
        Ok(self)
    }

    /// The collector endpoint, including the full path, e.g.
    /// `http://localhost:4318/v1/metrics` (the default). Checked when the
    /// exporter is built.
    pub fn set_endpoint(&mut self, endpoint: impl ToString) -> &mut Self {
        self.config.endpoint = endpoint.to_string();
        self
    }

    /// `"none"` disables compression, any other name has to be registered in
    /// the compressor registry.
    pub fn set_compression(&mut self, method: &str) -> Result<&mut Self, ConfigError> {
        if method == "none" {
            self.config.compressor = None;
            return Ok(self);
        }
        let compressor = self
            .compressors
            .resolve(method)
            .ok_or_else(|| ConfigError::UnsupportedCompression {
                requested: method.to_string(),
                supported: self.compressors.supported_names(),
            })?;
        self.config.compressor = Some(compressor);
        Ok(self)
    }

    /// Replaces the registry [`set_compression`](Self::set_compression) looks
    /// names up in. An already selected compressor stays selected.
    pub fn set_compressor_registry(&mut self, registry: CompressorRegistry) -> &mut Self {
        self.compressors = registry;
        self
    }

    /// Adds a constant header. Values of repeated keys, here or from the
    /// header supplier, are all sent. Names and values that cannot be sent
    /// over HTTP are rejected.
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<&mut Self, ConfigError> {
        let (key, value) = (key.into(), value.into());
        check_header(&key, &value)?;
        self.config.constant_headers.push((key, value));
        Ok(self)
    }

    /// Sets the supplier of headers evaluated on every export. Keys colliding
    /// with constant headers are sent with both values.
    pub fn set_headers(&mut self, supplier: impl HeaderSupplier + 'static) -> &mut Self {
        self.config.header_supplier = Some(Arc::new(supplier));
        self
    }

    /// PEM encoded certificates to verify the collector with instead of the
    /// default roots. Replaces any other TLS setting.
    pub fn set_trusted_certificates(&mut self, pem: impl Into<Vec<u8>>) -> &mut Self {
        self.config.tls = Some(TlsMaterial::TrustedCertificates(pem.into()));
        self
    }

    /// PEM encoded client key and certificate chain for mutual TLS. Replaces
    /// any other TLS setting.
    pub fn set_client_tls(
        &mut self,
        private_key_pem: impl Into<Vec<u8>>,
        certificate_pem: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.config.tls = Some(TlsMaterial::ClientIdentity {
            private_key_pem: private_key_pem.into(),
            certificate_pem: certificate_pem.into(),
        });
        self
    }

    /// A ready-made rustls configuration, used as is. Replaces any other TLS
    /// setting.
    pub fn set_tls_config(&mut self, config: impl Into<Arc<rustls::ClientConfig>>) -> &mut Self {
        self.config.tls = Some(TlsMaterial::Preconfigured(config.into()));
        self
    }

    /// Defaults to [`AlwaysCumulative`].
    /// [`DeltaPreferred`](metrics_exporter_otlp_http_core::DeltaPreferred) is
    /// common for delta backends.
    pub fn set_aggregation_temporality_selector(
        &mut self,
        selector: impl AggregationTemporalitySelector + 'static,
    ) -> &mut Self {
        self.temporality_selector = Arc::new(selector);
        self
    }

    /// Defaults to [`StandardAggregation`].
    pub fn set_default_aggregation_selector(&mut self, selector: impl DefaultAggregationSelector + 'static) -> &mut Self {
        self.aggregation_selector = Arc::new(selector);
        self
    }

    /// Retries are disabled unless a policy is set.
    pub fn set_retry_policy(&mut self, policy: RetryPolicy) -> &mut Self {
        self.config.retry_policy = Some(policy);
        self
    }

    /// Protobuf (the default) or JSON request bodies.
    pub fn set_encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.config.encoding = encoding;
        self
    }

    /// Whether to report the exporter's own activity through the `metrics`
    /// facade. Off by default.
    pub fn set_self_metrics(&mut self, enabled: bool) -> &mut Self {
        self.config.self_metrics = enabled;
        self
    }

    /// Create an exporter sending over HTTP.
    pub fn build(&self) -> Result<MetricExporter, BuildError> {
        let transport = HttpPostTransport::new(&self.config)?;
        Ok(self.build_with_transport(transport))
    }

    /// Create an exporter sending through `transport`.
    pub fn build_with_transport<T: Transport>(&self, transport: T) -> MetricExporter<T> {
        let config = self.config.clone();
        debug!(
            endpoint = %config.endpoint(),
            compression = ?config.compression(),
            retry = config.retry_policy().is_some(),
            "building metric exporter"
        );
        MetricExporter::new(
            config,
            transport,
            self.temporality_selector.clone(),
            self.aggregation_selector.clone(),
        )
    }
}

impl fmt::Debug for MetricExporterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricExporterBuilder")
            .field("config", &self.config)
            .field("compressors", &self.compressors)
            .finish_non_exhaustive()
    }
}
