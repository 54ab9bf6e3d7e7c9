/*!

# metrics-exporter-otlp-http

An exporter that ships metric batches to an [OTLP](https://opentelemetry.io/docs/specs/otlp/) collector over HTTP.

[`MetricExporterBuilder`] collects and validates the configuration: endpoint, timeouts, compression, constant and
dynamic headers, TLS material, retry policy and the two per-instrument selectors. [`MetricExporterBuilder::build`]
freezes it into a [`MetricExporter`] that can be shared between tasks and called for every batch.

- Header values are additive. A key set with [`MetricExporterBuilder::add_header`] and returned by the supplier
  installed with [`MetricExporterBuilder::set_headers`] is sent with both values.
- Of the TLS setters, the one called last wins.
- Temporality and default aggregation are looked up on every export, not at build time.

Example:

```rust,no_run
use metrics_exporter_otlp_http::{DeltaPreferred, MetricExporter, RetryPolicy};
use std::{collections::HashMap, time::Duration};

# async fn run(batch: metrics_exporter_otlp_http::MetricBatch) -> Result<(), Box<dyn std::error::Error>> {
let mut builder = MetricExporter::builder();
builder
    .set_endpoint("https://collector.example.com:4318/v1/metrics")
    .set_timeout(Duration::from_secs(5))?
    .set_compression("gzip")?
    .add_header("x-tenant", "acme")?
    .set_headers(|| HashMap::from([("authorization".to_string(), "Bearer token".to_string())]))
    .set_aggregation_temporality_selector(DeltaPreferred)
    .set_retry_policy(RetryPolicy::default());

let exporter = builder.build()?;
exporter.export(&batch).await?;
# Ok(())
# }
```

*/

mod builder;
pub mod compression;
mod config;
mod error;
mod exporter;
mod headers;
mod http_transport;
mod retry;
#[cfg(test)]
mod testing;
mod tls;

pub use builder::MetricExporterBuilder;
pub use compression::{
    Compressor,
    CompressorRegistry,
};
pub use config::{
    ExporterConfig,
    IntoTimeout,
    DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_ENDPOINT,
    DEFAULT_TIMEOUT,
};
pub use error::{
    BoxError,
    BuildError,
    ConfigError,
    ExportError,
    TlsError,
};
pub use exporter::MetricExporter;
pub use headers::{
    merge_headers,
    HeaderSupplier,
};
pub use http_transport::{
    ExportRequest,
    HttpPostTransport,
    Transport,
};
pub use metrics_exporter_otlp_http_core::{
    selector,
    wire,
    Aggregation,
    AggregationTemporality,
    AggregationTemporalitySelector,
    AlwaysCumulative,
    DataPoint,
    DefaultAggregationSelector,
    DeltaPreferred,
    Encoding,
    InstrumentType,
    LowMemory,
    MetricBatch,
    MetricRecord,
    PointValue,
    StandardAggregation,
};
pub use retry::{
    RetryPolicy,
    RetryPolicyBuilder,
};
pub use tls::TlsMaterial;

#[macro_use]
extern crate tracing;
