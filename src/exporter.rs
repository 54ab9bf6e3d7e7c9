use crate::{
    builder::MetricExporterBuilder,
    config::ExporterConfig,
    headers::merge_headers,
    http_transport::{
        ExportRequest,
        HttpPostTransport,
        Transport,
    },
    ExportError,
};
use metrics_exporter_otlp_http_core::{
    wire::Metric,
    Aggregation,
    AggregationTemporality,
    AggregationTemporalitySelector,
    DefaultAggregationSelector,
    ExportMetricsRequest,
    InstrumentType,
    MetricBatch,
};
use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
};

/// Exports metric batches to an OTLP collector.
///
/// Immutable once built. `export` can be called concurrently from several
/// tasks; the header supplier and selectors are then invoked concurrently as
/// well.
pub struct MetricExporter<T = HttpPostTransport> {
    config: ExporterConfig,
    transport: T,
    temporality_selector: Arc<dyn AggregationTemporalitySelector>,
    aggregation_selector: Arc<dyn DefaultAggregationSelector>,
}

impl MetricExporter {
    /// Create a new builder with default settings.
    pub fn builder() -> MetricExporterBuilder {
        MetricExporterBuilder::new()
    }
}

impl<T: Transport> MetricExporter<T> {
    pub(crate) fn new(
        config: ExporterConfig,
        transport: T,
        temporality_selector: Arc<dyn AggregationTemporalitySelector>,
        aggregation_selector: Arc<dyn DefaultAggregationSelector>,
    ) -> Self {
        Self {
            config,
            transport,
            temporality_selector,
            aggregation_selector,
        }
    }

    pub fn config(&self) -> &ExporterConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn aggregation_temporality(&self, instrument_type: InstrumentType) -> AggregationTemporality {
        self.temporality_selector.aggregation_temporality(instrument_type)
    }

    pub fn default_aggregation(&self, instrument_type: InstrumentType) -> Aggregation {
        self.aggregation_selector.default_aggregation(instrument_type)
    }

    /// Send `batch` to the collector. An empty batch succeeds without
    /// contacting the collector.
    pub async fn export(&self, batch: &MetricBatch) -> Result<(), ExportError> {
        if batch.is_empty() {
            trace!("empty batch, nothing to export");
            return Ok(());
        }

        let n = batch.len();
        if self.config.self_metrics {
            metrics::counter!("otlp_exporter_seen", "type" => "metric").increment(n as u64);
        }

        let result = match self.prepare(batch) {
            Ok(request) => {
                trace!(%n, size = request.body.len(), "sending metrics");
                self.transport.send(&request).await
            }
            Err(err) => Err(err),
        };

        match &result {
            Ok(()) => {
                if self.config.self_metrics {
                    metrics::counter!("otlp_exporter_exported", "type" => "metric").increment(n as u64);
                }
            }
            Err(err) => {
                error!(?err, endpoint = %self.config.endpoint, "failed to export metrics, dropping {n} metrics");
                if self.config.self_metrics {
                    metrics::counter!("otlp_exporter_failed", "type" => "metric").increment(n as u64);
                }
            }
        }

        result
    }

    /// Resolve selectors, encode, compress and collect headers for one export
    /// call.
    fn prepare(&self, batch: &MetricBatch) -> Result<ExportRequest, ExportError> {
        let selected = batch
            .instrument_types()
            .into_iter()
            .map(|t| (t, (self.aggregation_temporality(t), self.default_aggregation(t))))
            .collect::<HashMap<_, _>>();
        let metrics = batch
            .metrics
            .iter()
            .map(|record| {
                let (temporality, aggregation) = &selected[&record.instrument_type];
                Metric::from_record(record, *temporality, aggregation)
            })
            .collect();

        let encoding = self.config.encoding;
        let mut body = ExportMetricsRequest { metrics }
            .encode_as(encoding)
            .map_err(ExportError::Encode)?;

        let content_encoding = match &self.config.compressor {
            Some(compressor) => {
                body = compressor.compress(&body).map_err(|source| ExportError::Compress {
                    encoding: compressor.encoding().to_string(),
                    source,
                })?;
                Some(compressor.encoding().to_string())
            }
            None => None,
        };

        if self.config.self_metrics {
            metrics::histogram!("otlp_exporter_payload_size").record(body.len() as f64);
        }

        let headers = merge_headers(&self.config.constant_headers, self.config.header_supplier())?;

        Ok(ExportRequest {
            body: body.into(),
            content_type: encoding.content_type(),
            content_encoding,
            headers,
        })
    }
}

impl<T: fmt::Debug> fmt::Debug for MetricExporter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricExporter")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::RecordingTransport,
        BoxError,
        HeaderSupplier,
    };
    use metrics_exporter_otlp_http_core::{
        wire::WireTemporality,
        DataPoint,
        Encoding,
        MetricRecord,
    };
    use std::{
        io::Read as _,
        sync::atomic::{
            AtomicBool,
            AtomicUsize,
            Ordering,
        },
    };

    fn batch() -> MetricBatch {
        MetricBatch::new(vec![
            MetricRecord::new("a", InstrumentType::Counter).point(DataPoint::number(1.0, 0, 1)),
            MetricRecord::new("b", InstrumentType::Counter).point(DataPoint::number(2.0, 0, 1)),
            MetricRecord::new("c", InstrumentType::Gauge).point(DataPoint::number(3.0, 0, 1)),
        ])
    }

    fn decode(request: &ExportRequest) -> ExportMetricsRequest {
        ExportMetricsRequest::decode_protobuf(&request.body).unwrap()
    }

    #[tokio::test]
    async fn selectors_run_once_per_instrument_type() {
        let calls = Arc::new(AtomicUsize::new(0));
        let transport = RecordingTransport::default();
        let exporter = MetricExporter::builder()
            .set_aggregation_temporality_selector({
                let calls = calls.clone();
                move |_: InstrumentType| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    AggregationTemporality::Delta
                }
            })
            .build_with_transport(transport.clone());

        exporter.export(&batch()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let sent = decode(&transport.requests()[0]);
        assert_eq!(sent.metrics.len(), 3);
        assert!(sent
            .metrics
            .iter()
            .all(|m| m.aggregation_temporality() == WireTemporality::Delta));
    }

    #[tokio::test]
    async fn selectors_are_consulted_on_every_export() {
        let delta = Arc::new(AtomicBool::new(false));
        let transport = RecordingTransport::default();
        let exporter = MetricExporter::builder()
            .set_aggregation_temporality_selector({
                let delta = delta.clone();
                move |_: InstrumentType| {
                    if delta.load(Ordering::SeqCst) {
                        AggregationTemporality::Delta
                    } else {
                        AggregationTemporality::Cumulative
                    }
                }
            })
            .build_with_transport(transport.clone());

        exporter.export(&batch()).await.unwrap();
        delta.store(true, Ordering::SeqCst);
        exporter.export(&batch()).await.unwrap();
        assert_eq!(exporter.aggregation_temporality(InstrumentType::Gauge), AggregationTemporality::Delta);

        let requests = transport.requests();
        assert_eq!(decode(&requests[0]).metrics[0].aggregation_temporality(), WireTemporality::Cumulative);
        assert_eq!(decode(&requests[1]).metrics[0].aggregation_temporality(), WireTemporality::Delta);
    }

    #[tokio::test]
    async fn default_aggregation_is_encoded() {
        let transport = RecordingTransport::default();
        let exporter = MetricExporter::builder().build_with_transport(transport.clone());
        exporter.export(&batch()).await.unwrap();

        let sent = decode(&transport.requests()[0]);
        let spec = sent.metrics[2].aggregation.as_ref().unwrap();
        assert_eq!(spec.kind(), metrics_exporter_otlp_http_core::wire::WireAggregationKind::LastValue);
    }

    #[tokio::test]
    async fn constant_and_supplied_headers_are_both_sent() {
        let transport = RecordingTransport::default();
        let exporter = MetricExporter::builder()
            .add_header("k", "a")
            .unwrap()
            .set_headers(|| HashMap::from([("k".to_string(), "b".to_string())]))
            .build_with_transport(transport.clone());

        exporter.export(&batch()).await.unwrap();
        let request = &transport.requests()[0];
        assert_eq!(request.header_values("k").collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(request.header_values("user-agent").count(), 1);
    }

    #[tokio::test]
    async fn header_supplier_runs_once_per_export() {
        let calls = Arc::new(AtomicUsize::new(0));
        let transport = RecordingTransport::default();
        let exporter = MetricExporter::builder()
            .set_headers({
                let calls = calls.clone();
                move || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    HashMap::from([("authorization".to_string(), format!("token-{n}"))])
                }
            })
            .build_with_transport(transport.clone());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        exporter.export(&batch()).await.unwrap();
        exporter.export(&batch()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let requests = transport.requests();
        assert_eq!(requests[0].header_values("authorization").collect::<Vec<_>>(), vec!["token-0"]);
        assert_eq!(requests[1].header_values("authorization").collect::<Vec<_>>(), vec!["token-1"]);
    }

    #[tokio::test]
    async fn failing_header_supplier_fails_the_export() {
        struct Failing;
        impl HeaderSupplier for Failing {
            fn headers(&self) -> Result<HashMap<String, String>, BoxError> {
                Err("no token".into())
            }
        }

        let transport = RecordingTransport::default();
        let exporter = MetricExporter::builder()
            .set_headers(Failing)
            .build_with_transport(transport.clone());

        let err = exporter.export(&batch()).await.unwrap_err();
        assert!(matches!(err, ExportError::Headers(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn gzip_compression() {
        let transport = RecordingTransport::default();
        let exporter = MetricExporter::builder()
            .set_compression("gzip")
            .unwrap()
            .build_with_transport(transport.clone());

        exporter.export(&batch()).await.unwrap();
        let request = &transport.requests()[0];
        assert_eq!(request.content_encoding.as_deref(), Some("gzip"));

        let mut decoded = Vec::new();
        flate2::read::GzDecoder::new(&request.body[..])
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(ExportMetricsRequest::decode_protobuf(&decoded).unwrap().metrics.len(), 3);
    }

    #[tokio::test]
    async fn json_encoding() {
        let transport = RecordingTransport::default();
        let exporter = MetricExporter::builder()
            .set_encoding(Encoding::Json)
            .build_with_transport(transport.clone());

        exporter.export(&batch()).await.unwrap();
        let request = &transport.requests()[0];
        assert_eq!(request.content_type, "application/json");
        assert!(request.content_encoding.is_none());
        assert!(std::str::from_utf8(&request.body).unwrap().contains("\"name\":\"a\""));
    }

    #[tokio::test]
    async fn empty_batch_is_not_sent() {
        let transport = RecordingTransport::default();
        let exporter = MetricExporter::builder().build_with_transport(transport.clone());
        exporter.export(&MetricBatch::default()).await.unwrap();
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn transport_errors_are_returned() {
        let transport = RecordingTransport::failing(503);
        let exporter = MetricExporter::builder().build_with_transport(transport.clone());
        let err = exporter.export(&batch()).await.unwrap_err();
        assert!(matches!(err, ExportError::Status { status: 503, .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_exports() {
        let transport = RecordingTransport::default();
        let exporter = Arc::new(MetricExporter::builder().build_with_transport(transport.clone()));

        let handles = (0..8)
            .map(|_| {
                let exporter = exporter.clone();
                tokio::spawn(async move { exporter.export(&batch()).await })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(transport.requests().len(), 8);
    }
}
