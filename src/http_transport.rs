use crate::{
    config::ExporterConfig,
    retry::RetryPolicy,
    BuildError,
    ExportError,
};
use backon::Retryable as _;
use bytes::Bytes;
use reqwest::{
    header::{
        HeaderMap,
        HeaderName,
        HeaderValue,
        CONTENT_ENCODING,
        CONTENT_TYPE,
    },
    Url,
};
use std::future::Future;

/// Ships encoded requests to the collector.
pub trait Transport: Send + Sync {
    fn send(&self, request: &ExportRequest) -> impl Future<Output = Result<(), ExportError>> + Send;
}

/// An encoded, possibly compressed batch plus the headers of one export call.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub body: Bytes,
    pub content_type: &'static str,
    pub content_encoding: Option<String>,
    /// Merged header list. A key may appear more than once.
    pub headers: Vec<(String, String)>,
}

impl ExportRequest {
    /// All values sent for `key`, in order.
    pub fn header_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

/// POSTs requests with reqwest, retrying according to the configured
/// [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct HttpPostTransport {
    client: reqwest::Client,
    endpoint: Url,
    retry_policy: Option<RetryPolicy>,
}

impl HttpPostTransport {
    pub fn new(config: &ExporterConfig) -> Result<Self, BuildError> {
        let endpoint = parse_endpoint(config.endpoint())?;

        let mut builder = reqwest::Client::builder();
        if !config.timeout().is_zero() {
            builder = builder.timeout(config.timeout());
        }
        if !config.connect_timeout().is_zero() {
            builder = builder.connect_timeout(config.connect_timeout());
        }
        if let Some(tls) = config.tls() {
            builder = builder.use_preconfigured_tls(tls.client_config()?);
        }
        let client = builder.build().map_err(BuildError::Client)?;

        Ok(Self {
            client,
            endpoint,
            retry_policy: config.retry_policy().cloned(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send_once(&self, request: &ExportRequest) -> Result<(), ExportError> {
        let mut headers = HeaderMap::with_capacity(request.headers.len() + 2);
        for (key, value) in &request.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| ExportError::InvalidHeader(key.clone()))?;
            let value = HeaderValue::from_str(value).map_err(|_| ExportError::InvalidHeader(key.clone()))?;
            headers.append(name, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(request.content_type));
        if let Some(encoding) = &request.content_encoding {
            let value = HeaderValue::from_str(encoding).map_err(|_| ExportError::InvalidHeader(encoding.clone()))?;
            headers.insert(CONTENT_ENCODING, value);
        }

        let res = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ExportError::status(status.as_u16(), text));
        }

        Ok(())
    }
}

impl Transport for HttpPostTransport {
    async fn send(&self, request: &ExportRequest) -> Result<(), ExportError> {
        let Some(policy) = &self.retry_policy else {
            return self.send_once(request).await;
        };

        (|| self.send_once(request))
            .retry(policy.backoff())
            .when(ExportError::is_retryable)
            .notify(|err, backoff| {
                warn!(?err, endpoint = %self.endpoint, "failed to send metrics, retrying in {backoff:?}");
            })
            .await
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, BuildError> {
    let invalid = |reason: String| BuildError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(format!("unsupported scheme {scheme:?}, must be http or https"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_must_be_http_url() {
        assert!(parse_endpoint("http://localhost:4318/v1/metrics").is_ok());
        assert!(parse_endpoint("https://collector.example.com/v1/metrics").is_ok());
        assert!(matches!(
            parse_endpoint("localhost:4318"),
            Err(BuildError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            parse_endpoint("ftp://localhost/v1/metrics"),
            Err(BuildError::InvalidEndpoint { reason, .. }) if reason.contains("ftp")
        ));
        assert!(parse_endpoint("not a url").is_err());
    }

    #[test]
    fn header_values_are_case_insensitive() {
        let request = ExportRequest {
            body: Bytes::new(),
            content_type: "application/x-protobuf",
            content_encoding: None,
            headers: vec![
                ("K".to_string(), "a".to_string()),
                ("other".to_string(), "x".to_string()),
                ("k".to_string(), "b".to_string()),
            ],
        };
        assert_eq!(request.header_values("k").collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn transport_uses_configured_endpoint() {
        let config = ExporterConfig {
            endpoint: "http://127.0.0.1:4318/v1/metrics".to_string(),
            ..Default::default()
        };
        let transport = HttpPostTransport::new(&config).unwrap();
        assert_eq!(transport.endpoint().path(), "/v1/metrics");
    }
}
