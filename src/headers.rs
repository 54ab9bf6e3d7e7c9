use crate::{
    BoxError,
    ConfigError,
    ExportError,
};
use reqwest::header::{
    HeaderName,
    HeaderValue,
};
use std::collections::HashMap;

pub(crate) const USER_AGENT: &str = concat!("OTel-OTLP-Exporter-Rust/", env!("CARGO_PKG_VERSION"));

/// Supplies headers at export time, e.g. rotating auth tokens.
///
/// Invoked once per export call. An exporter shared between threads calls
/// its supplier concurrently, implementations have to be safe for that.
/// Infallible closures returning a `HashMap<String, String>` implement this
/// trait.
pub trait HeaderSupplier: Send + Sync {
    fn headers(&self) -> Result<HashMap<String, String>, BoxError>;
}

impl<F> HeaderSupplier for F
where
    F: Fn() -> HashMap<String, String> + Send + Sync,
{
    fn headers(&self) -> Result<HashMap<String, String>, BoxError> {
        Ok(self())
    }
}

/// Checks that `key` and `value` can be sent as an HTTP header.
pub(crate) fn check_header(key: &str, value: &str) -> Result<(), ConfigError> {
    if HeaderName::from_bytes(key.as_bytes()).is_err() || HeaderValue::from_str(value).is_err() {
        return Err(ConfigError::InvalidHeader(key.to_string()));
    }
    Ok(())
}

/// Combines constant headers with the supplier's current headers. Keys present
/// in both keep every value: constant entries come first, followed by the
/// supplied entries sorted by key.
pub fn merge_headers(
    constant: &[(String, String)],
    supplier: Option<&dyn HeaderSupplier>,
) -> Result<Vec<(String, String)>, ExportError> {
    let mut merged = constant.to_vec();
    if let Some(supplier) = supplier {
        let mut supplied = supplier
            .headers()
            .map_err(ExportError::Headers)?
            .into_iter()
            .collect::<Vec<_>>();
        supplied.sort();
        merged.extend(supplied);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn header_names_and_values_are_checked() {
        assert!(check_header("x-tenant", "acme").is_ok());
        assert!(check_header("authorization", "Bearer a.b.c").is_ok());
        assert!(matches!(check_header("bad key", "v"), Err(ConfigError::InvalidHeader(k)) if k == "bad key"));
        assert!(check_header("", "v").is_err());
        assert!(check_header("k", "v\n").is_err());
    }

    #[test]
    fn without_supplier_returns_constants() {
        let constant = vec![pair("a", "1"), pair("a", "2")];
        assert_eq!(merge_headers(&constant, None).unwrap(), constant);
    }

    #[test]
    fn colliding_keys_keep_both_values() {
        let constant = vec![pair("k", "a")];
        let supplier = || HashMap::from([("k".to_string(), "b".to_string())]);
        let merged = merge_headers(&constant, Some(&supplier)).unwrap();
        assert_eq!(merged, vec![pair("k", "a"), pair("k", "b")]);
    }

    #[test]
    fn supplied_entries_are_sorted() {
        let supplier = || {
            HashMap::from([
                ("c".to_string(), "3".to_string()),
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ])
        };
        let merged = merge_headers(&[], Some(&supplier)).unwrap();
        assert_eq!(merged, vec![pair("a", "1"), pair("b", "2"), pair("c", "3")]);
    }

    #[test]
    fn supplier_runs_once_per_merge() {
        let calls = AtomicUsize::new(0);
        let supplier = || {
            calls.fetch_add(1, Ordering::SeqCst);
            HashMap::new()
        };
        merge_headers(&[], Some(&supplier)).unwrap();
        merge_headers(&[], Some(&supplier)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn supplier_failure_is_an_export_error() {
        struct Failing;
        impl HeaderSupplier for Failing {
            fn headers(&self) -> Result<HashMap<String, String>, BoxError> {
                Err("token expired".into())
            }
        }

        let err = merge_headers(&[pair("a", "1")], Some(&Failing)).unwrap_err();
        assert!(matches!(err, ExportError::Headers(e) if e.to_string() == "token expired"));
    }

    #[test]
    fn user_agent_names_the_crate_version() {
        assert!(USER_AGENT.starts_with("OTel-OTLP-Exporter-Rust/"));
        assert!(USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
    }
}
