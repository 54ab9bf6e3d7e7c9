use crate::TlsError;
use rustls::{
    client::WantsClientCert,
    ClientConfig,
    ConfigBuilder,
    RootCertStore,
};
use rustls_pemfile::Item;
use rustls_pki_types::{
    CertificateDer,
    PrivateKeyDer,
};
use std::{
    fmt,
    io::BufRead,
    sync::Arc,
};

/// TLS settings of an exporter. Only one kind is in effect at a time, the
/// builder keeps whichever was set last.
#[derive(Clone)]
pub enum TlsMaterial {
    /// PEM encoded X.509 certificates used as the only trust anchors.
    TrustedCertificates(Vec<u8>),
    /// PEM encoded client key (PKCS#8, PKCS#1 or SEC1) and certificate chain,
    /// servers are verified against the default web PKI roots.
    ClientIdentity {
        private_key_pem: Vec<u8>,
        certificate_pem: Vec<u8>,
    },
    /// A fully assembled client configuration, used as is.
    Preconfigured(Arc<ClientConfig>),
}

impl TlsMaterial {
    /// Resolves the material into the configuration handed to the HTTP client.
    pub fn client_config(&self) -> Result<ClientConfig, TlsError> {
        match self {
            TlsMaterial::TrustedCertificates(pem) => {
                let mut roots = RootCertStore::empty();
                for cert in read_certificates(pem)? {
                    roots.add(cert).map_err(TlsError::Certificate)?;
                }
                Ok(with_roots(roots)?.with_no_client_auth())
            }
            TlsMaterial::ClientIdentity {
                private_key_pem,
                certificate_pem,
            } => {
                let roots = RootCertStore {
                    roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
                };
                let chain = read_certificates(certificate_pem)?;
                let key = read_first_private_key(&mut private_key_pem.as_slice())?;
                Ok(with_roots(roots)?.with_client_auth_cert(chain, key)?)
            }
            TlsMaterial::Preconfigured(config) => Ok(ClientConfig::clone(config)),
        }
    }
}

impl fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsMaterial::TrustedCertificates(pem) => f.debug_tuple("TrustedCertificates").field(&pem.len()).finish(),
            TlsMaterial::ClientIdentity { certificate_pem, .. } => f
                .debug_struct("ClientIdentity")
                .field("certificate_pem", &certificate_pem.len())
                .finish_non_exhaustive(),
            TlsMaterial::Preconfigured(_) => f.write_str("Preconfigured"),
        }
    }
}

fn with_roots(roots: RootCertStore) -> Result<ConfigBuilder<ClientConfig, WantsClientCert>, TlsError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    Ok(ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots))
}

fn read_certificates(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let certs = rustls_pemfile::certs(&mut &*pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(TlsError::Pem)?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates);
    }
    Ok(certs)
}

fn read_first_private_key<R: BufRead>(reader: &mut R) -> Result<PrivateKeyDer<'static>, TlsError> {
    loop {
        match rustls_pemfile::read_one(reader).map_err(TlsError::Pem)? {
            Some(Item::Pkcs1Key(d)) => return Ok(PrivateKeyDer::Pkcs1(d)),
            Some(Item::Pkcs8Key(d)) => return Ok(PrivateKeyDer::Pkcs8(d)),
            Some(Item::Sec1Key(d)) => return Ok(PrivateKeyDer::Sec1(d)),
            Some(_) => continue,
            None => return Err(TlsError::NoPrivateKey),
        }
    }
}
