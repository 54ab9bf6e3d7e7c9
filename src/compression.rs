use std::{
    collections::BTreeMap,
    fmt,
    io::{
        self,
        Write as _,
    },
    sync::Arc,
};

/// A payload compression method. [`Compressor::encoding`] is both the name
/// used to select the method and the `content-encoding` header value.
pub trait Compressor: Send + Sync {
    fn encoding(&self) -> &str;

    fn compress(&self, payload: &[u8]) -> io::Result<Vec<u8>>;
}

/// Compress using gzip.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gzip;

impl Compressor for Gzip {
    fn encoding(&self) -> &str {
        "gzip"
    }

    fn compress(&self, payload: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(payload)?;
        encoder.finish()
    }
}

/// Compress using brotli.
#[cfg(feature = "compress-brotli")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Brotli;

#[cfg(feature = "compress-brotli")]
impl Compressor for Brotli {
    fn encoding(&self) -> &str {
        "br"
    }

    fn compress(&self, payload: &[u8]) -> io::Result<Vec<u8>> {
        let mut compressed = Vec::new();
        {
            let mut writer = brotli::CompressorWriter::new(&mut compressed, 4096, 11, 22);
            writer
                .write_all(payload)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        }
        Ok(compressed)
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

/// Maps compression method names to compressors. Names iterate in sorted
/// order so error messages listing them are deterministic.
#[derive(Clone, Default)]
pub struct CompressorRegistry {
    compressors: BTreeMap<String, Arc<dyn Compressor>>,
}

impl CompressorRegistry {
    /// A registry without any compressor.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with every compressor compiled into this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Gzip);
        #[cfg(feature = "compress-brotli")]
        registry.register(Brotli);
        registry
    }

    /// Adds `compressor`, replacing one previously registered under the same
    /// name.
    pub fn register(&mut self, compressor: impl Compressor + 'static) -> &mut Self {
        let name = compressor.encoding().to_string();
        self.compressors.insert(name, Arc::new(compressor));
        self
    }

    pub fn supported_names(&self) -> Vec<String> {
        self.compressors.keys().cloned().collect()
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Compressor>> {
        self.compressors.get(name).cloned()
    }
}

impl fmt::Debug for CompressorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.compressors.keys()).finish()
    }
}
