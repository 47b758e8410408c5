//! Source descriptors and scheme-keyed byte loading.
//!
//! A [`Source`] is a reference to externally held bytes (a path or URI) plus
//! an optional cached payload. Retrieval is idempotent and memoized: the
//! first call selects the [`SourceLoader`] registered for the location's
//! addressing scheme, reads the bytes and stores them in the descriptor's
//! single-assignment cell; later calls return the cached bytes without
//! touching the backing store again.
//!
//! The memoization cell is intentionally unsynchronized ([`Source`] is not
//! `Sync`): callers sharing a source across threads must give each thread its
//! own descriptor.

use std::cell::OnceCell;
use std::fs;
use std::path::Path;

use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::error::{FieldViolation, SchemaError, SourceError};
use crate::schema::SchemaEntity;

/// Scheme assumed for locations that are not URI-shaped.
const DEFAULT_SCHEME: &str = "file";

// =============================================================================
// Source
// =============================================================================

/// A reference to externally stored bytes, not yet decoded.
///
/// The `location` is immutable after construction. The payload cell is an
/// append-only memoization slot: once set, it is never overwritten or
/// cleared.
#[derive(Debug)]
pub struct Source {
    location: String,
    payload: OnceCell<Bytes>,
}

impl Source {
    /// Create a source descriptor for the given location.
    ///
    /// # Errors
    /// [`SchemaError::FieldErrors`] if the location is empty.
    pub fn new(location: impl Into<String>) -> Result<Self, SchemaError> {
        Source {
            location: location.into(),
            payload: OnceCell::new(),
        }
        .validated()
    }

    /// The location this source points at.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Addressing scheme of the location.
    ///
    /// URI-shaped locations report their scheme (`s3`, `https`, ...); bare
    /// paths default to `file`. Single-letter schemes are treated as Windows
    /// drive prefixes, not schemes.
    pub fn scheme(&self) -> String {
        match Url::parse(&self.location) {
            Ok(url) if url.scheme().len() > 1 => url.scheme().to_string(),
            _ => DEFAULT_SCHEME.to_string(),
        }
    }

    /// Format discriminator: the file-extension-like tag with its leading
    /// separator, compared case-sensitively (e.g. `.tif`).
    ///
    /// Locations without an extension yield an empty string.
    pub fn discriminator(&self) -> String {
        Path::new(&self.location)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default()
    }

    /// The memoized payload, if retrieval has already happened.
    pub fn cached_payload(&self) -> Option<&Bytes> {
        self.payload.get()
    }

    /// Store the payload into the memoization cell.
    ///
    /// The first write wins; a second write is ignored, preserving the
    /// append-only discipline.
    fn memoize(&self, bytes: Bytes) -> Bytes {
        self.payload.get_or_init(|| bytes).clone()
    }
}

impl SchemaEntity for Source {
    const ENTITY: &'static str = "Source";

    fn check_fields(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if self.location.is_empty() {
            violations.push(FieldViolation {
                field: "location",
                actual: "an empty string".to_string(),
                expected: "a path or URI".to_string(),
            });
        }
        violations
    }

    fn check_invariants(&mut self) -> Result<(), SchemaError> {
        Ok(())
    }
}

// =============================================================================
// SourceLoader Trait
// =============================================================================

/// Trait for reading a source's raw bytes from one addressing scheme.
///
/// Implementations own the byte-level access (filesystem, object store...)
/// and must report a missing resource with [`SourceError::NotFound`].
pub trait SourceLoader: Send + Sync {
    /// The addressing scheme this loader handles (e.g. `file`).
    fn scheme(&self) -> &'static str;

    /// Read the full content at `location`.
    fn read(&self, location: &str) -> Result<Bytes, SourceError>;
}

// =============================================================================
// LocalLoader
// =============================================================================

/// Loads bytes from the local filesystem.
pub struct LocalLoader;

impl LocalLoader {
    /// Strip a `file://` prefix so URI-style locations resolve as paths.
    fn as_path(location: &str) -> &str {
        location
            .strip_prefix("file://")
            .unwrap_or(location)
    }
}

impl SourceLoader for LocalLoader {
    fn scheme(&self) -> &'static str {
        "file"
    }

    fn read(&self, location: &str) -> Result<Bytes, SourceError> {
        let path = Self::as_path(location);
        match fs::read(path) {
            Ok(content) => Ok(Bytes::from(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(SourceError::NotFound(location.to_string()))
            }
            Err(err) => Err(SourceError::Io {
                location: location.to_string(),
                message: err.to_string(),
            }),
        }
    }
}

// =============================================================================
// LoaderRegistry
// =============================================================================

/// Maps addressing schemes to the loader able to read them.
///
/// The registry is populated at build time and read-only afterwards. There is
/// no fallback: a location whose scheme has no registered loader fails with
/// [`SourceError::UnsupportedScheme`].
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn SourceLoader>>,
}

impl LoaderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        LoaderRegistry {
            loaders: Vec::new(),
        }
    }

    /// Register a loader. The first loader claiming a scheme wins.
    pub fn register(&mut self, loader: Box<dyn SourceLoader>) {
        self.loaders.push(loader);
    }

    /// Retrieve a source's bytes, memoizing them on the descriptor.
    ///
    /// Subsequent calls for the same descriptor return the cached bytes
    /// without re-invoking the loader.
    ///
    /// # Errors
    /// - [`SourceError::UnsupportedScheme`] if no loader claims the scheme
    /// - [`SourceError::NotFound`] from the loader, propagated verbatim
    pub fn retrieve(&self, source: &Source) -> Result<Bytes, SourceError> {
        if let Some(bytes) = source.cached_payload() {
            return Ok(bytes.clone());
        }

        let scheme = source.scheme();
        let loader = self
            .loaders
            .iter()
            .find(|loader| loader.scheme() == scheme)
            .ok_or_else(|| SourceError::UnsupportedScheme {
                scheme: scheme.clone(),
                location: source.location().to_string(),
            })?;

        let bytes = loader.read(source.location())?;
        debug!(
            location = %source.location(),
            scheme = %scheme,
            size = bytes.len(),
            "loaded source bytes"
        );

        Ok(source.memoize(bytes))
    }
}

impl Default for LoaderRegistry {
    /// Registry with the local-filesystem loader, the only scheme supported
    /// out of the box.
    fn default() -> Self {
        let mut registry = LoaderRegistry::new();
        registry.register(Box::new(LocalLoader));
        registry
    }
}

// =============================================================================
// Tests
// =============================================================================
