//! Generic decoder registry.
//!
//! A [`DecoderRegistry`] maps a source's format discriminator (its
//! file-extension-like tag) to an ordered list of [`Decoder`] plugins and
//! turns raw source bytes into a typed payload:
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │          DecoderRegistry<T>               │
//! │  (ordered plugins, first match wins)      │
//! └─────────┬─────────────────────┬───────────┘
//!           │ bytes               │ payload
//!           ▼                     ▼
//! ┌──────────────────┐   ┌──────────────────┐
//! │  LoaderRegistry  │   │   Decoder<T>     │
//! │ (scheme-keyed,   │   │ (format-specific │
//! │  memoized reads) │   │  plugin)         │
//! └──────────────────┘   └──────────────────┘
//! ```
//!
//! Selection is deterministic: plugins are scanned in registration order and
//! the first one whose capability set contains the discriminator wins. There
//! is no scoring or specificity heuristic beyond order, which is exactly the
//! mechanism by which a specific plugin (a geospatial raster decoder claiming
//! only `.tif`/`.tiff`) is tried before a general-purpose one claiming
//! overlapping extensions.
//!
//! Failure semantics: a missing handler and an unobtainable source keep
//! their specific identity; everything that goes wrong *after* a plugin was
//! selected is normalized into [`DecodeError::Failed`] with the original
//! failure attached as its cause. A failed decode is never retried with a
//! different plugin.

use std::collections::BTreeMap;

use bytes::Bytes;
use tracing::debug;

use crate::error::{BoxError, DecodeError};
use crate::source::{LoaderRegistry, Source};

/// Free-form, decoder-specific metadata (dimensions, registered format name,
/// color mode, coordinate reference system...).
pub type Metadata = BTreeMap<String, serde_json::Value>;

// =============================================================================
// Axis Order
// =============================================================================

/// Axis ordering a decoder produces its content in.
///
/// The registry's canonical ordering is (rows, columns, channels). A plugin
/// declaring a different ordering gets its [`Decoder::reorder`] hook invoked
/// before the payload is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisOrder {
    /// (rows, columns, channels) — the canonical ordering.
    #[default]
    RowMajor,

    /// Anything else; the plugin must implement [`Decoder::reorder`].
    NonCanonical,
}

// =============================================================================
// Decoder Trait
// =============================================================================

/// Raw content plus decoder-specific metadata, prior to entity construction.
#[derive(Debug, Clone)]
pub struct DecodedPayload<T> {
    /// Domain payload (pixel buffer, inference handle...)
    pub content: T,

    /// Free-form key/value metadata reported by the plugin
    pub metadata: Metadata,
}

/// A plugin able to turn raw bytes of a known format into content plus
/// metadata.
pub trait Decoder<T>: Send + Sync {
    /// Short plugin name for logging.
    fn name(&self) -> &'static str;

    /// Format discriminators this plugin claims, each with its leading
    /// separator (e.g. `.tif`). Compared case-sensitively.
    fn capabilities(&self) -> &[&'static str];

    /// Parse the bytes into content and metadata.
    ///
    /// Content axes must already be in this plugin's declared
    /// [`axis_order`](Decoder::axis_order).
    fn decode(&self, bytes: &Bytes) -> Result<DecodedPayload<T>, BoxError>;

    /// Axis ordering of the content produced by [`decode`](Decoder::decode).
    fn axis_order(&self) -> AxisOrder {
        AxisOrder::RowMajor
    }

    /// Reorder content into the canonical (rows, columns, channels) order.
    ///
    /// Invoked by the registry only when [`axis_order`](Decoder::axis_order)
    /// is non-canonical. The default is the identity.
    fn reorder(&self, payload: DecodedPayload<T>) -> DecodedPayload<T> {
        payload
    }
}

// =============================================================================
// DecoderRegistry
// =============================================================================

/// Ordered plugin registry generic over a decoded-content type.
///
/// Registries are populated at build time and read-only afterwards; there is
/// no runtime registration mutation once decoding starts.
pub struct DecoderRegistry<T> {
    decoders: Vec<Box<dyn Decoder<T>>>,
    sources: LoaderRegistry,
}

impl<T> DecoderRegistry<T> {
    /// Create an empty registry backed by the default source loaders.
    pub fn new() -> Self {
        Self::with_sources(LoaderRegistry::default())
    }

    /// Create an empty registry with custom source loaders.
    pub fn with_sources(sources: LoaderRegistry) -> Self {
        DecoderRegistry {
            decoders: Vec::new(),
            sources,
        }
    }

    /// Register a decoder plugin.
    ///
    /// Registration order is significant and is the public tie-break
    /// contract: when several plugins claim the same discriminator, the one
    /// registered earlier always wins.
    pub fn register(&mut self, decoder: Box<dyn Decoder<T>>) {
        self.decoders.push(decoder);
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Whether the registry has no plugins.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Select the first plugin whose capability set contains the
    /// discriminator.
    fn select(&self, discriminator: &str) -> Option<&dyn Decoder<T>> {
        self.decoders
            .iter()
            .find(|decoder| decoder.capabilities().contains(&discriminator))
            .map(|decoder| decoder.as_ref())
    }

    /// Resolve the source's bytes and decode them through the matching
    /// plugin.
    ///
    /// # Errors
    /// - [`DecodeError::NoHandler`] if no plugin claims the discriminator
    /// - [`DecodeError::Source`] if the bytes cannot be obtained (propagated
    ///   unwrapped, preserving `NotFound` / `UnsupportedScheme` identity)
    /// - [`DecodeError::Failed`] for any failure raised by the selected
    ///   plugin, with the original error as cause
    pub fn decode(&self, source: &Source) -> Result<DecodedPayload<T>, DecodeError> {
        let discriminator = source.discriminator();
        let decoder = self
            .select(&discriminator)
            .ok_or_else(|| DecodeError::NoHandler(discriminator.clone()))?;

        debug!(
            discriminator = %discriminator,
            decoder = decoder.name(),
            location = %source.location(),
            "selected decoder"
        );

        let bytes = self.sources.retrieve(source)?;

        let payload = decoder
            .decode(&bytes)
            .map_err(|cause| DecodeError::failed(source.location(), cause))?;

        let payload = match decoder.axis_order() {
            AxisOrder::RowMajor => payload,
            AxisOrder::NonCanonical => decoder.reorder(payload),
        };

        Ok(payload)
    }
}

impl<T> Default for DecoderRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
