//! Pluggable content resolution: turn a location into a validated, typed
//! asset through registries of format-specific decoder plugins.
//!
//! ```text
//! location ──► Source ──► DecoderRegistry<T> ──► SchemaEntity gate ──► asset
//!              (scheme,    (first matching        (structural +
//!               memoized    plugin by format       invariant phases)
//!               bytes)      discriminator)
//! ```
//!
//! # Modules
//!
//! - [`source`] — source descriptors, scheme-keyed loaders, memoized reads
//! - [`decode`] — the generic plugin registry and decoder trait
//! - [`schema`] — the two-phase entity construction gate
//! - [`image`] — raster assets: common interchange formats plus GeoTIFF
//! - [`model`] — inference model assets and the backend trait
//! - [`error`] — the crate's error taxonomy
//!
//! # Example
//!
//! ```no_run
//! use assetgate::image::{default_image_registry, Image};
//! use assetgate::source::Source;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = default_image_registry();
//! let source = Source::new("/data/scene.tif")?;
//! let image = Image::resolve(&registry, source)?;
//!
//! println!("{:?} with {} bands", image.resolution(), image.bands());
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Registries are `Send + Sync` and safe to share once populated. A
//! [`source::Source`] is not `Sync`: its memoization cell is unsynchronized,
//! so each thread works with its own descriptors.

pub mod decode;
pub mod error;
pub mod image;
pub mod model;
pub mod schema;
pub mod source;

pub use decode::{DecodedPayload, Decoder, DecoderRegistry, Metadata};
pub use error::{DecodeError, ModelError, SchemaError, SourceError};
pub use image::{default_image_registry, Image, ImageRegistry, PixelBuffer};
pub use model::{default_model_registry, InferenceBackend, Model, ModelRegistry};
pub use schema::SchemaEntity;
pub use source::{LoaderRegistry, Source, SourceLoader};
