//! End-to-end resolution tests exercising the public API: real files on
//! disk, default registries, and the full source-to-entity pipeline.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb};
use serde_json::json;
use tempfile::TempDir;

use assetgate::decode::{DecodedPayload, Decoder, Metadata};
use assetgate::error::{BoxError, ModelError, SourceError};
use assetgate::image::{default_image_registry, Image};
use assetgate::model::{
    default_model_registry, DType, InferenceBackend, InputLayer, Model, ModelRegistry,
};
use assetgate::source::{LoaderRegistry, Source, SourceLoader};
use assetgate::DecodeError;

// =============================================================================
// Fixtures
// =============================================================================

/// Enable log output for debugging via `RUST_LOG=debug cargo test`.
fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Write `content` into `dir` under `name` and return a source for it.
fn write_fixture(dir: &TempDir, name: &str, content: &[u8]) -> Source {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    Source::new(path.to_string_lossy().to_string()).unwrap()
}

/// Encode a solid-color RGB PNG.
fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = image::ImageBuffer::from_pixel(width, height, Rgb([180u8, 90, 20]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

/// Synthesize an uncompressed single-strip grayscale GeoTIFF declaring a
/// projected CRS (little-endian classic TIFF).
fn geotiff_fixture(width: u32, height: u32, epsg: u16) -> Vec<u8> {
    fn entry(data: &mut Vec<u8>, tag: u16, field_type: u16, count: u32, value: u32) {
        data.extend_from_slice(&tag.to_le_bytes());
        data.extend_from_slice(&field_type.to_le_bytes());
        data.extend_from_slice(&count.to_le_bytes());
        data.extend_from_slice(&value.to_le_bytes());
    }

    let entries: u16 = 9;
    let entries_end = 8 + 2 + entries as usize * 12 + 4;
    let geokeys: [u16; 8] = [1, 1, 0, 1, 3072, 0, 1, epsg];
    let strip_offset = entries_end + geokeys.len() * 2;
    let strip_len = (width * height) as usize;

    let mut data = vec![0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
    data.extend_from_slice(&entries.to_le_bytes());
    entry(&mut data, 256, 4, 1, width);
    entry(&mut data, 257, 4, 1, height);
    entry(&mut data, 258, 3, 1, 8);
    entry(&mut data, 259, 3, 1, 1);
    entry(&mut data, 262, 3, 1, 1);
    entry(&mut data, 273, 4, 1, strip_offset as u32);
    entry(&mut data, 277, 3, 1, 1);
    entry(&mut data, 279, 4, 1, strip_len as u32);
    entry(&mut data, 34735, 3, 8, entries_end as u32);
    data.extend_from_slice(&0u32.to_le_bytes());
    for value in geokeys {
        data.extend_from_slice(&value.to_le_bytes());
    }
    data.extend(std::iter::repeat(0xAAu8).take(strip_len));
    data
}

// =============================================================================
// Image Resolution
// =============================================================================

#[test]
fn test_resolve_png_from_disk() {
    init_logging();
    let dir = TempDir::new().unwrap();
    // Photo-sized fixture: resolution is (rows, columns), so a landscape
    // 5184x3456 image resolves as (3456, 5184).
    let source = write_fixture(&dir, "photo.png", &png_fixture(5184, 3456));

    let registry = default_image_registry();
    let image = Image::resolve(&registry, source).unwrap();

    assert_eq!(image.resolution(), (3456, 5184));
    assert_eq!(image.bands(), 3);
    assert_eq!(image.content().shape(), &[3456, 5184, 3]);
    assert_eq!(image.content().data().len(), 3456 * 5184 * 3);
    assert_eq!(image.metadata()["format"], json!("png"));
    assert_eq!(image.metadata()["mode"], json!("RGB"));
}

#[test]
fn test_resolve_geotiff_preserves_crs() {
    let dir = TempDir::new().unwrap();
    let source = write_fixture(&dir, "scene.tif", &geotiff_fixture(1001, 1001, 32631));

    let registry = default_image_registry();
    let image = Image::resolve(&registry, source).unwrap();

    assert_eq!(image.metadata()["crs"], json!("EPSG:32631"));
    assert_eq!(image.metadata()["format"], json!("GeoTIFF"));
    assert_eq!(image.resolution(), (1001, 1001));
    // Single-band rasters are normalized to a trailing unit axis.
    assert_eq!(image.bands(), 1);
    assert_eq!(image.content().shape(), &[1001, 1001, 1]);
}

#[test]
fn test_corrupt_image_is_a_normalized_failure() {
    let dir = TempDir::new().unwrap();
    let source = write_fixture(&dir, "empty.jpg", b"");

    let registry = default_image_registry();
    let err = Image::resolve(&registry, source).unwrap_err();

    // A matching handler exists; the failure is the decode itself, wrapped
    // with its original cause attached.
    match err {
        DecodeError::Failed { ref cause, .. } => {
            assert!(!cause.to_string().is_empty());
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[test]
fn test_missing_file_stays_a_source_error() {
    let source = Source::new("/tmp/definitely-missing-asset.png").unwrap();

    let registry = default_image_registry();
    let err = Image::resolve(&registry, source).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Source(SourceError::NotFound(_))
    ));
}

#[test]
fn test_unknown_extension_is_deterministically_unhandled() {
    let dir = TempDir::new().unwrap();
    let registry = default_image_registry();

    for _ in 0..3 {
        let source = write_fixture(&dir, "blob.xyz", b"opaque");
        let err = Image::resolve(&registry, source).unwrap_err();
        match err {
            DecodeError::NoHandler(discriminator) => assert_eq!(discriminator, ".xyz"),
            other => panic!("expected NoHandler, got {other:?}"),
        }
    }
}

#[test]
fn test_source_bytes_are_read_once() {
    struct CountingLoader {
        data: Bytes,
        reads: Arc<AtomicUsize>,
    }

    impl SourceLoader for CountingLoader {
        fn scheme(&self) -> &'static str {
            "file"
        }

        fn read(&self, _location: &str) -> Result<Bytes, SourceError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.data.clone())
        }
    }

    let reads = Arc::new(AtomicUsize::new(0));
    let mut loaders = LoaderRegistry::new();
    loaders.register(Box::new(CountingLoader {
        data: Bytes::from(png_fixture(16, 16)),
        reads: reads.clone(),
    }));

    let source = Source::new("photo.png").unwrap();
    loaders.retrieve(&source).unwrap();
    loaders.retrieve(&source).unwrap();

    assert_eq!(reads.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Model Resolution
// =============================================================================

#[test]
fn test_resolve_linear_model_and_predict() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let source = write_fixture(&dir, "affine.linear", br#"{"scale": 2.0, "offset": 1.0}"#);

    let registry = default_model_registry();
    let model = Model::resolve(&registry, source).unwrap();

    assert_eq!(model.input_shape().unwrap(), &[1]);
    assert_eq!(model.input_dtype().unwrap(), DType::Float32);
    assert_eq!(
        model.predict(&[1.0, 3.0, 5.0]).unwrap(),
        vec![3.0, 7.0, 11.0]
    );
}

#[test]
fn test_malformed_model_description_fails_normalized() {
    let dir = TempDir::new().unwrap();
    let source = write_fixture(&dir, "broken.linear", b"{\"scale\": 2.0}");

    let registry = default_model_registry();
    let err = Model::resolve(&registry, source).unwrap_err();
    assert!(matches!(err, DecodeError::Failed { .. }));
}

#[test]
fn test_multi_input_model_refuses_introspection() {
    /// Backend with two declared inputs, as a multi-head network would have.
    struct TwoHeadBackend {
        layers: Vec<InputLayer>,
    }

    impl InferenceBackend for TwoHeadBackend {
        fn predict(&self, sample: &[f32]) -> Result<Vec<f32>, ModelError> {
            Ok(sample.to_vec())
        }

        fn input_layers(&self) -> &[InputLayer] {
            &self.layers
        }
    }

    struct TwoHeadDecoder;

    impl Decoder<Box<dyn InferenceBackend>> for TwoHeadDecoder {
        fn name(&self) -> &'static str {
            "two-head"
        }

        fn capabilities(&self) -> &[&'static str] {
            &[".twohead"]
        }

        fn decode(
            &self,
            _bytes: &Bytes,
        ) -> Result<DecodedPayload<Box<dyn InferenceBackend>>, BoxError> {
            Ok(DecodedPayload {
                content: Box::new(TwoHeadBackend {
                    layers: vec![
                        InputLayer {
                            dtype: DType::Float32,
                            shape: vec![8],
                        };
                        2
                    ],
                }),
                metadata: Metadata::new(),
            })
        }
    }

    let dir = TempDir::new().unwrap();
    let source = write_fixture(&dir, "net.twohead", b"irrelevant");

    let mut registry = ModelRegistry::new();
    registry.register(Box::new(TwoHeadDecoder));

    let model = Model::resolve(&registry, source).unwrap();
    assert!(matches!(
        model.input_shape(),
        Err(ModelError::MultipleInputLayers(2))
    ));
    assert!(matches!(
        model.predict(&[0.0]),
        Err(ModelError::MultipleInputLayers(2))
    ));
}

#[test]
fn test_model_registry_ignores_image_extensions() {
    let dir = TempDir::new().unwrap();
    let source = write_fixture(&dir, "photo.png", &png_fixture(4, 4));

    let registry = default_model_registry();
    let err = Model::resolve(&registry, source).unwrap_err();
    assert!(matches!(err, DecodeError::NoHandler(_)));
}
