//! Reference model decoder.
//!
//! `.linear` files are small JSON documents describing an affine map
//! `y = scale * x + offset` applied element-wise:
//!
//! ```json
//! { "scale": 2.0, "offset": 1.0 }
//! ```
//!
//! The format exists so the model pipeline can be exercised end to end
//! without an external runtime; it doubles as the template for plugging in
//! real backends.

use bytes::Bytes;
use serde_json::{json, Value};

use crate::decode::{DecodedPayload, Decoder, Metadata};
use crate::error::BoxError;

use super::{DType, InferenceBackend, InputLayer};

// =============================================================================
// LinearBackend
// =============================================================================

/// Element-wise affine backend: `y = scale * x + offset`.
pub struct LinearBackend {
    scale: f32,
    offset: f32,
    layers: [InputLayer; 1],
}

impl LinearBackend {
    pub fn new(scale: f32, offset: f32) -> Self {
        LinearBackend {
            scale,
            offset,
            layers: [InputLayer {
                dtype: DType::Float32,
                shape: vec![1],
            }],
        }
    }
}

impl InferenceBackend for LinearBackend {
    fn predict(&self, sample: &[f32]) -> Result<Vec<f32>, crate::error::ModelError> {
        Ok(sample.iter().map(|&x| self.scale * x + self.offset).collect())
    }

    fn input_layers(&self) -> &[InputLayer] {
        &self.layers
    }
}

// =============================================================================
// LinearModelDecoder
// =============================================================================

/// Decoder plugin for `.linear` model descriptions.
pub struct LinearModelDecoder;

impl LinearModelDecoder {
    fn required_f64(document: &Value, key: &str) -> Result<f64, BoxError> {
        document
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| format!("missing or non-numeric '{key}' parameter").into())
    }
}

impl Decoder<Box<dyn InferenceBackend>> for LinearModelDecoder {
    fn name(&self) -> &'static str {
        "linear-model"
    }

    fn capabilities(&self) -> &[&'static str] {
        &[".linear"]
    }

    fn decode(
        &self,
        bytes: &Bytes,
    ) -> Result<DecodedPayload<Box<dyn InferenceBackend>>, BoxError> {
        let document: Value = serde_json::from_slice(bytes)?;

        let scale = Self::required_f64(&document, "scale")?;
        let offset = Self::required_f64(&document, "offset")?;

        if let Some(dtype) = document.get("dtype").and_then(Value::as_str) {
            if dtype != DType::Float32.as_str() {
                return Err(format!("unsupported dtype '{dtype}'").into());
            }
        }

        let mut metadata = Metadata::new();
        metadata.insert("format".to_string(), json!("linear"));
        metadata.insert("scale".to_string(), json!(scale));
        metadata.insert("offset".to_string(), json!(offset));

        Ok(DecodedPayload {
            content: Box::new(LinearBackend::new(scale as f32, offset as f32)),
            metadata,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_and_predict() {
        let bytes = Bytes::from_static(br#"{"scale": 2.0, "offset": 1.0}"#);
        let payload = LinearModelDecoder.decode(&bytes).unwrap();

        let output = payload.content.predict(&[1.0, 3.0, 5.0]).unwrap();
        assert_eq!(output, vec![3.0, 7.0, 11.0]);

        assert_eq!(payload.metadata["format"], json!("linear"));
        assert_eq!(payload.metadata["scale"], json!(2.0));
    }

    #[test]
    fn test_declares_single_float32_input() {
        let bytes = Bytes::from_static(br#"{"scale": 1.0, "offset": 0.0}"#);
        let payload = LinearModelDecoder.decode(&bytes).unwrap();

        let layers = payload.content.input_layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].dtype, DType::Float32);
    }

    #[test]
    fn test_missing_parameter_fails() {
        let bytes = Bytes::from_static(br#"{"scale": 2.0}"#);
        let err = LinearModelDecoder.decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("offset"));
    }

    #[test]
    fn test_invalid_json_fails() {
        let bytes = Bytes::from_static(b"not json at all");
        assert!(LinearModelDecoder.decode(&bytes).is_err());
    }

    #[test]
    fn test_unsupported_dtype_fails() {
        let bytes = Bytes::from_static(br#"{"scale": 1.0, "offset": 0.0, "dtype": "float64"}"#);
        let err = LinearModelDecoder.decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("float64"));
    }
}
