//! Inference model resolution.
//!
//! A [`Model`] is a validated entity wrapping an [`InferenceBackend`], built
//! by resolving a [`Source`] through a [`ModelRegistry`]. The framework only
//! operates on single-input models: introspection and prediction both fail
//! with [`ModelError::MultipleInputLayers`] when the backend declares more
//! than one input, rather than silently picking the first.

mod linear;

pub use linear::{LinearBackend, LinearModelDecoder};

use std::fmt;

use tracing::debug;

use crate::decode::{DecoderRegistry, Metadata};
use crate::error::{DecodeError, FieldViolation, ModelError, SchemaError};
use crate::schema::SchemaEntity;
use crate::source::Source;

/// Decoder registry producing inference backends.
pub type ModelRegistry = DecoderRegistry<Box<dyn InferenceBackend>>;

/// Registry with the built-in model decoders.
pub fn default_model_registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry.register(Box::new(LinearModelDecoder));
    registry
}

// =============================================================================
// Input Layers
// =============================================================================

/// Element type of a model input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Float32,
    Float64,
    Int32,
    Int64,
    UInt8,
}

impl DType {
    /// Lowercase type name as reported to callers.
    pub const fn as_str(self) -> &'static str {
        match self {
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared shape and element type of one model input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLayer {
    pub dtype: DType,
    pub shape: Vec<usize>,
}

// =============================================================================
// InferenceBackend Trait
// =============================================================================

/// A loaded model able to run prediction on a flat sample.
pub trait InferenceBackend: Send + Sync {
    /// Run prediction on one flat sample.
    fn predict(&self, sample: &[f32]) -> Result<Vec<f32>, ModelError>;

    /// The input layers this model declares.
    fn input_layers(&self) -> &[InputLayer];
}

impl fmt::Debug for dyn InferenceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn InferenceBackend")
    }
}

// =============================================================================
// Model
// =============================================================================

/// A validated inference model entity.
pub struct Model {
    source: Source,
    backend: Box<dyn InferenceBackend>,
    metadata: Metadata,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("source", &self.source)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Resolve a source into a validated model through the given registry.
    ///
    /// # Errors
    /// Registry errors propagate as-is; a payload that fails entity
    /// validation is reported as [`DecodeError::Failed`] with the schema
    /// error as cause.
    pub fn resolve(registry: &ModelRegistry, source: Source) -> Result<Self, DecodeError> {
        let payload = registry.decode(&source)?;
        let location = source.location().to_string();

        let model = Model {
            source,
            backend: payload.content,
            metadata: payload.metadata,
        }
        .validated()
        .map_err(|cause| DecodeError::failed(location, cause))?;

        debug!(
            location = %model.source.location(),
            inputs = model.backend.input_layers().len(),
            "resolved model"
        );
        Ok(model)
    }

    /// The source this model was resolved from.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Decoder-reported metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The single input layer, when exactly one is declared.
    fn single_input(&self) -> Result<&InputLayer, ModelError> {
        match self.backend.input_layers() {
            [layer] => Ok(layer),
            layers => Err(ModelError::MultipleInputLayers(layers.len())),
        }
    }

    /// Shape of the model's single input layer.
    ///
    /// # Errors
    /// [`ModelError::MultipleInputLayers`] unless exactly one input layer is
    /// declared.
    pub fn input_shape(&self) -> Result<&[usize], ModelError> {
        Ok(&self.single_input()?.shape)
    }

    /// Element type of the model's single input layer.
    ///
    /// # Errors
    /// [`ModelError::MultipleInputLayers`] unless exactly one input layer is
    /// declared.
    pub fn input_dtype(&self) -> Result<DType, ModelError> {
        Ok(self.single_input()?.dtype)
    }

    /// Run prediction on one flat sample.
    ///
    /// # Errors
    /// - [`ModelError::MultipleInputLayers`] unless exactly one input layer
    ///   is declared
    /// - [`ModelError::Inference`] if the backend fails
    pub fn predict(&self, sample: &[f32]) -> Result<Vec<f32>, ModelError> {
        self.single_input()?;
        self.backend.predict(sample)
    }
}

impl SchemaEntity for Model {
    const ENTITY: &'static str = "Model";

    fn check_fields(&self) -> Vec<FieldViolation> {
        Vec::new()
    }

    fn check_invariants(&mut self) -> Result<(), SchemaError> {
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
