//! The codec traits generated code implements and calls.

use std::any::Any;
use std::sync::Arc;

use crate::error::{CodecError, CodecResult};
use crate::reader::JsonReader;
use crate::registry::CodecRegistry;
use crate::type_token::TypeToken;
use crate::writer::JsonWriter;

/// Paired read and write routines for one Rust type.
///
/// `None` stands for the JSON `null` on both sides. Codecs hold no per-call state and
/// are shared between threads once constructed.
pub trait Codec<T>: Send + Sync {
    fn decode(&self, reader: &mut JsonReader) -> CodecResult<Option<T>>;

    fn encode(&self, writer: &mut JsonWriter, value: Option<&T>) -> CodecResult<()>;
}

/// A type the [`CodecRegistry`] can look up a codec for.
pub trait WireType: Sized + Send + Sync + 'static {
    /// The token identifying this type.
    fn type_token() -> TypeToken;

    /// Builds the codec used when no registered factory claims `token`.
    fn default_codec(registry: &CodecRegistry, token: &TypeToken)
    -> CodecResult<Arc<dyn Codec<Self>>>;
}

/// A codec with its value type erased, as stored in the registry cache and returned by
/// factories.
#[derive(Clone)]
pub struct ErasedCodec {
    inner: Arc<dyn Any + Send + Sync>,
}

impl ErasedCodec {
    pub fn new<T: 'static>(codec: Arc<dyn Codec<T>>) -> Self {
        Self {
            inner: Arc::new(codec),
        }
    }

    /// Recovers the typed codec, or `None` if it was built for a different type.
    pub fn downcast<T: 'static>(&self) -> Option<Arc<dyn Codec<T>>> {
        self.inner.downcast_ref::<Arc<dyn Codec<T>>>().cloned()
    }
}

impl std::fmt::Debug for ErasedCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErasedCodec").finish_non_exhaustive()
    }
}

/// Trailing argument of generated defaulting constructors.
///
/// It keeps the full-arity constructor apart from any ordinary associated function
/// with the same leading parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultMarker;

/// Unwraps a decoded slot of a required field.
pub fn require_field<T>(
    slot: Option<T>,
    type_name: &'static str,
    field: &'static str,
) -> CodecResult<T> {
    slot.ok_or(CodecError::MissingRequiredField { type_name, field })
}
