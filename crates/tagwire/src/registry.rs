//! Codec lookup and caching.
//!
//! A [`CodecRegistry`] is built once and passed to every codec constructor. Lookups
//! go through the cache first, then through registered [`CodecFactory`] instances
//! (such as a generated dispatch table) in registration order, and finally fall back
//! to [`WireType::default_codec`].
//!
//! Self-referential types are not supported: constructing a codec for a type that
//! contains itself recurses without bound.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::codec::{Codec, ErasedCodec, WireType};
use crate::error::{CodecError, CodecResult};
use crate::reader::JsonReader;
use crate::type_token::TypeToken;
use crate::writer::{JsonWriter, WriterConfig};

/// Produces codecs for the type tokens it recognizes.
pub trait CodecFactory: Send + Sync {
    /// Returns `None` when `token` is not handled by this factory.
    fn create(
        &self,
        registry: &CodecRegistry,
        token: &TypeToken,
    ) -> Option<CodecResult<ErasedCodec>>;
}

/// Shared codec lookup service.
pub struct CodecRegistry {
    factories: Vec<Arc<dyn CodecFactory>>,
    cache: RwLock<HashMap<TypeToken, ErasedCodec>>,
    writer_config: WriterConfig,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("factories", &self.factories.len())
            .field("cached", &self.cache.read().len())
            .field("writer_config", &self.writer_config)
            .finish()
    }
}

impl CodecRegistry {
    /// A registry with no factories, serving only built-in codecs.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::default()
    }

    /// Returns the codec for `token`, constructing and caching it on first use.
    pub fn codec<T: WireType>(&self, token: &TypeToken) -> CodecResult<Arc<dyn Codec<T>>> {
        let cached = self.cache.read().get(token).cloned();
        if let Some(erased) = cached {
            tracing::trace!(%token, "codec cache hit");
            return downcast::<T>(&erased, token);
        }

        let codec = self.create::<T>(token)?;
        self.cache
            .write()
            .entry(token.clone())
            .or_insert_with(|| ErasedCodec::new(Arc::clone(&codec)));
        Ok(codec)
    }

    /// Returns the codec for `T`'s own type token.
    pub fn codec_of<T: WireType>(&self) -> CodecResult<Arc<dyn Codec<T>>> {
        self.codec::<T>(&T::type_token())
    }

    /// Decodes a complete document. Trailing content after the value is an error.
    pub fn from_json<T: WireType>(&self, json: &str) -> CodecResult<Option<T>> {
        let codec = self.codec_of::<T>()?;
        let mut reader = JsonReader::new(json);
        let value = codec.decode(&mut reader)?;
        reader.end_document()?;
        Ok(value)
    }

    /// Encodes `value` (or `null` for `None`) as a document.
    pub fn to_json<T: WireType>(&self, value: Option<&T>) -> CodecResult<String> {
        let codec = self.codec_of::<T>()?;
        let mut writer = self.writer();
        codec.encode(&mut writer, value)?;
        writer.into_string()
    }

    /// A writer configured the way this registry was built.
    pub fn writer(&self) -> JsonWriter {
        JsonWriter::with_config(self.writer_config.clone())
    }

    fn create<T: WireType>(&self, token: &TypeToken) -> CodecResult<Arc<dyn Codec<T>>> {
        for factory in &self.factories {
            if let Some(created) = factory.create(self, token) {
                tracing::trace!(%token, "codec created by factory");
                return downcast::<T>(&created?, token);
            }
        }
        tracing::trace!(%token, "codec created by default");
        T::default_codec(self, token)
    }
}

fn downcast<T: WireType>(erased: &ErasedCodec, token: &TypeToken) -> CodecResult<Arc<dyn Codec<T>>> {
    erased
        .downcast::<T>()
        .ok_or_else(|| CodecError::CodecTypeMismatch {
            token: token.clone(),
            expected: std::any::type_name::<T>(),
        })
}

/// Builder for [`CodecRegistry`].
#[derive(Default)]
pub struct CodecRegistryBuilder {
    factories: Vec<Arc<dyn CodecFactory>>,
    writer_config: WriterConfig,
}

impl CodecRegistryBuilder {
    /// Registers a factory. Factories are consulted in registration order.
    pub fn factory(mut self, factory: impl CodecFactory + 'static) -> Self {
        self.factories.push(Arc::new(factory));
        self
    }

    pub fn serialize_nulls(mut self, serialize_nulls: bool) -> Self {
        self.writer_config.serialize_nulls = serialize_nulls;
        self
    }

    /// Writes indented output, `indent` once per nesting level.
    pub fn indent(mut self, indent: &'static str) -> Self {
        self.writer_config.indent = Some(indent);
        self
    }

    pub fn build(self) -> CodecRegistry {
        CodecRegistry {
            factories: self.factories,
            cache: RwLock::new(HashMap::new()),
            writer_config: self.writer_config,
        }
    }
}
