//! # tagwire
//!
//! Streaming runtime for codecs generated by `tagwire-codegen`.
//!
//! Generated code calls into three pieces of this crate:
//!
//! - [`JsonReader`] / [`JsonWriter`]: pull reader and streaming writer for the wire format,
//!   both on top of `serde_json`
//! - [`TypeToken`]: runtime description of a possibly generic field type
//! - [`CodecRegistry`]: the lookup service every codec constructor receives, which
//!   resolves a token to a cached [`Codec`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tagwire::CodecRegistry;
//!
//! let registry = CodecRegistry::builder()
//!     .factory(codecs::GeneratedCodecFactory)
//!     .build();
//!
//! let item: Option<Item> = registry.from_json(r#"{"some_int": 1}"#)?;
//! let json = registry.to_json(item.as_ref())?;
//! ```

mod builtins;
mod codec;
mod error;
mod node;
mod reader;
mod registry;
mod token;
mod type_token;
mod writer;

pub use builtins::MapKey;
pub use codec::{Codec, DefaultMarker, ErasedCodec, WireType, require_field};
pub use error::{CodecError, CodecResult};
pub use reader::JsonReader;
pub use registry::{CodecFactory, CodecRegistry, CodecRegistryBuilder};
pub use token::JsonToken;
pub use type_token::TypeToken;
pub use writer::{JsonWriter, WriterConfig};

/// Canonical raw names of the built-in container and string types.
pub mod raw_names {
    pub use crate::builtins::{BOX, BTREE_MAP, HASH_MAP, OPTION, STRING, VEC};
}

#[cfg(feature = "derive")]
pub use tagwire_derive::JsonCodec;
