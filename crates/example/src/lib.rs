//! Example crate demonstrating tagwire-codegen usage.
//!
//! The types in [`model`] are annotated with `#[derive(JsonCodec)]`, which is a no-op
//! marker. build.rs scans `src/` and writes one codec per annotated type into `OUT_DIR`;
//! [`codecs`] includes them together with the `GeneratedCodecFactory` dispatch unit.

pub mod model;

/// Generated codecs.
pub mod codecs {
    include!(concat!(env!("OUT_DIR"), "/tagwire/codecs.rs"));
}

/// A registry serving every generated codec.
pub fn registry() -> tagwire::CodecRegistry {
    tagwire::CodecRegistry::builder()
        .factory(codecs::GeneratedCodecFactory)
        .build()
}
