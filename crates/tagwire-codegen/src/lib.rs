//! # tagwire-codegen
//!
//! Build-time generator of tagged-field JSON codecs. For every annotated struct it emits
//! a codec that reads and writes the struct as a JSON object keyed by field name, without
//! reflection, on top of the `tagwire` runtime.
//!
//! ## Usage
//!
//! ### 1. Annotate your types with `#[derive(JsonCodec)]`
//!
//! ```rust,ignore
//! use tagwire::JsonCodec;
//!
//! #[derive(JsonCodec)]
//! pub struct Item {
//!     #[tagwire(rename = "some_int")]
//!     pub some_int: i32,
//!     #[tagwire(default = "unnamed")]
//!     pub name: String,
//! }
//! ```
//!
//! ### 2. Generate codecs in build.rs
//!
//! ```rust,ignore
//! // build.rs
//! use tagwire_codegen::CodeGenerator;
//!
//! fn main() {
//!     let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR").unwrap());
//!     let mut generator = CodeGenerator::new();
//!     generator.add_source_dir("src").unwrap();
//!
//!     let generation = generator.write_to_dir(out_dir.join("tagwire")).unwrap();
//!     for failure in &generation.failures {
//!         println!("cargo:warning={failure}");
//!     }
//!     println!("cargo:rerun-if-changed=src");
//! }
//! ```
//!
//! ### 3. Include the generated codecs
//!
//! ```rust,ignore
//! pub mod codecs {
//!     include!(concat!(env!("OUT_DIR"), "/tagwire/codecs.rs"));
//! }
//!
//! let registry = tagwire::CodecRegistry::builder()
//!     .factory(codecs::GeneratedCodecFactory)
//!     .build();
//! ```
//!
//! Every annotated struct and its fields must be visible from the module that includes
//! the codecs. Declarations can also be supplied directly with
//! [`CodeGenerator::add_declaration`] when the types are not described by source files.

mod construct;
mod declaration;
mod decoder;
mod dispatch;
mod encoder;
mod error;
mod extractor;
mod generator;
pub mod naming;
mod plan;
mod registry;
mod schema;
mod sink;
mod source;
mod type_expr;

pub use declaration::{
    Declaration, DeclarationFlavor, DeclarationKind, DeclaredField, DefaultValue,
    InvalidAttribute,
};
pub use error::GenerateError;
pub use extractor::extract;
pub use generator::{CodeGenerator, GeneratedUnit, Generation};
pub use registry::{KnownType, TypeRegistry};
pub use schema::{ClassSchema, FieldSchema, Flavor, TypeDescriptor};
pub use sink::{FileSink, MANIFEST_FILE, MemorySink, OutputSink, SourceKind, UnitKey};
pub use type_expr::{TypeExpr, TypeExprError, build as build_type_expr};

#[cfg(feature = "derive")]
pub use tagwire_derive::JsonCodec;
