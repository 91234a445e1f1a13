//! Proc-macro providing the `#[derive(JsonCodec)]` attribute.
//!
//! This macro is a **no-op annotation** - it doesn't generate any code.
//! It marks a struct for codec generation by `tagwire-codegen` in your build.rs
//! and registers the `#[tagwire(...)]` helper attribute so field options compile.
//!
//! # Field options
//!
//! - `#[tagwire(rename = "wireName")]`: read and write the field under `wireName`
//! - `#[tagwire(default)]`: fill the field with `Default::default()` when absent
//! - `#[tagwire(default = expr)]`: fill the field with `expr` when absent; a string
//!   literal is converted with `Into`, so `default = "text"` works for `String` fields.
//!   Constants, variants and functions named in `expr` resolve in the struct's module and
//!   must be visible crate-wide
//!
//! # Container options
//!
//! - `#[tagwire(plain)]`: construct with a struct literal only; field defaults are rejected
//!
//! # Example
//!
//! ```rust,ignore
//! use tagwire::JsonCodec;
//!
//! #[derive(JsonCodec)]
//! struct Item {
//!     #[tagwire(rename = "some_int")]
//!     some_int: i32,
//!     #[tagwire(default = 30)]
//!     retries: i32,
//! }
//! ```
//!
//! Then in your build.rs:
//!
//! ```rust,ignore
//! use tagwire_codegen::CodeGenerator;
//!
//! fn main() {
//!     let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR").unwrap());
//!     let mut generator = CodeGenerator::new();
//!     generator.add_source_dir("src").unwrap();
//!     generator.write_to_dir(out_dir.join("tagwire")).unwrap();
//! }
//! ```

use proc_macro::TokenStream;

/// Marker derive macro for tagged-field JSON codec generation.
///
/// The actual codec generation happens in build.rs using `CodeGenerator`.
#[proc_macro_derive(JsonCodec, attributes(tagwire))]
pub fn derive_json_codec(_input: TokenStream) -> TokenStream {
    // No-op: actual code generation happens in build.rs
    TokenStream::new()
}
