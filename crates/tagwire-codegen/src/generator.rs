//! Codec generator: runs every declaration through extraction and emission.

use std::collections::HashMap;
use std::path::Path;

use proc_macro2::TokenStream;
use quote::quote;
use tracing::{debug, warn};

use crate::construct;
use crate::declaration::Declaration;
use crate::decoder;
use crate::dispatch::{self, DispatchEntry};
use crate::encoder;
use crate::error::GenerateError;
use crate::extractor;
use crate::plan::CodecPlan;
use crate::registry::{KnownType, TypeRegistry};
use crate::sink::{FileSink, OutputSink, UnitKey};

const DEFAULT_HEADER: &str = "Auto-generated by tagwire-codegen\nDO NOT EDIT MANUALLY";

/// One generated source unit.
#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    pub key: UnitKey,
    pub code: String,
}

/// Result of a generation run.
///
/// A schema that fails is reported in `failures` and leaves no unit behind; the other
/// schemas are unaffected.
#[derive(Debug, Default)]
pub struct Generation {
    pub units: Vec<GeneratedUnit>,
    pub failures: Vec<GenerateError>,
    /// Identities of the types that got a codec, in generation order
    pub codecs: Vec<String>,
}

impl Generation {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The unit whose main item is `name`, such as `ItemCodec`.
    pub fn unit(&self, name: &str) -> Option<&GeneratedUnit> {
        self.units.iter().find(|unit| unit.key.name == name)
    }
}

/// Code generator that collects declarations and emits one codec unit per schema plus a
/// dispatch unit.
///
/// # Example
///
/// ```
/// use tagwire_codegen::{CodeGenerator, Declaration, DeclaredField};
///
/// let mut generator = CodeGenerator::new();
/// generator.add_declaration(
///     Declaration::new("crate::model::Point")
///         .field(DeclaredField::new("x", syn::parse_quote!(f64)))
///         .field(DeclaredField::new("y", syn::parse_quote!(f64))),
/// );
/// let generation = generator.generate();
/// assert!(generation.is_success());
/// assert!(generation.unit("PointCodec").is_some());
/// ```
#[derive(Debug)]
pub struct CodeGenerator {
    declarations: Vec<Declaration>,

    /// Custom header comment
    header: Option<String>,

    /// Path generated code uses to reach the runtime crate
    runtime_path: String,

    codec_suffix: String,

    dispatch_package: String,
    dispatch_name: String,

    /// Format output with prettyplease instead of emitting raw tokens
    pretty_print: bool,

    /// Fully-qualified derive marker the source scanner looks for
    pub(crate) marker: String,

    /// Module path of scanned root files
    pub(crate) module_root: String,

    /// Type registry for resolving field types
    pub(crate) registry: TypeRegistry,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self {
            declarations: Vec::new(),
            header: None,
            runtime_path: "::tagwire".to_string(),
            codec_suffix: "Codec".to_string(),
            dispatch_package: "tagwire_generated".to_string(),
            dispatch_name: "GeneratedCodecFactory".to_string(),
            pretty_print: true,
            marker: "tagwire::JsonCodec".to_string(),
            module_root: "crate".to_string(),
            registry: TypeRegistry::with_builtins(),
        }
    }
}

impl CodeGenerator {
    /// Create a new code generator with built-in type mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom header comment for every generated unit.
    pub fn set_header(&mut self, header: impl Into<String>) -> &mut Self {
        self.header = Some(header.into());
        self
    }

    /// Set the path generated code uses for the runtime crate (default `::tagwire`).
    ///
    /// Useful when the runtime is re-exported, e.g. `::my_crate::tagwire`.
    pub fn set_runtime_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.runtime_path = path.into();
        self
    }

    /// Set the suffix appended to a type's name to name its codec (default `Codec`).
    pub fn set_codec_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.codec_suffix = suffix.into();
        self
    }

    /// Set the package and name of the dispatch unit
    /// (default `tagwire_generated` / `GeneratedCodecFactory`).
    pub fn set_dispatch_unit(
        &mut self,
        package: impl Into<String>,
        name: impl Into<String>,
    ) -> &mut Self {
        self.dispatch_package = package.into();
        self.dispatch_name = name.into();
        self
    }

    /// Set the fully-qualified derive marker the source scanner looks for
    /// (default `tagwire::JsonCodec`).
    pub fn set_marker(&mut self, marker: impl Into<String>) -> &mut Self {
        self.marker = marker.into();
        self
    }

    /// Set the module path scanned root files belong to (default `crate`).
    pub fn set_module_root(&mut self, module: impl Into<String>) -> &mut Self {
        self.module_root = module.into();
        self
    }

    /// Enable or disable prettyplease formatting of the output (default enabled).
    pub fn pretty_print(&mut self, enabled: bool) -> &mut Self {
        self.pretty_print = enabled;
        self
    }

    /// Register a type path in the type registry.
    ///
    /// The runtime must provide a `WireType` impl for the canonical name.
    pub fn register_type(&mut self, name: impl Into<String>, known: KnownType) -> &mut Self {
        self.registry.register(name, known);
        self
    }

    /// Remove a type mapping from the registry.
    ///
    /// This can be used to disable a built-in mapping.
    pub fn unregister_type(&mut self, name: &str) -> &mut Self {
        self.registry.unregister(name);
        self
    }

    /// Get a reference to the type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Add a host-supplied declaration.
    pub fn add_declaration(&mut self, declaration: Declaration) -> &mut Self {
        debug!(identity = %declaration.identity, "added declaration");
        self.declarations.push(declaration);
        self
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Generate one unit per schema and the dispatch unit.
    pub fn generate(&self) -> Generation {
        let mut generation = Generation::default();

        let runtime = match syn::parse_str::<syn::Path>(&self.runtime_path) {
            Ok(runtime) => runtime,
            Err(source) => {
                generation.failures.push(GenerateError::InvalidGeneratedCode {
                    unit: format!("runtime path `{}`", self.runtime_path),
                    source,
                });
                return generation;
            }
        };

        let mut codec_names: HashMap<String, String> = HashMap::new();
        let mut entries = Vec::new();

        for decl in &self.declarations {
            match self.generate_schema(decl, &runtime, &codec_names) {
                Ok((unit, entry)) => {
                    debug!(schema = %entry.identity, unit = %unit.key.name, "generated codec");
                    codec_names.insert(unit.key.name.clone(), entry.identity.clone());
                    generation.codecs.push(entry.identity.clone());
                    generation.units.push(unit);
                    entries.push(entry);
                }
                Err(err) => {
                    warn!(
                        schema = err.schema().unwrap_or(&decl.identity),
                        error = %err,
                        "codec generation failed"
                    );
                    generation.failures.push(err);
                }
            }
        }

        match self.generate_dispatch_unit(&entries, &runtime) {
            Ok(Some(unit)) => generation.units.push(unit),
            Ok(None) => debug!("no codecs generated; skipping dispatch unit"),
            Err(err) => {
                warn!(error = %err, "dispatch generation failed");
                generation.failures.push(err);
            }
        }

        generation
    }

    /// Generate and hand every unit to `sink`.
    ///
    /// Schema failures are returned in the [`Generation`]; only sink errors fail the call.
    pub fn write_to(&self, sink: &mut dyn OutputSink) -> Result<Generation, GenerateError> {
        let generation = self.generate();
        for unit in &generation.units {
            sink.write_unit(&unit.key, &unit.code)?;
        }
        sink.finish()?;
        Ok(generation)
    }

    /// Generate into `dir` with a [`FileSink`], including the `codecs.rs` manifest.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> Result<(), tagwire_codegen::GenerateError> {
    /// use tagwire_codegen::CodeGenerator;
    ///
    /// let mut generator = CodeGenerator::new();
    /// generator.add_source_dir("src")?;
    /// let generation = generator.write_to_dir("target/tagwire")?;
    /// for failure in &generation.failures {
    ///     println!("cargo:warning={failure}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<Generation, GenerateError> {
        let mut sink = FileSink::new(dir.as_ref());
        self.write_to(&mut sink)
    }

    fn generate_schema(
        &self,
        decl: &Declaration,
        runtime: &syn::Path,
        codec_names: &HashMap<String, String>,
    ) -> Result<(GeneratedUnit, DispatchEntry), GenerateError> {
        let schema = extractor::extract(decl, &self.registry)?;
        let plan = CodecPlan::new(&schema, runtime, &self.codec_suffix)?;

        let codec_name = plan.codec_ident.to_string();
        if let Some(existing) = codec_names.get(&codec_name) {
            return Err(GenerateError::CodecNameCollision {
                schema: schema.identity.clone(),
                existing: existing.clone(),
                codec: codec_name,
            });
        }

        let code = self.render(&codec_name, codec_unit(&plan))?;
        let entry = DispatchEntry {
            identity: schema.identity.clone(),
            target: plan.target.clone(),
            codec_ident: plan.codec_ident.clone(),
        };
        let unit = GeneratedUnit {
            key: UnitKey::rust(schema.module(), codec_name),
            code,
        };
        Ok((unit, entry))
    }

    fn generate_dispatch_unit(
        &self,
        entries: &[DispatchEntry],
        runtime: &syn::Path,
    ) -> Result<Option<GeneratedUnit>, GenerateError> {
        let factory = syn::parse_str::<syn::Ident>(&self.dispatch_name).map_err(|source| {
            GenerateError::InvalidGeneratedCode {
                unit: self.dispatch_name.clone(),
                source,
            }
        })?;
        let Some(tokens) = dispatch::generate_dispatch(entries, &factory, runtime) else {
            return Ok(None);
        };
        let code = self.render(&self.dispatch_name, tokens)?;
        Ok(Some(GeneratedUnit {
            key: UnitKey::rust(self.dispatch_package.clone(), self.dispatch_name.clone()),
            code,
        }))
    }

    /// Validate `tokens` as a Rust file, format it and prepend the header.
    fn render(&self, unit: &str, tokens: TokenStream) -> Result<String, GenerateError> {
        let file: syn::File = syn::parse2(tokens.clone()).map_err(|source| {
            GenerateError::InvalidGeneratedCode {
                unit: unit.to_string(),
                source,
            }
        })?;
        let body = if self.pretty_print {
            prettyplease::unparse(&file)
        } else {
            format!("{tokens}\n")
        };
        Ok(format!("{}\n{}", self.header_comment(), body))
    }

    fn header_comment(&self) -> String {
        let header = self.header.as_deref().unwrap_or(DEFAULT_HEADER);
        let mut output = String::new();
        for line in header.lines() {
            if line.is_empty() {
                output.push_str("//\n");
            } else {
                output.push_str("// ");
                output.push_str(line);
                output.push('\n');
            }
        }
        output
    }
}

/// The codec struct, its `Codec` impl and the target's `WireType` impl.
fn codec_unit(plan: &CodecPlan<'_>) -> TokenStream {
    let rt = plan.runtime;
    let target = &plan.target;
    let codec = &plan.codec_ident;
    let identity = plan.identity();
    let doc = format!(" Tagged-field JSON codec for `{identity}`.");

    let fields = plan.fields.iter().map(|field| {
        let name = &field.codec;
        let ty = &field.value_ty;
        quote!(#name: ::std::sync::Arc<dyn #rt::Codec<#ty>>)
    });
    let lookups = plan.fields.iter().map(|field| {
        let name = &field.codec;
        let ty = &field.value_ty;
        let token = &field.token;
        quote!(#name: registry.codec::<#ty>(&#token)?)
    });
    let defaulting_constructor = construct::generate_defaulting_constructor(plan);
    let decode = decoder::generate_decode(plan);
    let encode = encoder::generate_encode(plan);

    quote! {
        #[doc = #doc]
        pub struct #codec {
            #(#fields,)*
        }

        impl #codec {
            /// Looks up every field codec in `registry`.
            #[allow(unused_variables)]
            pub fn new(registry: &#rt::CodecRegistry) -> #rt::CodecResult<Self> {
                ::std::result::Result::Ok(Self {
                    #(#lookups,)*
                })
            }

            #defaulting_constructor
        }

        impl #rt::Codec<#target> for #codec {
            #decode

            #encode
        }

        impl #rt::WireType for #target {
            fn type_token() -> #rt::TypeToken {
                #rt::TypeToken::of(#identity)
            }

            fn default_codec(
                registry: &#rt::CodecRegistry,
                _token: &#rt::TypeToken,
            ) -> #rt::CodecResult<::std::sync::Arc<dyn #rt::Codec<Self>>> {
                ::std::result::Result::Ok(::std::sync::Arc::new(#codec::new(registry)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::declaration::{DeclarationKind, DeclaredField, DefaultValue};
    use crate::sink::MemorySink;

    const MODEL: &str = r#"
        use std::collections::HashMap;
        use tagwire::JsonCodec;

        #[derive(JsonCodec)]
        pub struct Item {
            #[tagwire(rename = "some_int")]
            pub some_int: i32,
            pub some_string: String,
            pub tags: Vec<String>,
            pub scores: HashMap<String, f64>,
            pub nickname: Option<String>,
        }

        #[derive(JsonCodec)]
        pub struct ItemWithDefault {
            #[tagwire(rename = "requiredString")]
            pub required_string: String,
            #[tagwire(rename = "someInt", default = 30)]
            pub some_int: i32,
            #[tagwire(default)]
            pub some_boolean: bool,
        }
    "#;

    fn generate_model() -> Generation {
        let mut generator = CodeGenerator::new();
        generator.add_source_str(MODEL).unwrap();
        generator.generate()
    }

    #[test]
    fn test_generates_unit_per_schema_and_dispatch() {
        let generation = generate_model();
        assert!(generation.is_success(), "{:?}", generation.failures);
        assert_eq!(generation.codecs, ["crate::Item", "crate::ItemWithDefault"]);

        let names: Vec<_> = generation.units.iter().map(|u| u.key.name.as_str()).collect();
        assert_eq!(names, ["ItemCodec", "ItemWithDefaultCodec", "GeneratedCodecFactory"]);
        assert_eq!(generation.units[0].key.package, "crate");
        assert_eq!(generation.units[2].key.package, "tagwire_generated");

        for unit in &generation.units {
            assert!(unit.code.starts_with("// Auto-generated by tagwire-codegen\n// DO NOT EDIT MANUALLY\n"));
            syn::parse_file(&unit.code).unwrap();
        }
    }

    #[test]
    fn test_plain_codec_unit() {
        let generation = generate_model();
        let code = &generation.unit("ItemCodec").unwrap().code;

        assert!(code.contains("pub struct ItemCodec {"));
        assert!(code.contains("some_int_codec: ::std::sync::Arc<dyn ::tagwire::Codec<i32>>"));
        assert!(code.contains("impl ::tagwire::Codec<crate::Item> for ItemCodec"));
        assert!(code.contains("impl ::tagwire::WireType for crate::Item"));
        assert!(code.contains("::tagwire::TypeToken::of(\"crate::Item\")"));
        assert!(code.contains("\"some_int\" =>"));
        assert!(!code.contains("\"someInt\""));
        assert!(code.contains("::std::collections::HashMap<::std::string::String, f64>"));
        assert!(code.contains("nickname_codec: ::std::sync::Arc<dyn ::tagwire::Codec<::std::string::String>>"));
        assert!(!code.contains("fn construct("));
        assert!(!code.contains("mask0"));
    }

    #[test]
    fn test_defaulted_codec_unit() {
        let generation = generate_model();
        let code = &generation.unit("ItemWithDefaultCodec").unwrap().code;

        assert!(code.contains("fn construct("));
        assert!(code.contains("_marker: ::tagwire::DefaultMarker"));
        assert!(code.contains("let mut mask0: u32 = !0;"));
        assert!(code.contains("mask0 &= !2u32;"));
        assert!(code.contains("(mask0 & 2u32) != 0"));
        assert!(code.contains("::std::default::Default::default()"));
        assert!(code.contains("Self::construct("));
    }

    #[test]
    fn test_dispatch_unit() {
        let generation = generate_model();
        let code = &generation.unit("GeneratedCodecFactory").unwrap().code;

        assert!(code.contains("pub struct GeneratedCodecFactory;"));
        assert!(code.contains("impl ::tagwire::CodecFactory for GeneratedCodecFactory"));
        assert!(code.contains("\"crate::Item\" =>"));
        assert!(code.contains("ItemWithDefaultCodec::new(registry)"));
    }

    #[test]
    fn test_failures_do_not_block_other_schemas() {
        let mut generator = CodeGenerator::new();
        generator
            .add_declaration(Declaration::new("crate::Pair").kind(DeclarationKind::TupleStruct))
            .add_declaration(
                Declaration::new("crate::Point").field(DeclaredField::new("x", syn::parse_quote!(f64))),
            )
            .add_declaration(
                Declaration::new("crate::Dup")
                    .field(DeclaredField::new("a", syn::parse_quote!(i32)).rename("x"))
                    .field(DeclaredField::new("x", syn::parse_quote!(i32))),
            );

        let generation = generator.generate();
        assert_eq!(generation.failures.len(), 2);
        assert_eq!(generation.failures[0].schema(), Some("crate::Pair"));
        assert_eq!(generation.failures[1].schema(), Some("crate::Dup"));
        assert_eq!(generation.codecs, ["crate::Point"]);
        assert!(generation.unit("PointCodec").is_some());
        assert!(generation.unit("GeneratedCodecFactory").is_some());
    }

    #[test]
    fn test_empty_generation_has_no_dispatch_unit() {
        let generation = CodeGenerator::new().generate();
        assert!(generation.is_success());
        assert!(generation.units.is_empty());
    }

    #[test]
    fn test_codec_name_collision() {
        let mut generator = CodeGenerator::new();
        generator
            .add_declaration(Declaration::new("crate::a::Item"))
            .add_declaration(Declaration::new("crate::b::Item"));

        let generation = generator.generate();
        assert_eq!(generation.codecs, ["crate::a::Item"]);
        match &generation.failures[..] {
            [GenerateError::CodecNameCollision { existing, codec, .. }] => {
                assert_eq!(existing, "crate::a::Item");
                assert_eq!(codec, "ItemCodec");
            }
            other => panic!("unexpected failures: {other:?}"),
        }
    }

    #[test]
    fn test_configuration() {
        let mut generator = CodeGenerator::new();
        generator
            .set_header("custom header\n\nsecond line")
            .set_runtime_path("::my_crate::wire")
            .set_codec_suffix("JsonCodec")
            .set_dispatch_unit("crate::codecs", "ModelCodecs")
            .add_declaration(
                Declaration::new("crate::Point").field(
                    DeclaredField::new("x", syn::parse_quote!(f64))
                        .default_value(DefaultValue::Expr("1.5".into())),
                ),
            );

        let generation = generator.generate();
        assert!(generation.is_success());
        let unit = generation.unit("PointJsonCodec").unwrap();
        assert!(unit.code.starts_with("// custom header\n//\n// second line\n"));
        assert!(unit.code.contains("::my_crate::wire::DefaultMarker"));
        let dispatch = generation.unit("ModelCodecs").unwrap();
        assert_eq!(dispatch.key.package, "crate::codecs");
    }

    #[test]
    fn test_invalid_runtime_path() {
        let mut generator = CodeGenerator::new();
        generator
            .set_runtime_path("not a path")
            .add_declaration(Declaration::new("crate::Empty"));

        let generation = generator.generate();
        assert!(generation.units.is_empty());
        assert!(matches!(
            generation.failures[..],
            [GenerateError::InvalidGeneratedCode { .. }]
        ));
    }

    #[test]
    fn test_without_pretty_print() {
        let mut generator = CodeGenerator::new();
        generator
            .pretty_print(false)
            .add_declaration(Declaration::new("crate::Empty"));

        let generation = generator.generate();
        let code = &generation.unit("EmptyCodec").unwrap().code;
        assert!(code.contains("pub struct EmptyCodec { }"));
    }

    #[test]
    fn test_write_to_sinks() {
        let mut generator = CodeGenerator::new();
        generator.add_source_str(MODEL).unwrap();

        let mut memory = MemorySink::new();
        generator.write_to(&mut memory).unwrap();
        assert!(memory.get(&UnitKey::rust("crate", "ItemCodec")).is_some());

        let dir = tempfile::tempdir().unwrap();
        let generation = generator.write_to_dir(dir.path()).unwrap();
        assert_eq!(generation.units.len(), 3);
        assert!(dir.path().join("item_codec.rs").exists());
        assert!(dir.path().join("tagwire_generated").join("generated_codec_factory.rs").exists());
        let manifest = fs::read_to_string(dir.path().join("codecs.rs")).unwrap();
        assert_eq!(manifest.matches("include!").count(), 3);
    }
}
