//! Source file scanner that turns types annotated with `#[derive(JsonCodec)]` into
//! [`Declaration`]s.
//!
//! This is one supplier of declarations. Hosts that already know their types can skip it
//! and call [`CodeGenerator::add_declaration`] directly.
//!
//! ## Use-item analysis
//!
//! Each file (and each inline `mod` block) gets a map from local names to the paths they
//! were imported from:
//!
//! - `use std::collections::BTreeMap` maps `"BTreeMap"` to `"std::collections::BTreeMap"`
//! - `use std::collections::BTreeMap as Map` maps `"Map"` to `"std::collections::BTreeMap"`
//! - `use tagwire::JsonCodec as Codec` maps `"Codec"` to `"tagwire::JsonCodec"`, which is
//!   then recognized as the derive marker.
//!
//! ## Module paths
//!
//! [`CodeGenerator::add_source_dir`] derives each file's module from its path relative to
//! the scanned directory (`model.rs` and `model/mod.rs` are both `crate::model`).
//! Single files and strings are treated as the crate root module, which is `crate` unless
//! changed with [`CodeGenerator::set_module_root`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ExprLit, Fields, Lit, Meta, Token, UseTree};
use tracing::debug;
use walkdir::WalkDir;

use crate::CodeGenerator;
use crate::declaration::{
    Declaration, DeclarationFlavor, DeclarationKind, DeclaredField, DefaultValue,
    InvalidAttribute,
};
use crate::error::GenerateError;

/// Per-module context built from `use` items.
struct SourceContext {
    /// Module path of the items, such as `crate::model`
    module: String,
    /// Maps local name -> path as imported.
    ///
    /// Glob imports are not tracked since they can't be resolved statically.
    imports: HashMap<String, String>,
}

/// Recursively flatten a `UseTree` into import entries.
fn collect_imports(tree: &UseTree, prefix: &[String], imports: &mut HashMap<String, String>) {
    match tree {
        UseTree::Path(p) => {
            let mut new_prefix = prefix.to_vec();
            new_prefix.push(p.ident.to_string());
            collect_imports(&p.tree, &new_prefix, imports);
        }
        UseTree::Name(n) => {
            let name = n.ident.to_string();
            // `use foo::bar::{self}` imports `bar`
            if name == "self" {
                if let Some((last, init)) = prefix.split_last() {
                    imports.insert(last.clone(), make_full_path(init, last));
                }
                return;
            }
            let full_path = make_full_path(prefix, &name);
            imports.insert(name, full_path);
        }
        UseTree::Rename(r) => {
            let full_path = make_full_path(prefix, &r.ident.to_string());
            imports.insert(r.rename.to_string(), full_path);
        }
        UseTree::Glob(_) => {}
        UseTree::Group(g) => {
            for item in &g.items {
                collect_imports(item, prefix, imports);
            }
        }
    }
}

/// Join prefix segments with the final name using `::`.
fn make_full_path(prefix: &[String], name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", prefix.join("::"), name)
    }
}

fn build_source_context(items: &[syn::Item], module: String) -> SourceContext {
    let mut imports = HashMap::new();
    for item in items {
        if let syn::Item::Use(item_use) = item {
            collect_imports(&item_use.tree, &[], &mut imports);
        }
    }
    SourceContext { module, imports }
}

fn path_to_string(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect::<Vec<_>>()
        .join("::")
}

/// Check if the attributes contain the marker derive.
///
/// Recognizes, for the marker `tagwire::JsonCodec`:
/// - `#[derive(JsonCodec)]` when `use tagwire::JsonCodec` is in scope
/// - `#[derive(Codec)]` when `use tagwire::JsonCodec as Codec` is in scope
/// - `#[derive(tagwire::JsonCodec)]` or any other written-out path ending in `::JsonCodec`
///
/// A bare name imported from anywhere else, such as `use other_crate::JsonCodec`, is not
/// the marker.
fn has_marker_derive(attrs: &[Attribute], ctx: &SourceContext, marker: &str) -> bool {
    let marker_name = marker.rsplit("::").next().unwrap_or(marker);
    let suffix = format!("::{marker_name}");

    for attr in attrs {
        if !attr.path().is_ident("derive") {
            continue;
        }
        let Ok(nested) = attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
        else {
            continue;
        };
        for path in nested {
            if path.segments.len() == 1 {
                let ident = path.segments[0].ident.to_string();
                if ctx.imports.get(&ident).is_some_and(|p| p == marker) {
                    return true;
                }
            } else {
                let qualified = path_to_string(&path);
                if qualified == marker || qualified.ends_with(&suffix) {
                    return true;
                }
            }
        }
    }
    false
}

/// Collect the `name = value` and bare-word entries of every `#[tagwire(..)]` attribute.
fn tagwire_metas(attrs: &[Attribute]) -> syn::Result<Vec<Meta>> {
    let mut metas = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("tagwire")) {
        metas.extend(attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?);
    }
    Ok(metas)
}

fn container_flavor(attrs: &[Attribute]) -> syn::Result<DeclarationFlavor> {
    let mut flavor = DeclarationFlavor::Managed;
    for meta in tagwire_metas(attrs)? {
        match &meta {
            Meta::Path(path) if path.is_ident("plain") => flavor = DeclarationFlavor::Plain,
            _ => return Err(syn::Error::new_spanned(meta, "unknown tagwire container option")),
        }
    }
    Ok(flavor)
}

fn parse_field(field: &syn::Field) -> syn::Result<Option<DeclaredField>> {
    let Some(ident) = &field.ident else {
        return Ok(None);
    };
    let mut declared = DeclaredField::new(ident.to_string(), field.ty.clone());

    for meta in tagwire_metas(&field.attrs)? {
        match &meta {
            Meta::NameValue(nv) if nv.path.is_ident("rename") => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => declared.rename = Some(s.value()),
                other => {
                    return Err(syn::Error::new_spanned(other, "expected a string literal"));
                }
            },
            Meta::Path(path) if path.is_ident("default") => {
                declared.default = Some(DefaultValue::Trait);
            }
            Meta::NameValue(nv) if nv.path.is_ident("default") => {
                let expr = match &nv.value {
                    // String literals convert into the field type
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(s), ..
                    }) => format!("::std::convert::Into::into({:?})", s.value()),
                    value => quote::quote!(#value).to_string(),
                };
                declared.default = Some(DefaultValue::Expr(expr));
            }
            _ => return Err(syn::Error::new_spanned(meta, "unknown tagwire field option")),
        }
    }

    Ok(Some(declared))
}

fn is_cfg_test(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .parse_args::<syn::Ident>()
                .is_ok_and(|ident| ident == "test")
    })
}

fn declaration_for(
    ident: &syn::Ident,
    generics: &syn::Generics,
    kind: DeclarationKind,
    ctx: &SourceContext,
) -> Declaration {
    let mut decl = Declaration::new(format!("{}::{}", ctx.module, ident)).kind(kind);
    decl.generics = generics
        .type_params()
        .map(|param| param.ident.to_string())
        .collect();
    decl.imports = ctx.imports.clone();
    decl
}

/// Scan the items of one module (and its inline child modules) for marked types.
///
/// A malformed `#[tagwire(..)]` attribute is recorded on its declaration and scanning
/// goes on, so that one bad struct fails alone at generation time.
fn scan_items(items: &[syn::Item], module: String, marker: &str, out: &mut Vec<Declaration>) {
    let ctx = build_source_context(items, module);

    for item in items {
        match item {
            syn::Item::Struct(s) if has_marker_derive(&s.attrs, &ctx, marker) => {
                let kind = match &s.fields {
                    Fields::Named(_) => DeclarationKind::NamedStruct,
                    Fields::Unnamed(_) => DeclarationKind::TupleStruct,
                    Fields::Unit => DeclarationKind::UnitStruct,
                };
                let mut decl = declaration_for(&s.ident, &s.generics, kind, &ctx);
                match container_flavor(&s.attrs) {
                    Ok(flavor) => decl.flavor = flavor,
                    Err(err) => decl.invalid_attributes.push(InvalidAttribute {
                        field: None,
                        reason: err.to_string(),
                    }),
                }
                for field in &s.fields {
                    match parse_field(field) {
                        Ok(Some(declared)) => decl.fields.push(declared),
                        Ok(None) => {}
                        Err(err) => decl.invalid_attributes.push(InvalidAttribute {
                            field: field.ident.as_ref().map(ToString::to_string),
                            reason: err.to_string(),
                        }),
                    }
                }
                out.push(decl);
            }
            syn::Item::Enum(e) if has_marker_derive(&e.attrs, &ctx, marker) => {
                out.push(declaration_for(&e.ident, &e.generics, DeclarationKind::Enum, &ctx));
            }
            syn::Item::Union(u) if has_marker_derive(&u.attrs, &ctx, marker) => {
                out.push(declaration_for(&u.ident, &u.generics, DeclarationKind::Union, &ctx));
            }
            syn::Item::Mod(m) if !is_cfg_test(&m.attrs) => {
                if let Some((_, content)) = &m.content {
                    scan_items(content, format!("{}::{}", ctx.module, m.ident), marker, out);
                }
            }
            _ => {}
        }
    }
}

/// Module path of a file given its path relative to the scanned source root.
fn module_for(relative: &Path, root: &str) -> String {
    let mut segments = vec![root.to_string()];
    let parent = relative.parent().into_iter().flat_map(|p| p.components());
    segments.extend(parent.map(|c| c.as_os_str().to_string_lossy().into_owned()));
    if let Some(stem) = relative.file_stem().map(|s| s.to_string_lossy())
        && !matches!(stem.as_ref(), "lib" | "main" | "mod")
    {
        segments.push(stem.into_owned());
    }
    segments.join("::")
}

impl CodeGenerator {
    fn add_source(&mut self, source: &str, path: &str, module: String) -> Result<(), GenerateError> {
        let file = syn::parse_file(source).map_err(|source| GenerateError::Parse {
            path: path.to_string(),
            source,
        })?;

        let mut declarations = Vec::new();
        scan_items(&file.items, module, &self.marker, &mut declarations);

        debug!(path, count = declarations.len(), "scanned source");
        for decl in declarations {
            self.add_declaration(decl);
        }
        Ok(())
    }

    /// Parse a single Rust source file as the root module and collect marked types.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> Result<(), tagwire_codegen::GenerateError> {
    /// use tagwire_codegen::CodeGenerator;
    ///
    /// let mut generator = CodeGenerator::new();
    /// generator.add_source_file("src/lib.rs")?;
    /// generator.write_to_dir("generated")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn add_source_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, GenerateError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| GenerateError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let module = self.module_root.clone();
        self.add_source(&source, &path.display().to_string(), module)?;
        Ok(self)
    }

    /// Parse Rust source from a string as the root module and collect marked types.
    pub fn add_source_str(&mut self, source: &str) -> Result<&mut Self, GenerateError> {
        let module = self.module_root.clone();
        self.add_source(source, "<string>", module)?;
        Ok(self)
    }

    /// Recursively scan a directory for `.rs` files and collect marked types.
    ///
    /// Files are visited in name order so that generation output is stable.
    pub fn add_source_dir(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, GenerateError> {
        let root = path.as_ref();
        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "rs") {
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(path);
            let module = module_for(relative, &self.module_root);
            let source = fs::read_to_string(path).map_err(|source| GenerateError::Read {
                path: path.display().to_string(),
                source,
            })?;
            self.add_source(&source, &path.display().to_string(), module)?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use test_case::test_case;

    use super::*;

    fn scan(source: &str) -> Vec<Declaration> {
        let mut generator = CodeGenerator::new();
        generator.add_source_str(source).unwrap();
        generator.declarations().to_vec()
    }

    #[test]
    fn test_extract_simple_struct() {
        let decls = scan(
            r#"
            use tagwire::JsonCodec;
            #[derive(JsonCodec)]
            struct Point { x: f64, y: f64 }
        "#,
        );
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].identity, "crate::Point");
        assert_eq!(decls[0].kind, DeclarationKind::NamedStruct);
        let names: Vec<_> = decls[0].fields.iter().map(|f| f.ident.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
    }

    #[test]
    fn test_ignores_unmarked_types() {
        let decls = scan(
            r#"
            use tagwire::JsonCodec;
            #[derive(Debug)]
            struct NotExported { x: i32 }
            #[derive(Debug, JsonCodec)]
            struct Exported { y: i32 }
        "#,
        );
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].simple_name(), "Exported");
    }

    #[test_case("#[derive(tagwire::JsonCodec)]" ; "qualified")]
    #[test_case("#[derive(tagwire_derive::JsonCodec)]" ; "re-export")]
    fn test_qualified_marker(derive: &str) {
        let decls = scan(&format!("{derive} struct Qualified {{ value: u32 }}"));
        assert_eq!(decls.len(), 1);
    }

    #[test]
    fn test_marker_alias() {
        let decls = scan(
            r#"
            use tagwire::JsonCodec as Codec;
            #[derive(Codec)]
            struct Aliased { value: u32 }
        "#,
        );
        assert_eq!(decls.len(), 1);
    }

    #[test]
    fn test_unimported_marker_not_detected() {
        let decls = scan(
            r#"
            #[derive(JsonCodec)]
            struct NoImport { value: u32 }
        "#,
        );
        assert!(decls.is_empty());
    }

    #[test]
    fn test_foreign_derive_with_same_name_not_detected() {
        let decls = scan(
            r#"
            use other_crate::JsonCodec;
            #[derive(JsonCodec)]
            struct Foreign { value: u32 }
        "#,
        );
        assert!(decls.is_empty());
    }

    #[test]
    fn test_custom_marker() {
        let mut generator = CodeGenerator::new();
        generator.set_marker("my_crate::Wire");
        generator
            .add_source_str(
                r#"
                use my_crate::Wire;
                use tagwire::JsonCodec;
                #[derive(Wire)]
                struct Custom { a: i32 }
                #[derive(JsonCodec)]
                struct Default { b: i32 }
            "#,
            )
            .unwrap();
        let decls = generator.declarations();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].simple_name(), "Custom");
    }

    #[test]
    fn test_field_attributes() {
        let decls = scan(
            r#"
            use tagwire::JsonCodec;
            #[derive(JsonCodec)]
            struct Item {
                #[tagwire(rename = "some_int")]
                some_int: i32,
                #[tagwire(default)]
                flag: bool,
                #[tagwire(default = 30)]
                count: i32,
                #[tagwire(rename = "label", default = "none")]
                r#type: String,
            }
        "#,
        );
        let fields = &decls[0].fields;
        assert_eq!(fields[0].rename.as_deref(), Some("some_int"));
        assert_eq!(fields[1].default, Some(DefaultValue::Trait));
        assert_eq!(fields[2].default, Some(DefaultValue::Expr("30".into())));
        assert_eq!(fields[3].ident, "r#type");
        assert_eq!(fields[3].rename.as_deref(), Some("label"));
        assert_eq!(
            fields[3].default,
            Some(DefaultValue::Expr(
                "::std::convert::Into::into(\"none\")".into()
            ))
        );
    }

    #[test]
    fn test_unknown_field_option_is_recorded() {
        let decls = scan(
            r#"
            use tagwire::JsonCodec;
            #[derive(JsonCodec)]
            struct Item { #[tagwire(skip)] a: i32, b: i32 }
        "#,
        );
        assert_eq!(decls.len(), 1);
        let invalid = &decls[0].invalid_attributes;
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].field.as_deref(), Some("a"));
        assert!(invalid[0].reason.contains("unknown tagwire field option"));
        let names: Vec<_> = decls[0].fields.iter().map(|f| f.ident.as_str()).collect();
        assert_eq!(names, ["b"]);
    }

    #[test]
    fn test_unknown_container_option_is_recorded() {
        let decls = scan(
            r#"
            use tagwire::JsonCodec;
            #[derive(JsonCodec)]
            #[tagwire(transparent)]
            struct Item { a: i32 }
        "#,
        );
        assert_eq!(decls[0].invalid_attributes.len(), 1);
        assert_eq!(decls[0].invalid_attributes[0].field, None);
    }

    #[test]
    fn test_malformed_attribute_fails_only_its_schema() {
        let mut generator = CodeGenerator::new();
        generator
            .add_source_str(
                r#"
                use tagwire::JsonCodec;
                #[derive(JsonCodec)]
                struct Good { x: i32 }
                #[derive(JsonCodec)]
                struct Bad { #[tagwire(rename = 5)] y: i32 }
                #[derive(JsonCodec)]
                struct AlsoGood { z: i32 }
            "#,
            )
            .unwrap();
        assert_eq!(generator.declarations().len(), 3);

        let generation = generator.generate();
        assert!(generation.unit("GoodCodec").is_some());
        assert!(generation.unit("AlsoGoodCodec").is_some());
        assert!(generation.unit("BadCodec").is_none());
        assert_eq!(generation.failures.len(), 1);
        match &generation.failures[0] {
            GenerateError::InvalidAttribute { schema, field, .. } => {
                assert_eq!(schema, "crate::Bad");
                assert_eq!(field.as_deref(), Some("y"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_attribute_keeps_later_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.rs"),
            "use tagwire::JsonCodec;\n#[derive(JsonCodec)]\npub struct Bad { #[tagwire(rename)] a: i32 }\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.rs"),
            "use tagwire::JsonCodec;\n#[derive(JsonCodec)]\npub struct Later { b: i32 }\n",
        )
        .unwrap();

        let mut generator = CodeGenerator::new();
        generator.add_source_dir(dir.path()).unwrap();
        let identities: Vec<_> = generator
            .declarations()
            .iter()
            .map(|d| d.identity.as_str())
            .collect();
        assert_eq!(identities, ["crate::a::Bad", "crate::b::Later"]);
    }

    #[test]
    fn test_plain_container() {
        let decls = scan(
            r#"
            use tagwire::JsonCodec;
            #[derive(JsonCodec)]
            #[tagwire(plain)]
            struct Plain { a: i32 }
        "#,
        );
        assert_eq!(decls[0].flavor, DeclarationFlavor::Plain);
    }

    #[test]
    fn test_declaration_kinds_and_generics() {
        let decls = scan(
            r#"
            use tagwire::JsonCodec;
            #[derive(JsonCodec)]
            struct Pair(i32, i32);
            #[derive(JsonCodec)]
            enum Message { Quit }
            #[derive(JsonCodec)]
            struct Wrapper<T> { value: T }
        "#,
        );
        assert_eq!(decls[0].kind, DeclarationKind::TupleStruct);
        assert!(decls[0].fields.is_empty());
        assert_eq!(decls[1].kind, DeclarationKind::Enum);
        assert_eq!(decls[2].generics, ["T"]);
    }

    #[test]
    fn test_imports_are_recorded() {
        let decls = scan(
            r#"
            use std::collections::{BTreeMap as Map, HashMap};
            use tagwire::JsonCodec;
            use super::shared::{self};
            #[derive(JsonCodec)]
            struct Catalog { entries: Map<String, u32>, index: HashMap<String, u32> }
        "#,
        );
        let imports = &decls[0].imports;
        assert_eq!(imports["Map"], "std::collections::BTreeMap");
        assert_eq!(imports["HashMap"], "std::collections::HashMap");
        assert_eq!(imports["shared"], "super::shared");
    }

    #[test]
    fn test_inline_modules() {
        let decls = scan(
            r#"
            mod inner {
                use tagwire::JsonCodec;
                #[derive(JsonCodec)]
                pub struct Nested { a: i32 }
            }
            #[cfg(test)]
            mod tests {
                use tagwire::JsonCodec;
                #[derive(JsonCodec)]
                struct OnlyInTests { a: i32 }
            }
        "#,
        );
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].identity, "crate::inner::Nested");
    }

    #[test]
    fn test_parse_failure() {
        let mut generator = CodeGenerator::new();
        let err = generator.add_source_str("struct {").unwrap_err();
        assert!(matches!(err, GenerateError::Parse { ref path, .. } if path == "<string>"));
    }

    #[test_case("lib.rs", "crate")]
    #[test_case("main.rs", "crate")]
    #[test_case("model.rs", "crate::model")]
    #[test_case("model/mod.rs", "crate::model")]
    #[test_case("model/item.rs", "crate::model::item")]
    fn test_module_for(relative: &str, expected: &str) {
        assert_eq!(module_for(&PathBuf::from(relative), "crate"), expected);
    }

    #[test]
    fn test_add_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("model")).unwrap();
        fs::write(dir.path().join("lib.rs"), "pub mod model;").unwrap();
        fs::write(
            dir.path().join("model").join("mod.rs"),
            "use tagwire::JsonCodec;\n#[derive(JsonCodec)]\npub struct Item { a: i32 }\n",
        )
        .unwrap();

        let mut generator = CodeGenerator::new();
        generator.add_source_dir(dir.path()).unwrap();
        assert_eq!(generator.declarations()[0].identity, "crate::model::Item");
    }
}
