//! Host-supplied descriptions of annotated structs.
//!
//! The generator never discovers declarations itself; it consumes [`Declaration`]
//! values. The source scanner in this crate is one supplier, a build tool with its own
//! symbol table is another.

use std::collections::HashMap;

use crate::naming::last_segment;

/// Shape of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    NamedStruct,
    TupleStruct,
    UnitStruct,
    Enum,
    Union,
}

/// Whether the declaration can express per-field defaults.
///
/// `Plain` declarations have no defaulting constructor, so every field is required
/// unless it is nullable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclarationFlavor {
    #[default]
    Managed,
    Plain,
}

/// A declared default for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// `Default::default()` of the field type
    Trait,
    /// A Rust expression, as source text
    Expr(String),
}

#[derive(Debug, Clone)]
pub struct DeclaredField {
    /// Field identifier as written, possibly a raw identifier such as `r#type`
    pub ident: String,
    pub ty: syn::Type,
    /// Explicit wire name
    pub rename: Option<String>,
    pub default: Option<DefaultValue>,
}

impl DeclaredField {
    pub fn new(ident: impl Into<String>, ty: syn::Type) -> Self {
        Self {
            ident: ident.into(),
            ty,
            rename: None,
            default: None,
        }
    }

    pub fn rename(mut self, wire_name: impl Into<String>) -> Self {
        self.rename = Some(wire_name.into());
        self
    }

    pub fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// A `#[tagwire(..)]` attribute that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAttribute {
    /// The field carrying the attribute, `None` for a container attribute
    pub field: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Declaration {
    /// Fully-qualified path of the type, such as `crate::model::Item`
    pub identity: String,
    pub kind: DeclarationKind,
    pub flavor: DeclarationFlavor,
    /// Names of the declaration's type parameters
    pub generics: Vec<String>,
    /// Fields in declaration order
    pub fields: Vec<DeclaredField>,
    /// Local name -> fully-qualified path for the `use` items in scope
    pub imports: HashMap<String, String>,
    /// Attributes the supplier rejected; generation fails for this declaration alone
    pub invalid_attributes: Vec<InvalidAttribute>,
}

impl Declaration {
    /// A named struct with no fields, no generics and no imports.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            kind: DeclarationKind::NamedStruct,
            flavor: DeclarationFlavor::default(),
            generics: Vec::new(),
            fields: Vec::new(),
            imports: HashMap::new(),
            invalid_attributes: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: DeclarationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn flavor(mut self, flavor: DeclarationFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn generic(mut self, name: impl Into<String>) -> Self {
        self.generics.push(name.into());
        self
    }

    pub fn field(mut self, field: DeclaredField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn import(mut self, local: impl Into<String>, path: impl Into<String>) -> Self {
        self.imports.insert(local.into(), path.into());
        self
    }

    /// The module the type is declared in: everything before the last `::`.
    pub fn module(&self) -> &str {
        self.identity
            .rsplit_once("::")
            .map_or("crate", |(module, _)| module)
    }

    pub fn simple_name(&self) -> &str {
        last_segment(&self.identity)
    }
}
