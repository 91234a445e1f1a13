//! Normalized schemas the emitters work from.

use std::fmt;

use crate::naming::last_segment;

/// Construction strategy of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Every non-nullable field is required.
    Plain,
    /// At least one field falls back to a declared default when absent.
    Defaulted,
}

/// A resolved field type: a canonical raw path plus type arguments, or a type
/// parameter of the declaration that was never bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Concrete {
        raw: String,
        args: Vec<TypeDescriptor>,
    },
    Variable(String),
}

const SCALARS: &[&str] = &[
    "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64", "bool", "char",
];

impl TypeDescriptor {
    pub fn concrete(raw: impl Into<String>, args: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Concrete {
            raw: raw.into(),
            args,
        }
    }

    pub fn named(raw: impl Into<String>) -> Self {
        Self::concrete(raw, Vec::new())
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Concrete { raw, .. } => Some(raw),
            TypeDescriptor::Variable(_) => None,
        }
    }

    /// True for the value types whose absence must not be written as null.
    pub fn is_scalar(&self) -> bool {
        match self {
            TypeDescriptor::Concrete { raw, args } => {
                args.is_empty() && SCALARS.contains(&raw.as_str())
            }
            TypeDescriptor::Variable(_) => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Variable(name) => f.write_str(name),
            TypeDescriptor::Concrete { raw, args } => {
                f.write_str(raw)?;
                if let Some((first, rest)) = args.split_first() {
                    write!(f, "<{first}")?;
                    for arg in rest {
                        write!(f, ", {arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    /// Field identifier as declared, possibly raw (`r#type`)
    pub ident: String,
    pub wire_name: String,
    /// Type of the value; for nullable fields this is the type inside the `Option`
    pub ty: TypeDescriptor,
    /// Declared as a top-level `Option<T>`
    pub nullable: bool,
    /// Non-nullable scalar: a JSON null leaves the zero value in place
    pub is_primitive: bool,
    pub default: Option<syn::Expr>,
    /// 0-based position in declaration order; selects the bitmask word and bit
    pub ordinal: usize,
}

impl FieldSchema {
    pub fn has_default_value(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ClassSchema {
    /// Fully-qualified path of the type, such as `crate::model::Item`
    pub identity: String,
    pub fields: Vec<FieldSchema>,
    pub flavor: Flavor,
}

impl ClassSchema {
    pub fn simple_name(&self) -> &str {
        last_segment(&self.identity)
    }

    pub fn module(&self) -> &str {
        self.identity
            .rsplit_once("::")
            .map_or("crate", |(module, _)| module)
    }

    /// Number of 32-bit presence words a defaulting constructor takes.
    pub fn mask_words(&self) -> usize {
        self.fields.len().div_ceil(32)
    }
}
