//! Type registry mapping Rust type paths to the canonical identities the runtime knows.
//!
//! The registry is the data-driven way to teach the generator about types. Every
//! spelling of a type (`Vec`, `std::vec::Vec`, `alloc::vec::Vec`) maps to one
//! canonical raw name, which is the name the runtime's type tokens carry. Paths that
//! are not registered are treated as user types and kept as written.

use std::collections::HashMap;

/// What the generator knows about a registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownType {
    canonical: String,
    arity: usize,
}

impl KnownType {
    pub fn new(canonical: impl Into<String>, arity: usize) -> Self {
        Self {
            canonical: canonical.into(),
            arity,
        }
    }

    /// The raw name emitted into type tokens.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Number of type arguments the type takes.
    pub fn arity(&self) -> usize {
        self.arity
    }
}

/// A registry of Rust type path -> [`KnownType`] associations.
///
/// # Built-in mappings
///
/// | Rust type | Canonical name | Arity |
/// |-----------|----------------|-------|
/// | `i8` .. `u64`, `f32`, `f64`, `bool`, `char` | same | 0 |
/// | `String` | `std::string::String` | 0 |
/// | `Vec<T>` | `std::vec::Vec` | 1 |
/// | `Option<T>` | `std::option::Option` | 1 |
/// | `Box<T>` | `std::boxed::Box` | 1 |
/// | `std::collections::HashMap<K, V>` | `std::collections::HashMap` | 2 |
/// | `std::collections::BTreeMap<K, V>` | `std::collections::BTreeMap` | 2 |
///
/// `String`, `Vec`, `Option` and `Box` resolve by bare name (they are in the prelude);
/// the maps need a `use` or a qualified path.
///
/// # Custom mappings
///
/// ```
/// use tagwire_codegen::{CodeGenerator, KnownType};
///
/// let mut generator = CodeGenerator::new();
/// // the runtime must have a `WireType` impl for `uuid::Uuid`
/// generator.register_type("uuid::Uuid", KnownType::new("uuid::Uuid", 0));
/// ```
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    mappings: HashMap<String, KnownType>,
}

impl TypeRegistry {
    /// Create an empty registry with no mappings.
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
        }
    }

    /// Create a registry pre-populated with the scalar and std container mappings.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    pub fn register_builtins(&mut self) {
        for scalar in [
            "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64", "bool", "char",
        ] {
            self.register(scalar, KnownType::new(scalar, 0));
        }

        self.register_aliases(
            &["String", "std::string::String", "alloc::string::String"],
            KnownType::new("std::string::String", 0),
        );
        self.register_aliases(
            &["Vec", "std::vec::Vec", "alloc::vec::Vec"],
            KnownType::new("std::vec::Vec", 1),
        );
        self.register_aliases(
            &["Option", "std::option::Option", "core::option::Option"],
            KnownType::new("std::option::Option", 1),
        );
        self.register_aliases(
            &["Box", "std::boxed::Box", "alloc::boxed::Box"],
            KnownType::new("std::boxed::Box", 1),
        );
        self.register_aliases(
            &[
                "std::collections::HashMap",
                "std::collections::hash_map::HashMap",
            ],
            KnownType::new("std::collections::HashMap", 2),
        );
        self.register_aliases(
            &[
                "std::collections::BTreeMap",
                "std::collections::btree_map::BTreeMap",
                "alloc::collections::BTreeMap",
            ],
            KnownType::new("std::collections::BTreeMap", 2),
        );
    }

    fn register_aliases(&mut self, names: &[&str], known: KnownType) {
        for name in names {
            self.register(*name, known.clone());
        }
    }

    /// Register a type for a Rust type path.
    ///
    /// If a mapping already exists for this path, it is replaced.
    pub fn register(&mut self, name: impl Into<String>, known: KnownType) {
        self.mappings.insert(name.into(), known);
    }

    pub fn get(&self, name: &str) -> Option<&KnownType> {
        self.mappings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mappings.contains_key(name)
    }

    pub fn unregister(&mut self, name: &str) -> Option<KnownType> {
        self.mappings.remove(name)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_with_builtins() {
        let registry = TypeRegistry::with_builtins();
        assert!(registry.contains("i32"));
        assert!(registry.contains("String"));
        assert!(registry.contains("std::collections::HashMap"));
        assert!(!registry.contains("HashMap"));
        assert!(!registry.contains("NonExistent"));
    }

    #[test]
    fn test_aliases_share_canonical_name() {
        let registry = TypeRegistry::with_builtins();
        let bare = registry.get("Vec").unwrap();
        let qualified = registry.get("alloc::vec::Vec").unwrap();
        assert_eq!(bare, qualified);
        assert_eq!(bare.canonical(), "std::vec::Vec");
        assert_eq!(bare.arity(), 1);
    }

    #[test]
    fn test_registry_custom_type() {
        let mut registry = TypeRegistry::new();
        registry.register("my_crate::Id", KnownType::new("my_crate::Id", 0));
        assert_eq!(registry.get("my_crate::Id").unwrap().canonical(), "my_crate::Id");
    }

    #[test]
    fn test_registry_override_builtin() {
        let mut registry = TypeRegistry::with_builtins();
        registry.register("String", KnownType::new("smol_str::SmolStr", 0));
        assert_eq!(registry.get("String").unwrap().canonical(), "smol_str::SmolStr");
    }

    #[test]
    fn test_registry_unregister() {
        let mut registry = TypeRegistry::with_builtins();
        assert!(registry.unregister("Box").is_some());
        assert!(!registry.contains("Box"));
    }
}
