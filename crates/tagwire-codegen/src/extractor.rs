//! Schema extraction: turns a host-supplied [`Declaration`] into a [`ClassSchema`].
//!
//! Field types are resolved into [`TypeDescriptor`] trees. An unqualified name is looked
//! up in the declaration's imports, then in the [`TypeRegistry`]; anything else is a type
//! declared next to the struct and is qualified with the declaration's module.
//!
//! Default value expressions get the same treatment: the generated constructor runs in
//! the module that includes the codecs, so `DEFAULT_LIMIT` written next to the struct
//! becomes `crate::model::DEFAULT_LIMIT`. Lowercase multi-segment paths such as
//! `uuid::Uuid::nil()` are taken to start at a crate and are left alone; write
//! `self::defaults::LIMIT` for a child module.

use std::collections::HashMap;

use syn::visit_mut::{self, VisitMut};
use syn::{GenericArgument, PathArguments, Type, TypePath};
use tracing::debug;

use crate::declaration::{Declaration, DeclarationFlavor, DeclarationKind, DefaultValue};
use crate::error::GenerateError;
use crate::registry::TypeRegistry;
use crate::schema::{ClassSchema, FieldSchema, Flavor, TypeDescriptor};

const OPTION: &str = "std::option::Option";

/// Names every module sees without an import.
const PRELUDE: &[&str] = &[
    "Some", "None", "Ok", "Err", "Option", "Result", "String", "Vec", "Box", "Default", "From",
    "Into", "ToString", "ToOwned", "Iterator", "IntoIterator", "Clone", "i128", "u128",
    "isize", "usize", "str", "Self", "crate",
];

/// Extract the schema of a single declaration.
pub fn extract(decl: &Declaration, registry: &TypeRegistry) -> Result<ClassSchema, GenerateError> {
    let schema = decl.identity.clone();

    if let Some(invalid) = decl.invalid_attributes.first() {
        return Err(GenerateError::InvalidAttribute {
            schema,
            field: invalid.field.clone(),
            reason: invalid.reason.clone(),
        });
    }

    let reason = match decl.kind {
        DeclarationKind::NamedStruct => None,
        DeclarationKind::TupleStruct => Some("tuple structs have no field names to tag"),
        DeclarationKind::UnitStruct => Some("unit structs have no field list"),
        DeclarationKind::Enum => Some("enums have no single field list"),
        DeclarationKind::Union => Some("unions have no accessible field list"),
    };
    if let Some(reason) = reason {
        return Err(GenerateError::UnsupportedDeclarationKind {
            schema,
            reason: reason.to_string(),
        });
    }

    let resolver = Resolver { decl, registry };
    let mut wire_names: HashMap<String, &str> = HashMap::new();
    let mut fields = Vec::with_capacity(decl.fields.len());

    for (ordinal, field) in decl.fields.iter().enumerate() {
        let wire_name = field
            .rename
            .clone()
            .unwrap_or_else(|| unraw(&field.ident).to_string());
        if let Some(first) = wire_names.get(&wire_name) {
            return Err(GenerateError::DuplicateWireName {
                schema,
                wire_name,
                first: first.to_string(),
                second: field.ident.clone(),
            });
        }
        wire_names.insert(wire_name.clone(), &field.ident);

        let resolved = resolver.resolve(&field.ty).map_err(|reason| {
            GenerateError::UnsupportedFieldType {
                schema: schema.clone(),
                field: field.ident.clone(),
                ty: type_to_string(&field.ty),
                reason,
            }
        })?;
        if let Some(variable) = first_variable(&resolved) {
            return Err(GenerateError::UnresolvedTypeVariable {
                schema,
                field: field.ident.clone(),
                variable: variable.to_string(),
            });
        }

        let (ty, nullable) = match resolved {
            TypeDescriptor::Concrete { raw, mut args } if raw == OPTION && args.len() == 1 => {
                (args.remove(0), true)
            }
            other => (other, false),
        };

        let default = match &field.default {
            None => None,
            Some(_) if decl.flavor == DeclarationFlavor::Plain => {
                return Err(GenerateError::DefaultingConstructor {
                    schema,
                    field: field.ident.clone(),
                    reason: "plain declarations cannot carry default values".to_string(),
                });
            }
            Some(DefaultValue::Trait) => Some(syn::parse_quote!(::std::default::Default::default())),
            Some(DefaultValue::Expr(expr)) => {
                let invalid = |reason: String| GenerateError::InvalidDefaultValue {
                    schema: schema.clone(),
                    field: field.ident.clone(),
                    expr: expr.clone(),
                    reason,
                };
                let mut parsed =
                    syn::parse_str::<syn::Expr>(expr).map_err(|e| invalid(e.to_string()))?;
                resolver.qualify_expr(&mut parsed).map_err(invalid)?;
                Some(parsed)
            }
        };

        fields.push(FieldSchema {
            ident: field.ident.clone(),
            wire_name,
            is_primitive: !nullable && ty.is_scalar(),
            ty,
            nullable,
            default,
            ordinal,
        });
    }

    // Every type parameter that a field mentions has already failed above.
    if !decl.generics.is_empty() {
        return Err(GenerateError::UnsupportedDeclarationKind {
            schema,
            reason: format!(
                "generic parameters <{}> are not bound by any field",
                decl.generics.join(", ")
            ),
        });
    }

    let flavor = if fields.iter().any(FieldSchema::has_default_value) {
        Flavor::Defaulted
    } else {
        Flavor::Plain
    };

    debug!(
        schema = %decl.identity,
        fields = fields.len(),
        ?flavor,
        "extracted schema"
    );

    Ok(ClassSchema {
        identity: decl.identity.clone(),
        fields,
        flavor,
    })
}

/// Strip the `r#` prefix of a raw identifier.
pub(crate) fn unraw(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}

fn first_variable(ty: &TypeDescriptor) -> Option<&str> {
    match ty {
        TypeDescriptor::Variable(name) => Some(name.as_str()),
        TypeDescriptor::Concrete { args, .. } => args.iter().find_map(first_variable),
    }
}

fn type_to_string(ty: &Type) -> String {
    quote::quote!(#ty).to_string()
}

struct Resolver<'a> {
    decl: &'a Declaration,
    registry: &'a TypeRegistry,
}

impl Resolver<'_> {
    fn resolve(&self, ty: &Type) -> Result<TypeDescriptor, String> {
        match ty {
            Type::Paren(paren) => self.resolve(&paren.elem),
            Type::Group(group) => self.resolve(&group.elem),
            Type::Path(TypePath { qself: None, path }) => {
                let Some(last) = path.segments.last() else {
                    return Err("empty path".to_string());
                };
                let single = path.segments.len() == 1;
                if path
                    .segments
                    .iter()
                    .take(path.segments.len() - 1)
                    .any(|s| !matches!(s.arguments, PathArguments::None))
                {
                    return Err("type arguments are only supported on the last segment".into());
                }

                let name = last.ident.to_string();
                if path.leading_colon.is_none()
                    && single
                    && matches!(last.arguments, PathArguments::None)
                    && self.decl.generics.contains(&name)
                {
                    return Ok(TypeDescriptor::Variable(name));
                }

                let args = match &last.arguments {
                    PathArguments::None => Vec::new(),
                    PathArguments::AngleBracketed(angle) => angle
                        .args
                        .iter()
                        .map(|arg| match arg {
                            GenericArgument::Type(ty) => self.resolve(ty),
                            _ => Err("only type arguments are supported".to_string()),
                        })
                        .collect::<Result<_, _>>()?,
                    PathArguments::Parenthesized(_) => {
                        return Err("function traits have no wire representation".into());
                    }
                };

                let segments: Vec<String> =
                    path.segments.iter().map(|s| s.ident.to_string()).collect();
                let qualified = if path.leading_colon.is_some() {
                    segments.join("::")
                } else {
                    self.qualify(&segments)?
                };

                match self.registry.get(&qualified) {
                    Some(known) if known.arity() != args.len() => Err(format!(
                        "`{}` takes {} type argument(s), found {}",
                        qualified,
                        known.arity(),
                        args.len()
                    )),
                    Some(known) => Ok(TypeDescriptor::concrete(known.canonical(), args)),
                    None => Ok(TypeDescriptor::concrete(qualified, args)),
                }
            }
            Type::Path(_) => Err("qualified self types are not supported".into()),
            Type::Tuple(tuple) if tuple.elems.is_empty() => {
                Err("the unit type has no wire representation".into())
            }
            Type::Tuple(_) => Err("tuples have no wire representation".into()),
            Type::Array(_) | Type::Slice(_) => Err("use `Vec<T>` instead of arrays".into()),
            Type::Reference(_) | Type::Ptr(_) => Err("borrowed types cannot be decoded".into()),
            Type::TraitObject(_) | Type::ImplTrait(_) => {
                Err("trait objects have no wire representation".into())
            }
            _ => Err("unsupported type syntax".into()),
        }
    }

    /// Turn a path as written into a fully-qualified one.
    fn qualify(&self, segments: &[String]) -> Result<String, String> {
        let Some((first, rest)) = segments.split_first() else {
            return Err("empty path".to_string());
        };

        if let Some(imported) = self.decl.imports.get(first) {
            let mut expanded: Vec<String> = imported.split("::").map(str::to_string).collect();
            expanded.extend(rest.iter().cloned());
            return self.normalize(&expanded);
        }

        if rest.is_empty() {
            return Ok(if self.registry.contains(first) {
                first.clone()
            } else {
                format!("{}::{}", self.decl.module(), first)
            });
        }

        self.normalize(segments)
    }

    /// Qualify the item paths of a default value expression.
    fn qualify_expr(&self, expr: &mut syn::Expr) -> Result<(), String> {
        let mut qualifier = ExprQualifier {
            resolver: self,
            error: None,
        };
        qualifier.visit_expr_mut(expr);
        qualifier.error.map_or(Ok(()), Err)
    }

    fn qualify_value_path(&self, path: &mut syn::Path) -> Result<(), String> {
        if path.leading_colon.is_some() {
            return Ok(());
        }
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        let Some(first) = segments.first() else {
            return Ok(());
        };

        let (prefix, replaced) = if let Some(imported) = self.decl.imports.get(first) {
            let expanded: Vec<String> = imported.split("::").map(str::to_string).collect();
            (self.normalize(&expanded)?, 1)
        } else if first == "self" || first == "super" {
            let count = 1 + segments[1..].iter().take_while(|s| *s == "super").count();
            (self.normalize(&segments[..count])?, count)
        } else if PRELUDE.contains(&first.as_str()) || self.registry.contains(first) {
            return Ok(());
        } else if segments.len() == 1 || first.starts_with(char::is_uppercase) {
            (format!("{}::{}", self.decl.module(), first), 1)
        } else {
            return Ok(());
        };

        let mut qualified: syn::Path = syn::parse_str(&prefix).map_err(|e| e.to_string())?;
        if let (Some(last), Some(written)) = (
            qualified.segments.last_mut(),
            path.segments.iter().nth(replaced - 1),
        ) {
            last.arguments = written.arguments.clone();
        }
        qualified
            .segments
            .extend(path.segments.iter().skip(replaced).cloned());
        *path = qualified;
        Ok(())
    }

    /// Resolve `self` and `super` against the declaration's module.
    fn normalize(&self, segments: &[String]) -> Result<String, String> {
        let mut module: Vec<&str> = self.decl.module().split("::").collect();
        let mut rest = segments;

        match rest.first().map(String::as_str) {
            Some("self") => rest = &rest[1..],
            Some("super") => {
                while rest.first().is_some_and(|s| s == "super") {
                    if module.len() <= 1 {
                        return Err("`super` goes beyond the crate root".into());
                    }
                    module.pop();
                    rest = &rest[1..];
                }
            }
            // `crate::..`, `std::..` and other crates are already absolute
            _ => return Ok(segments.join("::")),
        }

        let mut joined = module.join("::");
        for segment in rest {
            joined.push_str("::");
            joined.push_str(segment);
        }
        Ok(joined)
    }
}

struct ExprQualifier<'r, 'a> {
    resolver: &'r Resolver<'a>,
    error: Option<String>,
}

impl ExprQualifier<'_, '_> {
    fn qualify(&mut self, path: &mut syn::Path) {
        if let Err(reason) = self.resolver.qualify_value_path(path) {
            self.error.get_or_insert(reason);
        }
    }
}

impl VisitMut for ExprQualifier<'_, '_> {
    fn visit_expr_path_mut(&mut self, node: &mut syn::ExprPath) {
        if node.qself.is_none() {
            self.qualify(&mut node.path);
        }
        visit_mut::visit_expr_path_mut(self, node);
    }

    fn visit_expr_struct_mut(&mut self, node: &mut syn::ExprStruct) {
        if node.qself.is_none() {
            self.qualify(&mut node.path);
        }
        visit_mut::visit_expr_struct_mut(self, node);
    }
}
