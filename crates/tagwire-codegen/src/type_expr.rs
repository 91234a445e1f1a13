//! Type Expression Builder.
//!
//! For a [`TypeDescriptor`] this produces the Rust type used as the generic parameter of
//! a sub-codec field, and the expression that builds the matching runtime type token:
//!
//! ```text
//! std::vec::Vec<crate::model::Tag>
//!   type:  ::std::vec::Vec<crate::model::Tag>
//!   token: TypeToken::parameterized_with_owner(
//!              None, TypeToken::of("std::vec::Vec"), vec![TypeToken::of("crate::model::Tag")])
//! ```

use proc_macro2::TokenStream;
use quote::quote;
use thiserror::Error;

use crate::schema::TypeDescriptor;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeExprError {
    #[error("type variable `{0}` has no concrete type")]
    UnboundVariable(String),

    #[error("`{0}` is not a valid type path")]
    InvalidPath(String),
}

/// Both renderings of one descriptor.
#[derive(Debug, Clone)]
pub struct TypeExpr {
    /// Rust type syntax
    pub name: TokenStream,
    /// Expression evaluating to the runtime `TypeToken`
    pub token: TokenStream,
}

pub fn build(ty: &TypeDescriptor, runtime: &syn::Path) -> Result<TypeExpr, TypeExprError> {
    Ok(TypeExpr {
        name: type_name(ty)?,
        token: token_expr(ty, runtime)?,
    })
}

/// Rust type syntax for `ty`. Paths outside the current crate get a leading `::`.
pub fn type_name(ty: &TypeDescriptor) -> Result<TokenStream, TypeExprError> {
    match ty {
        TypeDescriptor::Variable(name) => Err(TypeExprError::UnboundVariable(name.clone())),
        TypeDescriptor::Concrete { raw, args } => {
            let path = rust_path(raw)?;
            if args.is_empty() {
                return Ok(quote!(#path));
            }
            let args = args.iter().map(type_name).collect::<Result<Vec<_>, _>>()?;
            Ok(quote!(#path<#(#args),*>))
        }
    }
}

/// Expression that constructs the runtime type token of `ty`.
pub fn token_expr(ty: &TypeDescriptor, runtime: &syn::Path) -> Result<TokenStream, TypeExprError> {
    match ty {
        TypeDescriptor::Variable(name) => Err(TypeExprError::UnboundVariable(name.clone())),
        TypeDescriptor::Concrete { raw, args } if args.is_empty() => {
            Ok(quote!(#runtime::TypeToken::of(#raw)))
        }
        TypeDescriptor::Concrete { raw, args } => {
            let args = args
                .iter()
                .map(|arg| token_expr(arg, runtime))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(quote! {
                #runtime::TypeToken::parameterized_with_owner(
                    ::std::option::Option::None,
                    #runtime::TypeToken::of(#raw),
                    ::std::vec![#(#args),*],
                )
            })
        }
    }
}

fn rust_path(raw: &str) -> Result<syn::Path, TypeExprError> {
    let written = if !raw.contains("::") || raw.starts_with("crate::") {
        raw.to_string()
    } else {
        format!("::{raw}")
    };
    syn::parse_str(&written).map_err(|_| TypeExprError::InvalidPath(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;
    use test_case::test_case;

    use super::*;

    fn runtime() -> syn::Path {
        parse_quote!(::tagwire)
    }

    fn catalog() -> TypeDescriptor {
        TypeDescriptor::concrete(
            "std::vec::Vec",
            vec![TypeDescriptor::concrete(
                "std::collections::HashMap",
                vec![
                    TypeDescriptor::named("std::string::String"),
                    TypeDescriptor::named("crate::model::Product"),
                ],
            )],
        )
    }

    #[test_case(TypeDescriptor::named("i32"), "i32")]
    #[test_case(TypeDescriptor::named("std::string::String"), ":: std :: string :: String")]
    #[test_case(TypeDescriptor::named("crate::model::Item"), "crate :: model :: Item")]
    #[test_case(TypeDescriptor::named("uuid::Uuid"), ":: uuid :: Uuid")]
    fn test_type_name(ty: TypeDescriptor, expected: &str) {
        assert_eq!(type_name(&ty).unwrap().to_string(), expected);
    }

    #[test]
    fn test_nested_type_name() {
        let expected: syn::Type = parse_quote!(
            ::std::vec::Vec<::std::collections::HashMap<::std::string::String, crate::model::Product>>
        );
        let actual: syn::Type = syn::parse2(type_name(&catalog()).unwrap()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_token_without_arguments() {
        let token = token_expr(&TypeDescriptor::named("bool"), &runtime()).unwrap();
        assert_eq!(token.to_string(), quote!(::tagwire::TypeToken::of("bool")).to_string());
    }

    #[test]
    fn test_nested_token() {
        let token = token_expr(&catalog(), &runtime()).unwrap().to_string();
        assert!(token.starts_with(":: tagwire :: TypeToken :: parameterized_with_owner"));
        assert!(token.contains(&quote!(::tagwire::TypeToken::of("crate::model::Product")).to_string()));
        assert_eq!(token.matches("parameterized_with_owner").count(), 2);
    }

    #[test]
    fn test_token_is_a_valid_expression() {
        let token = token_expr(&catalog(), &runtime()).unwrap();
        syn::parse2::<syn::Expr>(token).unwrap();
    }

    #[test]
    fn test_unbound_variable() {
        let ty = TypeDescriptor::concrete("std::vec::Vec", vec![TypeDescriptor::Variable("T".into())]);
        assert_eq!(
            token_expr(&ty, &runtime()).unwrap_err(),
            TypeExprError::UnboundVariable("T".into())
        );
        assert!(build(&ty, &runtime()).is_err());
    }

    #[test]
    fn test_invalid_path() {
        let ty = TypeDescriptor::named("not a path");
        assert_eq!(
            type_name(&ty).unwrap_err(),
            TypeExprError::InvalidPath("not a path".into())
        );
    }
}
