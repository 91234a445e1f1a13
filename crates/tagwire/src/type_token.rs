//! Runtime representation of (possibly generic) types used to look up codecs.

use std::borrow::Cow;
use std::fmt;

use crate::error::{CodecError, CodecResult};

/// Identifies a type by its canonical path and type arguments.
///
/// `std::collections::HashMap<std::string::String, i32>` is the token with raw
/// `std::collections::HashMap` and arguments `[std::string::String, i32]`. Tokens
/// compare structurally, so two independently built tokens for the same type find the
/// same cached codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeToken {
    owner: Option<Box<TypeToken>>,
    raw: Cow<'static, str>,
    args: Vec<TypeToken>,
}

impl TypeToken {
    /// A token for a non-generic type.
    pub fn of(raw: impl Into<Cow<'static, str>>) -> Self {
        Self {
            owner: None,
            raw: raw.into(),
            args: Vec::new(),
        }
    }

    /// Composes a parameterized token from an optional owner, a raw token and its arguments.
    ///
    /// Any arguments already on `raw` are replaced by `args`.
    pub fn parameterized_with_owner(
        owner: Option<TypeToken>,
        raw: TypeToken,
        args: Vec<TypeToken>,
    ) -> Self {
        Self {
            owner: owner.map(Box::new),
            raw: raw.raw,
            args,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn args(&self) -> &[TypeToken] {
        &self.args
    }

    pub fn owner(&self) -> Option<&TypeToken> {
        self.owner.as_deref()
    }

    pub fn is_parameterized(&self) -> bool {
        !self.args.is_empty()
    }

    /// The type argument at `index`, for codecs of generic containers.
    pub fn arg(&self, index: usize) -> CodecResult<&TypeToken> {
        self.args
            .get(index)
            .ok_or_else(|| CodecError::MissingTypeArgument {
                token: self.clone(),
                index,
            })
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)?;
        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "<{first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of_string_to_vec_i32() -> TypeToken {
        TypeToken::parameterized_with_owner(
            None,
            TypeToken::of("std::collections::HashMap"),
            vec![
                TypeToken::of("std::string::String"),
                TypeToken::parameterized_with_owner(
                    None,
                    TypeToken::of("std::vec::Vec"),
                    vec![TypeToken::of("i32")],
                ),
            ],
        )
    }

    #[test]
    fn test_display_nested() {
        assert_eq!(
            map_of_string_to_vec_i32().to_string(),
            "std::collections::HashMap<std::string::String, std::vec::Vec<i32>>"
        );
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(map_of_string_to_vec_i32(), map_of_string_to_vec_i32());
        assert_ne!(TypeToken::of("i32"), TypeToken::of("i64"));
    }

    #[test]
    fn test_missing_argument() {
        let token = TypeToken::of("std::vec::Vec");
        assert!(matches!(
            token.arg(0),
            Err(CodecError::MissingTypeArgument { index: 0, .. })
        ));
    }
}
