//! Error types for reading, writing and looking up codecs

use thiserror::Error;

use crate::token::JsonToken;
use crate::type_token::TypeToken;

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Error type for codec operations
#[derive(Error, Debug)]
pub enum CodecError {
    /// Input is not well-formed JSON
    #[error("malformed JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// Input is well-formed but the next token is not the one the caller asked for
    #[error("Expected {expected} but was {found} at path {path}")]
    UnexpectedToken {
        expected: JsonToken,
        found: JsonToken,
        path: String,
    },

    /// A string read as a number does not hold one
    #[error("expected a number but was {value:?} at path {path}")]
    InvalidNumber { value: String, path: String },

    /// A numeric literal does not fit the requested type
    #[error("number `{literal}` does not fit in {target} at path {path}")]
    NumberOutOfRange {
        literal: String,
        target: &'static str,
        path: String,
    },

    /// A string that should hold exactly one character does not
    #[error("expected a single character but was {value:?} at path {path}")]
    InvalidCharacter { value: String, path: String },

    /// A container element decoded to null where the element type cannot hold it
    #[error("unexpected null for {type_name} at path {path}")]
    UnexpectedNull { type_name: String, path: String },

    /// A map key occurred twice in the same object
    #[error("duplicate key `{key}` at path {path}")]
    DuplicateKey { key: String, path: String },

    /// A map key does not parse as the map's key type
    #[error("`{key}` is not a valid {target} map key at path {path}")]
    InvalidMapKey {
        key: String,
        target: &'static str,
        path: String,
    },

    /// A required field was absent from the input
    #[error("missing required field `{field}` of {type_name}")]
    MissingRequiredField {
        type_name: &'static str,
        field: &'static str,
    },

    /// NaN and infinities have no wire representation
    #[error("numeric values must be finite, but was {0}")]
    NonFiniteNumber(f64),

    /// The output buffer rejected a write
    #[error("failed to write JSON: {0}")]
    Write(#[from] std::io::Error),

    /// Reader or writer used out of order
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Nothing in the registry can produce a codec for the type
    #[error("no codec available for {0}")]
    NoCodec(TypeToken),

    /// A factory produced a codec for a different Rust type than the one requested
    #[error("codec registered for {token} does not handle {expected}")]
    CodecTypeMismatch {
        token: TypeToken,
        expected: &'static str,
    },

    /// A parameterized type token lacks an argument its codec needs
    #[error("type {token} is missing type argument {index}")]
    MissingTypeArgument { token: TypeToken, index: usize },
}
