//! Error types for codec generation.

use thiserror::Error;

/// Errors that can occur during code generation.
///
/// Every schema-level variant names the schema (and the field, where there is one) so
/// that a build log points straight at the offending declaration.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The declaration has no named field list (tuple/unit struct, enum, union)
    #[error("`{schema}` cannot have a codec generated: {reason}")]
    UnsupportedDeclarationKind { schema: String, reason: String },

    /// Two fields normalize to the same wire name
    #[error("`{schema}`: fields `{first}` and `{second}` share the wire name \"{wire_name}\"")]
    DuplicateWireName {
        schema: String,
        wire_name: String,
        first: String,
        second: String,
    },

    /// A field type mentions a type parameter of the declaration
    #[error("`{schema}.{field}`: type variable `{variable}` is not bound to a concrete type")]
    UnresolvedTypeVariable {
        schema: String,
        field: String,
        variable: String,
    },

    /// The field's type has no wire representation
    #[error("`{schema}.{field}`: unsupported field type `{ty}`: {reason}")]
    UnsupportedFieldType {
        schema: String,
        field: String,
        ty: String,
        reason: String,
    },

    /// A `#[tagwire(..)]` option is unknown or malformed
    #[error("`{schema}{}`: invalid tagwire attribute: {reason}", field_suffix(.field))]
    InvalidAttribute {
        schema: String,
        field: Option<String>,
        reason: String,
    },

    /// A default value expression does not parse
    #[error("`{schema}.{field}`: default value `{expr}` is not a valid expression: {reason}")]
    InvalidDefaultValue {
        schema: String,
        field: String,
        expr: String,
        reason: String,
    },

    /// No defaulting constructor can be produced for the declaration
    #[error("`{schema}.{field}`: no defaulting constructor: {reason}")]
    DefaultingConstructor {
        schema: String,
        field: String,
        reason: String,
    },

    /// Two schemas would produce codec units with the same name
    #[error("`{schema}` and `{existing}` both generate codec `{codec}`")]
    CodecNameCollision {
        schema: String,
        existing: String,
        codec: String,
    },

    /// Generated tokens do not form a valid Rust file
    #[error("generated code for `{unit}` is invalid: {source}")]
    InvalidGeneratedCode {
        unit: String,
        #[source]
        source: syn::Error,
    },

    /// A source file could not be parsed
    #[error("failed to parse source '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: syn::Error,
    },

    /// Failed to read an input file
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an output file
    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl GenerateError {
    /// The schema the error belongs to, for errors local to one schema.
    pub fn schema(&self) -> Option<&str> {
        match self {
            GenerateError::UnsupportedDeclarationKind { schema, .. }
            | GenerateError::DuplicateWireName { schema, .. }
            | GenerateError::UnresolvedTypeVariable { schema, .. }
            | GenerateError::UnsupportedFieldType { schema, .. }
            | GenerateError::InvalidAttribute { schema, .. }
            | GenerateError::InvalidDefaultValue { schema, .. }
            | GenerateError::DefaultingConstructor { schema, .. }
            | GenerateError::CodecNameCollision { schema, .. } => Some(schema),
            GenerateError::InvalidGeneratedCode { .. }
            | GenerateError::Parse { .. }
            | GenerateError::Read { .. }
            | GenerateError::Write { .. } => None,
        }
    }
}

fn field_suffix(field: &Option<String>) -> String {
    field.as_ref().map(|f| format!(".{f}")).unwrap_or_default()
}
