//! Names and resolved types shared by the decoder, encoder and construction emitters.

use proc_macro2::{Literal, TokenStream};
use quote::format_ident;
use syn::Ident;

use crate::error::GenerateError;
use crate::extractor::unraw;
use crate::schema::{ClassSchema, FieldSchema, TypeDescriptor};
use crate::type_expr::{self, TypeExprError};

/// Everything the emitters need to know about one schema.
pub struct CodecPlan<'a> {
    pub schema: &'a ClassSchema,
    /// Path of the runtime crate, such as `::tagwire`
    pub runtime: &'a syn::Path,
    /// The target type as Rust syntax
    pub target: TokenStream,
    pub codec_ident: Ident,
    pub fields: Vec<FieldPlan<'a>>,
}

pub struct FieldPlan<'a> {
    pub field: &'a FieldSchema,
    /// Struct member, raw if the field identifier is a keyword
    pub member: Ident,
    /// Decoder local holding the decoded value
    pub slot: Ident,
    /// Codec struct field holding the sub-codec
    pub codec: Ident,
    /// Value type handled by the sub-codec (`T` for a nullable `Option<T>` field)
    pub value_ty: TokenStream,
    /// Runtime type token of `value_ty`
    pub token: TokenStream,
}

impl<'a> CodecPlan<'a> {
    pub fn new(
        schema: &'a ClassSchema,
        runtime: &'a syn::Path,
        codec_suffix: &str,
    ) -> Result<Self, GenerateError> {
        let target = type_expr::type_name(&TypeDescriptor::named(schema.identity.as_str()))
            .map_err(|e| GenerateError::UnsupportedDeclarationKind {
                schema: schema.identity.clone(),
                reason: e.to_string(),
            })?;

        let fields = schema
            .fields
            .iter()
            .map(|field| FieldPlan::new(schema, field, runtime))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            schema,
            runtime,
            target,
            codec_ident: format_ident!("{}{}", schema.simple_name(), codec_suffix),
            fields,
        })
    }

    /// Identity of the target type as written into type tokens and error messages.
    pub fn identity(&self) -> &str {
        &self.schema.identity
    }

    pub fn mask_idents(&self) -> Vec<Ident> {
        (0..self.schema.mask_words()).map(mask_ident).collect()
    }
}

impl<'a> FieldPlan<'a> {
    fn new(
        schema: &ClassSchema,
        field: &'a FieldSchema,
        runtime: &syn::Path,
    ) -> Result<Self, GenerateError> {
        let expr = type_expr::build(&field.ty, runtime).map_err(|e| match e {
            TypeExprError::UnboundVariable(variable) => GenerateError::UnresolvedTypeVariable {
                schema: schema.identity.clone(),
                field: field.ident.clone(),
                variable,
            },
            TypeExprError::InvalidPath(_) => GenerateError::UnsupportedFieldType {
                schema: schema.identity.clone(),
                field: field.ident.clone(),
                ty: field.ty.to_string(),
                reason: e.to_string(),
            },
        })?;

        let name = unraw(&field.ident);
        let member = if field.ident.starts_with("r#") {
            Ident::new_raw(name, proc_macro2::Span::call_site())
        } else {
            format_ident!("{}", name)
        };

        Ok(Self {
            field,
            member,
            slot: format_ident!("{}_slot", name),
            codec: format_ident!("{}_codec", name),
            value_ty: expr.name,
            token: expr.token,
        })
    }

    /// Name of the mask word holding this field's presence bit.
    pub fn mask(&self) -> Ident {
        mask_ident(self.field.ordinal / 32)
    }

    /// This field's bit within its mask word, as a `u32` literal.
    pub fn bit(&self) -> Literal {
        Literal::u32_suffixed(1 << (self.field.ordinal % 32))
    }

    pub fn wire_name(&self) -> &str {
        &self.field.wire_name
    }
}

pub fn mask_ident(word: usize) -> Ident {
    format_ident!("mask{}", word)
}
