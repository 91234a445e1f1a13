//! Construction Strategy Selector.
//!
//! A PLAIN schema is assembled with a struct literal in which every non-nullable slot is
//! required. A DEFAULTED schema goes through a generated full-arity `construct` function
//! taking every slot, one `u32` presence mask per 32 fields and a trailing
//! `DefaultMarker`. A set bit means the field was absent and takes its declared default.

use proc_macro2::TokenStream;
use quote::quote;

use crate::plan::{CodecPlan, FieldPlan};
use crate::schema::Flavor;

/// Value of one field built from its slot alone.
fn from_slot(plan: &CodecPlan<'_>, field: &FieldPlan<'_>) -> TokenStream {
    let rt = plan.runtime;
    let slot = &field.slot;
    if field.field.nullable {
        quote!(#slot)
    } else {
        let identity = plan.identity();
        let wire = field.wire_name();
        quote!(#rt::require_field(#slot, #identity, #wire)?)
    }
}

fn struct_literal(plan: &CodecPlan<'_>, with_defaults: bool) -> TokenStream {
    let target = &plan.target;
    let members = plan.fields.iter().map(|field| {
        let member = &field.member;
        let present = from_slot(plan, field);
        match &field.field.default {
            Some(default) if with_defaults => {
                let mask = field.mask();
                let bit = field.bit();
                quote! {
                    #member: if (#mask & #bit) != 0 { #default } else { #present }
                }
            }
            _ => quote!(#member: #present),
        }
    });
    quote!(#target { #(#members),* })
}

/// The expression that ends `decode`, evaluating to `CodecResult<Target>`.
pub fn generate_construction(plan: &CodecPlan<'_>) -> TokenStream {
    match plan.schema.flavor {
        Flavor::Plain => {
            let literal = struct_literal(plan, false);
            quote!(::std::result::Result::Ok(#literal))
        }
        Flavor::Defaulted => {
            let slots = plan.fields.iter().map(|field| &field.slot);
            let masks = plan.mask_idents();
            let rt = plan.runtime;
            quote!(Self::construct(#(#slots,)* #(#masks,)* #rt::DefaultMarker))
        }
    }
}

/// The defaulting constructor, emitted as an associated function of the codec struct.
///
/// Returns `None` for PLAIN schemas, which construct inline.
pub fn generate_defaulting_constructor(plan: &CodecPlan<'_>) -> Option<TokenStream> {
    if plan.schema.flavor != Flavor::Defaulted {
        return None;
    }

    let rt = plan.runtime;
    let target = &plan.target;
    let params = plan.fields.iter().map(|field| {
        let slot = &field.slot;
        let ty = &field.value_ty;
        quote!(#slot: ::std::option::Option<#ty>)
    });
    let masks = plan.mask_idents();
    let literal = struct_literal(plan, true);

    Some(quote! {
        #[allow(clippy::too_many_arguments)]
        fn construct(
            #(#params,)*
            #(#masks: u32,)*
            _marker: #rt::DefaultMarker,
        ) -> #rt::CodecResult<#target> {
            ::std::result::Result::Ok(#literal)
        }
    })
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::schema::{ClassSchema, FieldSchema, TypeDescriptor};

    fn field(ident: &str, ty: &str, ordinal: usize) -> FieldSchema {
        let ty = TypeDescriptor::named(ty);
        FieldSchema {
            ident: ident.into(),
            wire_name: ident.into(),
            is_primitive: ty.is_scalar(),
            ty,
            nullable: false,
            default: None,
            ordinal,
        }
    }

    fn runtime() -> syn::Path {
        parse_quote!(::tagwire)
    }

    #[test]
    fn test_plain_construction_requires_fields() {
        let mut nickname = field("nickname", "std::string::String", 1);
        nickname.nullable = true;
        let schema = ClassSchema {
            identity: "crate::User".into(),
            fields: vec![field("id", "u64", 0), nickname],
            flavor: Flavor::Plain,
        };
        let runtime = runtime();
        let plan = CodecPlan::new(&schema, &runtime, "Codec").unwrap();

        let code = generate_construction(&plan).to_string();
        assert!(code.contains(":: tagwire :: require_field (id_slot , \"crate::User\" , \"id\") ?"));
        assert!(code.contains("nickname : nickname_slot"));
        assert!(generate_defaulting_constructor(&plan).is_none());
        syn::parse2::<syn::Expr>(generate_construction(&plan)).unwrap();
    }

    #[test]
    fn test_defaulting_constructor() {
        let mut some_int = field("some_int", "i32", 1);
        some_int.default = Some(parse_quote!(30));
        let schema = ClassSchema {
            identity: "crate::ItemWithDefault".into(),
            fields: vec![field("required_string", "std::string::String", 0), some_int],
            flavor: Flavor::Defaulted,
        };
        let runtime = runtime();
        let plan = CodecPlan::new(&schema, &runtime, "Codec").unwrap();

        let call = generate_construction(&plan).to_string();
        assert_eq!(
            call,
            quote!(Self::construct(required_string_slot, some_int_slot, mask0, ::tagwire::DefaultMarker))
                .to_string()
        );

        let ctor = generate_defaulting_constructor(&plan).unwrap();
        let item: syn::ImplItemFn = syn::parse2(ctor).unwrap();
        assert_eq!(item.sig.inputs.len(), 4);
        let code = quote!(#item).to_string();
        assert!(code.contains("some_int : if (mask0 & 2u32) != 0 { 30 } else"));
        assert!(code.contains("required_string : :: tagwire :: require_field (required_string_slot"));
    }
}
