//! Decoder Generator: emits `Codec::decode` for a schema.

use proc_macro2::TokenStream;
use quote::quote;

use crate::construct;
use crate::plan::{CodecPlan, FieldPlan};
use crate::schema::{Flavor, TypeDescriptor};

/// The zero value a primitive slot starts with.
fn zero_value(ty: &TypeDescriptor) -> TokenStream {
    match ty.raw() {
        Some("f32" | "f64") => quote!(0.0),
        Some("bool") => quote!(false),
        Some("char") => quote!('\0'),
        _ => quote!(0),
    }
}

fn slot_decl(field: &FieldPlan<'_>) -> TokenStream {
    let slot = &field.slot;
    let ty = &field.value_ty;
    let init = if field.field.is_primitive {
        let zero = zero_value(&field.field.ty);
        quote!(::std::option::Option::Some(#zero))
    } else {
        quote!(::std::option::Option::None)
    };
    quote!(let mut #slot: ::std::option::Option<#ty> = #init;)
}

fn match_arm(field: &FieldPlan<'_>, flavor: Flavor) -> TokenStream {
    let wire = field.wire_name();
    let slot = &field.slot;
    let codec = &field.codec;

    let store = if field.field.is_primitive {
        // a JSON null keeps the zero value
        quote! {
            let value = self.#codec.decode(reader)?;
            if value.is_some() {
                #slot = value;
            }
        }
    } else {
        quote!(#slot = self.#codec.decode(reader)?;)
    };

    let clear = match flavor {
        Flavor::Plain => TokenStream::new(),
        Flavor::Defaulted => {
            let mask = field.mask();
            let bit = field.bit();
            quote!(#mask &= !#bit;)
        }
    };

    quote! {
        #wire => {
            #store
            #clear
        }
    }
}

/// Emit the `decode` method of the `Codec` impl.
pub fn generate_decode(plan: &CodecPlan<'_>) -> TokenStream {
    let rt = plan.runtime;
    let target = &plan.target;
    let flavor = plan.schema.flavor;

    let slots = plan.fields.iter().map(slot_decl);
    let masks = match flavor {
        Flavor::Plain => Vec::new(),
        Flavor::Defaulted => plan
            .mask_idents()
            .into_iter()
            .map(|mask| quote!(let mut #mask: u32 = !0;))
            .collect(),
    };
    let arms = plan.fields.iter().map(|field| match_arm(field, flavor));
    let construction = construct::generate_construction(plan);

    quote! {
        fn decode(
            &self,
            reader: &mut #rt::JsonReader,
        ) -> #rt::CodecResult<::std::option::Option<#target>> {
            if reader.peek()? == #rt::JsonToken::Null {
                reader.next_null()?;
                return ::std::result::Result::Ok(::std::option::Option::None);
            }

            #(#slots)*
            #(#masks)*

            reader.begin_object()?;
            while reader.has_next()? {
                let name = reader.next_name()?;
                match &*name {
                    #(#arms)*
                    _ => reader.skip_value()?,
                }
            }
            reader.end_object()?;

            #construction.map(::std::option::Option::Some)
        }
    }
}
