//! Encoder Generator: emits `Codec::encode` for a schema.
//!
//! Every field is written in declaration order. Null handling belongs to the sub-codecs,
//! so a `None` in a nullable field reaches its codec as `None`.

use proc_macro2::TokenStream;
use quote::quote;

use crate::plan::CodecPlan;

pub fn generate_encode(plan: &CodecPlan<'_>) -> TokenStream {
    let rt = plan.runtime;
    let target = &plan.target;

    let writes = plan.fields.iter().map(|field| {
        let wire = field.wire_name();
        let codec = &field.codec;
        let member = &field.member;
        let value = if field.field.nullable {
            quote!(value.#member.as_ref())
        } else {
            quote!(::std::option::Option::Some(&value.#member))
        };
        quote! {
            writer.name(#wire)?;
            self.#codec.encode(writer, #value)?;
        }
    });

    quote! {
        fn encode(
            &self,
            writer: &mut #rt::JsonWriter,
            value: ::std::option::Option<&#target>,
        ) -> #rt::CodecResult<()> {
            let ::std::option::Option::Some(value) = value else {
                return writer.null_value();
            };
            writer.begin_object()?;
            #(#writes)*
            writer.end_object()
        }
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::schema::{ClassSchema, FieldSchema, Flavor, TypeDescriptor};

    #[test]
    fn test_encode_writes_every_field_in_order() {
        let schema = ClassSchema {
            identity: "crate::User".into(),
            fields: vec![
                FieldSchema {
                    ident: "user_name".into(),
                    wire_name: "userName".into(),
                    ty: TypeDescriptor::named("std::string::String"),
                    nullable: false,
                    is_primitive: false,
                    default: None,
                    ordinal: 0,
                },
                FieldSchema {
                    ident: "email".into(),
                    wire_name: "email".into(),
                    ty: TypeDescriptor::named("std::string::String"),
                    nullable: true,
                    is_primitive: false,
                    default: None,
                    ordinal: 1,
                },
            ],
            flavor: Flavor::Plain,
        };
        let runtime: syn::Path = parse_quote!(::tagwire);
        let plan = CodecPlan::new(&schema, &runtime, "Codec").unwrap();
        let item: syn::ImplItemFn = syn::parse2(generate_encode(&plan)).unwrap();
        let code = quote!(#item).to_string();

        let name = code.find("writer . name (\"userName\")").unwrap();
        let email = code.find("writer . name (\"email\")").unwrap();
        assert!(name < email);
        assert!(!code.contains("\"user_name\""));
        assert!(code.contains("Some (& value . user_name)"));
        assert!(code.contains("self . email_codec . encode (writer , value . email . as_ref ())"));
        assert!(code.contains("return writer . null_value ()"));
    }
}
