//! Dispatch Aggregator: one codec factory covering every generated codec.

use proc_macro2::{Ident, TokenStream};
use quote::quote;

/// A generated codec the factory can construct.
#[derive(Debug, Clone)]
pub struct DispatchEntry {
    /// Identity of the owning type, matched against `TypeToken::raw`
    pub identity: String,
    /// The owning type as Rust syntax
    pub target: TokenStream,
    pub codec_ident: Ident,
}

/// Emit the factory unit, or `None` when there is nothing to dispatch to.
pub fn generate_dispatch(
    entries: &[DispatchEntry],
    factory_ident: &Ident,
    runtime: &syn::Path,
) -> Option<TokenStream> {
    if entries.is_empty() {
        return None;
    }
    let rt = runtime;

    let names = entries.iter().map(|entry| entry.identity.as_str());
    let arms = entries.iter().map(|entry| {
        let identity = entry.identity.as_str();
        let target = &entry.target;
        let codec = &entry.codec_ident;
        quote! {
            #identity => #codec::new(registry).map(|codec| {
                #rt::ErasedCodec::new::<#target>(::std::sync::Arc::new(codec))
            }),
        }
    });

    Some(quote! {
        /// Codec factory covering every type with a generated codec.
        ///
        /// Register it with `CodecRegistry::builder().factory(..)`. Tokens for other types,
        /// and parameterized tokens, are left to the next factory.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct #factory_ident;

        impl #factory_ident {
            /// Identities of the types this factory serves.
            pub const TYPE_NAMES: &'static [&'static str] = &[#(#names),*];
        }

        impl #rt::CodecFactory for #factory_ident {
            fn create(
                &self,
                registry: &#rt::CodecRegistry,
                token: &#rt::TypeToken,
            ) -> ::std::option::Option<#rt::CodecResult<#rt::ErasedCodec>> {
                if token.is_parameterized() {
                    return ::std::option::Option::None;
                }
                let created = match token.raw() {
                    #(#arms)*
                    _ => return ::std::option::Option::None,
                };
                ::std::option::Option::Some(created)
            }
        }
    })
}
