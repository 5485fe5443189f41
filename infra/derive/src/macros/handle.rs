use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Fields, ItemStruct};

pub fn expand_handle(input: ItemStruct) -> TokenStream {
    if !matches!(input.fields, Fields::Named(_)) {
        return syn::Error::new_spanned(&input.ident, "handle requires a struct with named fields")
            .to_compile_error();
    }

    let handle = &input.ident;
    let vis = &input.vis;
    let fields = &input.fields;
    let attrs = &input.attrs;
    let inner = format_ident!("{handle}Inner");
    let inner_doc = format!("Shared state behind [`{handle}`].");

    quote! {
        #[doc = #inner_doc]
        #[derive(Debug)]
        #vis struct #inner #fields

        #(#attrs)*
        #[derive(Debug, Clone)]
        #vis struct #handle {
            inner: std::sync::Arc<#inner>,
        }

        #[automatically_derived]
        impl #handle {
            /// Wraps already assembled state into a shareable handle.
            #[must_use]
            pub fn from_inner(inner: #inner) -> Self {
                Self { inner: std::sync::Arc::new(inner) }
            }

            /// Number of live clones of this handle.
            #[must_use]
            pub fn handle_count(&self) -> usize {
                std::sync::Arc::strong_count(&self.inner)
            }
        }

        #[automatically_derived]
        impl std::ops::Deref for #handle {
            type Target = #inner;

            fn deref(&self) -> &Self::Target {
                &self.inner
            }
        }
    }
}
