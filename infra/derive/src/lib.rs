#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the Strata workspace.
//!
//! * [`main`] boots the tuned Tokio runtime from `strata-runtime`.
//! * [`strata_error`] turns an enum into a context-aware error type.
//! * [`handle`] turns a struct into a cheaply cloneable `Arc` handle.
//!
//! Examples are `ignore`d because they reference crates downstream of this one.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Attribute macro to bootstrap the Strata Tokio runtime.
///
/// Transforms an `async fn main` into a plain `fn main` that builds a runtime from the
/// selected [`RuntimeConfig`](../strata_runtime/struct.RuntimeConfig.html) preset and
/// blocks on the body.
///
/// # Arguments
///
/// * `high_performance` - Large stacks and a generous blocking-thread budget.
/// * `memory_efficient` - Half the workers and a small blocking-thread budget.
/// * `default` - Worker count from `TOKIO_WORKER_THREADS` or the available parallelism.
///
/// # Examples
///
/// ```rust,ignore
/// #[strata_runtime::main(default)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro for defining crate-level error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait adding `.context(..)` to
///   `Result<T, Name>` and to `Result<T, Source>` for every wrapped source type.
/// * **Conversions**: Implements `From<Source>` for variants with a `source` field so `?` works.
/// * **Internal Fallback**: Implements `From<&'static str>` and `From<String>` when an
///   `Internal` variant exists.
/// * **Kind**: Generates `kind(&self) -> &'static str` returning the variant name, for
///   structured log fields.
///
/// # Requirements
///
/// 1. Applied to an **enum** with named-field variants only.
/// 2. Variants with a source must also carry `context: Option<Cow<'static, str>>`.
/// 3. Only one `strata_error` per module, since a private `format_context` helper is emitted
///    next to the enum.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
/// use strata_derive::strata_error;
///
/// #[strata_error]
/// pub enum StoreError {
///     #[error("Codec failure{}: {source}", format_context(.context))]
///     Codec { source: serde_json::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn decode(raw: &str) -> Result<u32, StoreError> {
///     serde_json::from_str(raw).context("Decoding row")
/// }
/// ```
#[proc_macro_attribute]
pub fn strata_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Attribute macro that turns a struct into a shared handle.
///
/// The annotated fields move into a generated `<Name>Inner` struct; `<Name>` becomes a
/// `Clone` wrapper around `Arc<<Name>Inner>` that derefs to the inner state.
///
/// # Example
/// ```rust,ignore
/// #[strata_derive::handle]
/// pub struct Registry {
///     pub name: String,
/// }
///
/// let registry = Registry::from_inner(RegistryInner { name: "users".to_owned() });
/// assert_eq!(registry.name, "users");
/// ```
#[proc_macro_attribute]
pub fn handle(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemStruct);
    macros::handle::expand_handle(input).into()
}
