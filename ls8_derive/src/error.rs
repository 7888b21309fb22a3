//! Derive macro for error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations.
//! Replacement for `thiserror` crate.
//!
//! # Usage
//!
//! ```ignore
//! use ls8_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum CpuError {
//!     #[error("unknown instruction {opcode:#010b}")]
//!     UnknownInstruction { opcode: u8 },
//!
//!     #[error("{mnemonic} at pc {pc:#04x}: {source}")]
//!     ExecutionFault {
//!         pc: u8,
//!         mnemonic: &'static str,
//!         #[source]
//!         source: Box<CpuError>,
//!     },
//!
//!     #[error("halted")]
//!     Halted,
//! }
//! ```
//!
//! # Supported Features
//!
//! - Unit variants: `#[error("message")]`
//! - Tuple variants with positional args: `#[error("error: {0}")]`
//! - Struct variants with named args: `#[error("expected {expected}")]`
//! - Fields the message does not mention are left out of the generated `write!`
//! - One field per variant may be marked `#[source]`; it is returned by `Error::source`

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Data, DeriveInput, Fields, Ident, Lit, Member, Meta, parse_macro_input};

/// Derives `Display` and `Error` for an enum or struct.
///
/// Each variant must have an `#[error("...")]` attribute specifying
/// the display message. Supports field interpolation using `{0}`, `{1}`
/// for tuple fields or `{field_name}` for struct fields.
pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_error_derive(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_error_derive(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let (display_body, source_body) = match &input.data {
        Data::Enum(data_enum) => {
            let mut display_arms = Vec::with_capacity(data_enum.variants.len());
            let mut source_arms = Vec::new();

            for variant in &data_enum.variants {
                let variant_name = &variant.ident;
                let error_msg = extract_error_message(variant)?;

                let arm = match &variant.fields {
                    Fields::Unit => {
                        quote! {
                            Self::#variant_name => write!(f, #error_msg),
                        }
                    }
                    Fields::Unnamed(fields) => {
                        let format_str =
                            convert_positional_to_named(&error_msg, fields.unnamed.len());
                        let referenced = referenced_names(&format_str);
                        let idents: Vec<Ident> = (0..fields.unnamed.len())
                            .map(|i| format_ident!("f{}", i))
                            .collect();
                        let bindings = idents.iter().map(|ident| {
                            if referenced.contains(&ident.to_string().as_str()) {
                                quote! { #ident }
                            } else {
                                quote! { _ }
                            }
                        });
                        let used: Vec<_> = idents
                            .iter()
                            .filter(|ident| referenced.contains(&ident.to_string().as_str()))
                            .collect();
                        quote! {
                            Self::#variant_name(#(#bindings),*) => write!(f, #format_str, #(#used = #used),*),
                        }
                    }
                    Fields::Named(fields) => {
                        let referenced = referenced_names(&error_msg);
                        let used: Vec<_> = fields
                            .named
                            .iter()
                            .filter_map(|field| field.ident.as_ref())
                            .filter(|ident| referenced.contains(&ident.to_string().as_str()))
                            .collect();
                        quote! {
                            Self::#variant_name { #(#used,)* .. } => write!(f, #error_msg, #(#used = #used),*),
                        }
                    }
                };
                display_arms.push(arm);

                if let Some(member) = source_member(&variant.fields)? {
                    let pattern = match member {
                        Member::Named(ident) => quote! { Self::#variant_name { #ident: source, .. } },
                        Member::Unnamed(index) => {
                            let skipped = (0..index.index).map(|_| quote! { _ });
                            quote! { Self::#variant_name(#(#skipped,)* source, ..) }
                        }
                    };
                    source_arms.push(quote! {
                        #pattern => ::std::option::Option::Some(source as &(dyn ::std::error::Error + 'static)),
                    });
                }
            }

            let display_body = quote! {
                match self {
                    #(#display_arms)*
                }
            };
            let fallback = (source_arms.len() < data_enum.variants.len())
                .then(|| quote! { _ => ::std::option::Option::None, });
            let source_body = (!source_arms.is_empty()).then(|| {
                quote! {
                    match self {
                        #(#source_arms)*
                        #fallback
                    }
                }
            });
            (display_body, source_body)
        }
        Data::Struct(data_struct) => {
            let error_msg = extract_error_message_from_attrs(
                &input.attrs,
                &input.ident,
                &format!("type `{}`", input.ident),
            )?;

            let display_body = match &data_struct.fields {
                Fields::Unit => {
                    quote! {
                        write!(f, #error_msg)
                    }
                }
                Fields::Named(fields) => {
                    let referenced = referenced_names(&error_msg);
                    let used: Vec<_> = fields
                        .named
                        .iter()
                        .filter_map(|field| field.ident.as_ref())
                        .filter(|ident| referenced.contains(&ident.to_string().as_str()))
                        .collect();
                    quote! {
                        write!(f, #error_msg, #(#used = self.#used),*)
                    }
                }
                Fields::Unnamed(fields) => {
                    let format_str = convert_positional_to_named(&error_msg, fields.unnamed.len());
                    let referenced = referenced_names(&format_str);
                    let (idents, indices): (Vec<_>, Vec<_>) = (0..fields.unnamed.len())
                        .map(|i| (format_ident!("f{}", i), syn::Index::from(i)))
                        .filter(|(ident, _)| referenced.contains(&ident.to_string().as_str()))
                        .unzip();
                    quote! {
                        write!(f, #format_str, #(#idents = self.#indices),*)
                    }
                }
            };

            let source_body = source_member(&data_struct.fields)?.map(|member| {
                quote! {
                    ::std::option::Option::Some(&self.#member as &(dyn ::std::error::Error + 'static))
                }
            });
            (display_body, source_body)
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error derive does not support unions",
            ));
        }
    };

    let source_fn = source_body.map(|body| {
        quote! {
            fn source(&self) -> ::std::option::Option<&(dyn ::std::error::Error + 'static)> {
                #body
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #display_body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
            #source_fn
        }
    })
}

/// Extracts the error message from a variant's `#[error("...")]` attribute.
fn extract_error_message(variant: &syn::Variant) -> syn::Result<String> {
    let variant_name = variant.ident.to_string();
    extract_error_message_from_attrs(
        &variant.attrs,
        &variant.ident,
        &format!("variant `{}`", variant_name),
    )
}

/// Extracts the error message from attributes.
fn extract_error_message_from_attrs<T: ToTokens>(
    attrs: &[syn::Attribute],
    target: &T,
    target_desc: &str,
) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("error") {
            if let Meta::List(meta_list) = &attr.meta {
                let tokens = meta_list.tokens.clone();
                let lit = syn::parse2::<Lit>(tokens).map_err(|_| {
                    syn::Error::new_spanned(
                        &attr.meta,
                        "failed to parse #[error] attribute; expected a string literal like #[error(\"memory fault at {address}\")]",
                    )
                })?;

                if let Lit::Str(lit_str) = lit {
                    return Ok(lit_str.value());
                }

                return Err(syn::Error::new_spanned(
                    &attr.meta,
                    "invalid #[error] attribute: message must be a string literal, e.g. #[error(\"unknown opcode: {0}\")]",
                ));
            }

            return Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute; use #[error(\"message\")] to describe the error",
            ));
        }
    }

    Err(syn::Error::new_spanned(
        target,
        format!(
            "missing #[error(\"...\")] attribute on {}; every error variant must declare a display message",
            target_desc
        ),
    ))
}

/// Finds the field marked `#[source]`, if any. At most one is allowed.
fn source_member(fields: &Fields) -> syn::Result<Option<Member>> {
    let mut found: Option<Member> = None;
    for (index, field) in fields.iter().enumerate() {
        let Some(attr) = field
            .attrs
            .iter()
            .find(|attr| attr.path().is_ident("source"))
        else {
            continue;
        };
        if found.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "only one field per variant may be marked #[source]",
            ));
        }
        found = Some(match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(syn::Index::from(index)),
        });
    }
    Ok(found)
}

/// Returns the argument names a format string interpolates, skipping `{{` escapes.
fn referenced_names(format_str: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = format_str;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        if let Some(escaped) = after.strip_prefix('{') {
            rest = escaped;
            continue;
        }
        let end = after.find(['}', ':']).unwrap_or(after.len());
        names.push(&after[..end]);
        rest = &after[end..];
    }
    names
}

/// Converts positional format args `{0}`, `{1}` to named args `{f0}`, `{f1}`.
fn convert_positional_to_named(format_str: &str, field_count: usize) -> String {
    let mut result = format_str.to_string();
    for i in (0..field_count).rev() {
        result = result
            .replace(&format!("{{{}}}", i), &format!("{{f{}}}", i))
            .replace(&format!("{{{}:", i), &format!("{{f{}:", i));
    }
    result
}
