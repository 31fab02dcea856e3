use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Index, LitStr, Variant};

/// Identifier expressions following Rust's discriminant rules.
fn build_ids<'a>(variants: impl Iterator<Item = &'a Variant>) -> Vec<TokenStream2> {
    let mut ids = Vec::new();
    let mut i = 0; // count up by one starting at any known id
    let mut last_anchor = quote! { 0 };

    for variant in variants {
        if let Some((_, id)) = &variant.discriminant {
            // an id is provided, restart counter and update as last anchor
            let tokens = quote! { (#id) };
            ids.push(tokens.clone());
            i = 0;
            last_anchor = tokens;
        } else {
            // no explicit id, count up from last anchor
            let rendered_offset = Index::from(i);
            ids.push(quote! { #last_anchor + #rendered_offset });
        }
        i += 1;
    }

    ids
}

fn get_format(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .find(|attr| attr.path().is_ident("format"))
        .map(|attr| {
            attr.parse_args::<LitStr>()
                .expect("Format must be a string literal: #[format(\"...\")]")
                .value()
        })
        .unwrap_or_default()
}

pub fn commands(item: TokenStream) -> TokenStream {
    let item: DeriveInput = syn::parse2(item.into()).expect("Commands must be an enum.");

    let ident = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();

    let Data::Enum(e) = &item.data else {
        panic!("Commands can only be derived for enums.");
    };

    assert!(
        !e.variants.is_empty(),
        "Commands must contain at least one variant."
    );

    for variant in &e.variants {
        if !matches!(variant.fields, Fields::Unit) {
            panic!("Command variants cannot hold data.");
        }
    }

    let variants: Vec<_> = e.variants.iter().map(|v| &v.ident).collect();
    let ids = build_ids(e.variants.iter());
    let id_consts: Vec<_> = variants
        .iter()
        .map(|v| {
            format_ident!(
                "{}_ID",
                inflector::cases::screamingsnakecase::to_screaming_snake_case(&v.to_string())
            )
        })
        .collect();
    let names: Vec<_> = variants
        .iter()
        .map(|v| inflector::cases::snakecase::to_snake_case(&v.to_string()))
        .collect();
    let formats: Vec<_> = e.variants.iter().map(|v| get_format(&v.attrs)).collect();

    quote! {
        impl #impl_generics ::cmd_messenger::CommandSet for #ident #ty_generics #where_clause {
            const SPECS: &'static [::cmd_messenger::CommandSpec<'static>] = &[
                #(
                    ::cmd_messenger::CommandSpec::new(#ids, #names, #formats),
                )*
            ];

            fn id(self) -> u16 {
                #(
                    const #id_consts: u16 = #ids;
                )*

                match self {
                    #(
                        Self::#variants => #id_consts,
                    )*
                }
            }

            fn from_id(id: u16) -> Option<Self> {
                #(
                    const #id_consts: u16 = #ids;
                )*

                match id {
                    #(
                        #id_consts => Some(Self::#variants),
                    )*
                    _ => None,
                }
            }

            fn name(self) -> &'static str {
                match self {
                    #(
                        Self::#variants => #names,
                    )*
                }
            }

            fn format(self) -> &'static str {
                match self {
                    #(
                        Self::#variants => #formats,
                    )*
                }
            }
        }

        impl #impl_generics From<#ident #ty_generics> for u16 #where_clause {
            #[inline]
            fn from(value: #ident #ty_generics) -> u16 {
                ::cmd_messenger::CommandSet::id(value)
            }
        }
    }
    .into()
}
