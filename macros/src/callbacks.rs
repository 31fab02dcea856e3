use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{
    parse_quote, punctuated::Punctuated, token::Paren, Field, FieldMutability, Fields,
    FieldsUnnamed, Ident, ItemEnum, Type, Visibility,
};

pub fn callbacks(attr: TokenStream, item: TokenStream) -> TokenStream {
    assert!(
        attr.is_empty(),
        "#[callbacks] does not take arguments."
    );

    let item = TokenStream2::from(item);

    // parse enum body
    let mut e: ItemEnum = syn::parse2(item).expect("Callbacks must be an enum.");

    assert!(
        !e.variants.is_empty(),
        "Callbacks must contain at least one variant."
    );

    // unit variants name their handler type
    e.variants = e
        .variants
        .iter()
        .map(|v| {
            let mut v = v.clone();

            match v.fields {
                Fields::Unit => {
                    let ident = v.ident.clone();

                    let mut punc = Punctuated::new();
                    punc.push(Field {
                        attrs: Vec::new(),
                        vis: Visibility::Inherited,
                        mutability: FieldMutability::None,
                        ident: None,
                        colon_token: None,
                        ty: Type::Verbatim(quote! { #ident }),
                    });

                    v.fields = Fields::Unnamed(FieldsUnnamed {
                        paren_token: Paren::default(),
                        unnamed: punc,
                    });

                    v
                }
                Fields::Unnamed(_) => v,
                Fields::Named(_) => panic!("Callbacks cannot contain struct variants."),
            }
        })
        .collect();

    // validate variants hold exactly one handler
    for variant in &e.variants {
        if variant.fields.len() != 1 {
            panic!("Callback variants must hold exactly one handler.")
        }
    }

    let ident = e.ident.clone();
    let variant_idents: Vec<Ident> = e.variants.iter().map(|v| v.ident.clone()).collect();
    let variant_tys: Vec<Type> = e
        .variants
        .iter()
        .map(|v| match &v.fields {
            Fields::Unnamed(fields) => fields.unnamed[0].ty.clone(),
            _ => unreachable!("All variant fields are unnamed by now."),
        })
        .collect();

    // generate variant variables for match statement
    let variant_vars: Vec<Ident> = variant_idents
        .iter()
        .map(|i| {
            Ident::new(
                &inflector::cases::snakecase::to_snake_case(&i.to_string()),
                Span::call_site(),
            )
        })
        .collect();

    let (_, ty_generics, _) = e.generics.split_for_impl();
    let (from_impl_generics, _, from_where_clause) = e.generics.split_for_impl();

    // the forwarding impl is generic over the messenger's port and capacity
    let mut call_generics = e.generics.clone();
    call_generics.params.push(parse_quote! { __Port });
    call_generics
        .params
        .push(parse_quote! { const __N: usize });
    {
        let where_clause = call_generics.make_where_clause();
        where_clause.predicates.push(parse_quote! {
            __Port: ::cmd_messenger::embedded_io_async::Read
                + ::cmd_messenger::embedded_io_async::Write
        });
        for ty in &variant_tys {
            where_clause.predicates.push(parse_quote! {
                #ty: ::cmd_messenger::Callback<__Port, __N>
            });
        }
    }
    let (call_impl_generics, _, call_where_clause) = call_generics.split_for_impl();

    quote! {
        #e

        #(
            impl #from_impl_generics From<#variant_tys> for #ident #ty_generics #from_where_clause {
                #[inline]
                fn from(value: #variant_tys) -> Self {
                    Self::#variant_idents(value)
                }
            }
        )*

        impl #call_impl_generics ::cmd_messenger::Callback<__Port, __N> for #ident #ty_generics #call_where_clause {
            async fn call(
                &mut self,
                messenger: &mut ::cmd_messenger::Messenger<__Port, __N>,
            ) -> Result<(), ::cmd_messenger::Error<<__Port as ::cmd_messenger::embedded_io_async::ErrorType>::Error>> {
                match self {
                    #(
                        #ident::#variant_idents(#variant_vars) => {
                            ::cmd_messenger::Callback::<__Port, __N>::call(#variant_vars, messenger).await
                        }
                    )*
                }
            }
        }
    }
    .into()
}
