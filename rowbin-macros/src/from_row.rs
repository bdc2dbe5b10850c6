use proc_macro::TokenStream;
use quote::quote;
use syn::{token::{Brace, Paren}, *};

use crate::attr;

pub fn from_row(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput { attrs: _, vis: _, ident, mut generics, data } = input;
    let Data::Struct(data) = data else {
        error!("only struct are currently supported")
    };

    let mut output = quote! {};

    match data.fields {
        Fields::Unnamed(FieldsUnnamed { unnamed, .. }) => {
            let body = (0..unnamed.len())
                .map(|i|quote! { row.try_get(#i)?, });
            Paren::default().surround(&mut output, |e|e.extend(body));
        },
        Fields::Named(FieldsNamed { named, .. }) => {
            let mut body = vec![];
            for field in named {
                let Some(id) = field.ident else {
                    error!("named field without identifier")
                };
                let name = match attr::rename(&field.attrs)? {
                    Some(name) => name,
                    None => id.to_string(),
                };
                body.push(quote! { #id: row.try_get(#name)?, });
            }
            Brace::default().surround(&mut output, |e|e.extend(body));
        }
        Fields::Unit => {}
    };

    for ty in generics.type_params_mut() {
        ty.bounds.push(syn::parse_quote!(::rowbin::Decode));
    }

    let (g1, g2, g3) = generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #g1 ::rowbin::FromRow for #ident #g2 #g3 {
            fn from_row(row: ::rowbin::Row) -> ::std::result::Result<Self, ::rowbin::DecodeError> {
                Ok(Self #output)
            }
        }
    }.into())
}
