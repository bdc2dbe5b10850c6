use proc_macro::TokenStream;
use quote::quote;
use syn::*;

use crate::attr;

pub fn decode(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput { attrs: _, vis: _, ident, mut generics, data } = input;

    let q1 = match data {
        Data::Struct(st) => match &st.fields {
            Fields::Unnamed(FieldsUnnamed { unnamed, .. }) => {
                if unnamed.len() != 1 {
                    error!("only one field struct is supported")
                }

                quote! {
                    Ok(Self(col.decode()?))
                }
            }
            Fields::Named(FieldsNamed { named, .. }) => {
                let Some(Field { ident: Some(name), .. }) = named.first().filter(|_|named.len() == 1) else {
                    error!("only one field struct is supported")
                };

                quote! {
                    Ok(Self {
                        #name: col.decode()?,
                    })
                }
            },
            Fields::Unit => quote! { Ok(Self) }
        },
        Data::Enum(en) => {
            let mut arms = vec![];
            for variant in en.variants {
                if !matches!(variant.fields, Fields::Unit) {
                    error!("only unit variant is supported")
                }
                let id = variant.ident;
                let name = match attr::rename(&variant.attrs)? {
                    Some(name) => name,
                    None => id.to_string(),
                };
                arms.push(quote! { Some(#name) => Ok(Self::#id), });
            }

            quote! {
                let value = col.try_into_value()?;
                match value.as_str() {
                    #(#arms)*
                    Some(name) => Err(::rowbin::DecodeError::UnknownVariant(
                        ::std::string::String::from(name).into()
                    )),
                    None => Err(::rowbin::DecodeError::TypeMismatch {
                        expected: stringify!(#ident),
                        found: value.kind_name(),
                    }),
                }
            }
        },
        Data::Union(_) => error!("union is not supported"),
    };

    for ty in generics.type_params_mut() {
        ty.bounds.push(syn::parse_quote!(::rowbin::Decode));
    }

    let (g1, g2, g3) = generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #g1 ::rowbin::Decode for #ident #g2 #g3 {
            fn decode(col: ::rowbin::row::Column) -> ::std::result::Result<Self, ::rowbin::DecodeError> {
                #q1
            }
        }
    }.into())
}
