//! Derive macros for `rowbin`.
use proc_macro::TokenStream;
use syn::DeriveInput;

macro_rules! error {
    ($($tt:tt)*) => {
        return Err(syn::Error::new(proc_macro::Span::call_site().into(), format!($($tt)*)))
    };
}

mod attr;
mod decode;
mod from_row;

/// Derive `FromRow`.
///
/// Named field is taken from the column with the same name, tuple struct field
/// is taken by column position.
///
/// Field attribute `#[rowbin(rename = "column")]` overrides the column name.
#[proc_macro_derive(FromRow, attributes(rowbin))]
pub fn from_row(input: TokenStream) -> TokenStream {
    match from_row::from_row(syn::parse_macro_input!(input as DeriveInput)) {
        Ok(ok) => ok,
        Err(err) => err.into_compile_error().into(),
    }
}

/// Derive `Decode`.
///
/// Single field struct decodes its field. Enum with unit variants decodes from
/// `Enum` or `String` column by variant name.
///
/// Variant attribute `#[rowbin(rename = "name")]` overrides the variant name.
#[proc_macro_derive(Decode, attributes(rowbin))]
pub fn decode(input: TokenStream) -> TokenStream {
    match decode::decode(syn::parse_macro_input!(input as DeriveInput)) {
        Ok(ok) => ok,
        Err(err) => err.into_compile_error().into(),
    }
}
