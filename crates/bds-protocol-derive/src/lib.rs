use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Decode a struct by decoding each field in declaration order.
///
/// Every field type must implement `bds_protocol::Decode`. The whole struct is
/// read inside a cursor transaction, so a failure in any field leaves the
/// cursor where the struct started.
#[proc_macro_derive(Decode)]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let decode_body = match &input.data {
        Data::Struct(data) => struct_body(&data.fields),
        Data::Enum(_) => {
            quote! {
                compile_error!("Decode derive does not support enums; write the discriminant match by hand")
            }
        }
        Data::Union(_) => {
            quote! {
                compile_error!("Decode derive does not support unions")
            }
        }
    };

    let expanded = quote! {
        impl #impl_generics bds_protocol::Decode for #name #ty_generics #where_clause {
            fn decode(cursor: &mut bds_protocol::Cursor<'_>) -> bds_protocol::Result<Self> {
                cursor.transaction(|cursor| {
                    #decode_body
                })
            }
        }
    };

    TokenStream::from(expanded)
}

fn struct_body(fields: &Fields) -> TokenStream2 {
    match fields {
        Fields::Named(fields) => {
            let field_decodes = fields.named.iter().map(|f| {
                let field_name = &f.ident;
                let field_ty = &f.ty;
                quote! {
                    #field_name: <#field_ty as bds_protocol::Decode>::decode(cursor)?,
                }
            });
            quote! {
                Ok(Self {
                    #(#field_decodes)*
                })
            }
        }
        Fields::Unnamed(fields) => {
            let field_decodes = fields.unnamed.iter().map(|f| {
                let field_ty = &f.ty;
                quote! {
                    <#field_ty as bds_protocol::Decode>::decode(cursor)?,
                }
            });
            quote! {
                Ok(Self(#(#field_decodes)*))
            }
        }
        Fields::Unit => {
            quote! { Ok(Self) }
        }
    }
}
