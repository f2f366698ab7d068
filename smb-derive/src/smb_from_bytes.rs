use proc_macro2::{Ident, TokenStream};
use quote::quote;

use crate::layout::Layout;

pub(crate) fn expand(name: &Ident, layout: &Layout) -> TokenStream {
    let body = match layout {
        Layout::Struct { tag, fields } => {
            let tag_check = tag.map(|tag| quote! {
                if input.len() < 2 {
                    return Err(::smb_core::error::SMBError::payload_too_small(2usize, input.len()));
                }
                let tag = u16::from_le_bytes([input[0], input[1]]);
                if tag != #tag {
                    return Err(::smb_core::error::SMBError::parse_error(
                        format!("invalid structure size {} for {}", tag, stringify!(#name))
                    ));
                }
            });
            let reads = fields.iter().map(|field| {
                let start = field.start;
                let ident = &field.ident;
                let ty = &field.ty;
                quote! {
                    let #ident = {
                        if input.len() < #start {
                            return Err(::smb_core::error::SMBError::payload_too_small(#start, input.len()));
                        }
                        let (_, value) = <#ty as ::smb_core::SMBFromBytes>::smb_from_bytes(&input[#start..])?;
                        value
                    };
                }
            });
            let idents = fields.iter().map(|field| &field.ident);
            quote! {
                #tag_check
                #(#reads)*
                let value = Self { #(#idents),* };
                let consumed = ::smb_core::SMBByteSize::smb_byte_size(&value);
                if input.len() < consumed {
                    return Err(::smb_core::error::SMBError::payload_too_small(consumed, input.len()));
                }
                Ok((&input[consumed..], value))
            }
        }
        Layout::Enum { repr } => quote! {
            let (remaining, raw) = <#repr as ::smb_core::SMBFromBytes>::smb_from_bytes(input)?;
            let value = <Self as ::num_enum::TryFromPrimitive>::try_from_primitive(raw)
                .map_err(::smb_core::error::SMBError::parse_error)?;
            Ok((remaining, value))
        },
    };

    quote! {
        impl ::smb_core::SMBFromBytes for #name {
            fn smb_from_bytes(input: &[u8]) -> ::smb_core::SMBParseResult<&[u8], Self> {
                #body
            }
        }
    }
}
