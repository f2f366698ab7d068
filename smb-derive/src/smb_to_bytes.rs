use proc_macro2::{Ident, TokenStream};
use quote::quote;

use crate::layout::Layout;

pub(crate) fn expand(name: &Ident, layout: &Layout) -> TokenStream {
    let body = match layout {
        Layout::Struct { tag, fields } => {
            let tag_write = tag.map(|tag| quote! {
                item[0..2].copy_from_slice(&#tag.to_le_bytes());
            });
            let writes = fields.iter().map(|field| {
                let start = field.start;
                let ident = &field.ident;
                quote! {
                    let bytes = ::smb_core::SMBToBytes::smb_to_bytes(&self.#ident);
                    item[#start..#start + bytes.len()].copy_from_slice(&bytes);
                }
            });
            quote! {
                let mut item = vec![0u8; ::smb_core::SMBByteSize::smb_byte_size(self)];
                #tag_write
                #(#writes)*
                item
            }
        }
        Layout::Enum { repr } => quote! {
            ::smb_core::SMBToBytes::smb_to_bytes(&(*self as #repr))
        },
    };

    quote! {
        impl ::smb_core::SMBToBytes for #name {
            fn smb_to_bytes(&self) -> Vec<u8> {
                #body
            }
        }
    }
}
