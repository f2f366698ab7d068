use proc_macro2::{Ident, TokenStream};
use quote::quote;

use crate::layout::Layout;

pub(crate) fn expand(name: &Ident, layout: &Layout) -> TokenStream {
    let body = match layout {
        Layout::Struct { tag, fields } => {
            let base: usize = if tag.is_some() { 2 } else { 0 };
            let sizes = fields.iter().map(|field| {
                let start = field.start;
                let ident = &field.ident;
                quote! {
                    size = size.max(#start + ::smb_core::SMBByteSize::smb_byte_size(&self.#ident));
                }
            });
            quote! {
                let mut size: usize = #base;
                #(#sizes)*
                size
            }
        }
        Layout::Enum { repr } => quote! {
            ::std::mem::size_of::<#repr>()
        },
    };

    quote! {
        impl ::smb_core::SMBByteSize for #name {
            fn smb_byte_size(&self) -> usize {
                #body
            }
        }
    }
}
