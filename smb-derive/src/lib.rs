extern crate proc_macro;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

use crate::layout::Layout;

mod layout;
mod smb_byte_size;
mod smb_from_bytes;
mod smb_to_bytes;

/// Derives `SMBByteSize`.
///
/// Structs place every named field at a fixed offset with `#[smb_direct(start = N)]`
/// and may carry a leading 2-byte structure size with `#[smb_byte_tag(value = N)]`.
/// Field-less enums use their `#[repr(uN)]` primitive.
#[proc_macro_derive(SMBByteSize, attributes(smb_direct, smb_byte_tag))]
pub fn smb_byte_size(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_with(&input, smb_byte_size::expand)
}

#[proc_macro_derive(SMBFromBytes, attributes(smb_direct, smb_byte_tag))]
pub fn smb_from_bytes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_with(&input, smb_from_bytes::expand)
}

#[proc_macro_derive(SMBToBytes, attributes(smb_direct, smb_byte_tag))]
pub fn smb_to_bytes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_with(&input, smb_to_bytes::expand)
}

fn derive_with(input: &DeriveInput, expand: fn(&syn::Ident, &Layout) -> proc_macro2::TokenStream) -> TokenStream {
    match Layout::from_input(input) {
        Ok(layout) => expand(&input.ident, &layout).into(),
        Err(e) => e.write_errors().into(),
    }
}
