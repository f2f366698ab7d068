use darling::FromField;
use proc_macro2::Ident;
use syn::{Data, DeriveInput, Fields, LitInt, Type};

#[derive(Debug, FromField)]
#[darling(attributes(smb_direct))]
pub(crate) struct DirectField {
    pub(crate) ident: Option<Ident>,
    pub(crate) ty: Type,
    pub(crate) start: usize,
}

impl DirectField {
    pub(crate) fn name(&self) -> darling::Result<&Ident> {
        self.ident.as_ref()
            .ok_or_else(|| darling::Error::custom("smb_direct fields must be named"))
    }
}

#[derive(Debug)]
pub(crate) enum Layout {
    Struct {
        tag: Option<u16>,
        fields: Vec<DirectField>,
    },
    Enum {
        repr: Ident,
    },
}

impl Layout {
    pub(crate) fn from_input(input: &DeriveInput) -> darling::Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(darling::Error::custom("generic SMB structures are not supported").with_span(&input.generics));
        }
        match &input.data {
            Data::Struct(data) => {
                let Fields::Named(named) = &data.fields else {
                    return Err(darling::Error::custom("expected a struct with named fields").with_span(&input.ident));
                };
                let mut errors = darling::Error::accumulator();
                let fields = named.named.iter()
                    .filter_map(|field| errors.handle(DirectField::from_field(field)))
                    .collect::<Vec<_>>();
                let tag = errors.handle(parse_byte_tag(input)).flatten();
                errors.finish()?;
                for field in &fields {
                    field.name()?;
                }
                Ok(Self::Struct { tag, fields })
            }
            Data::Enum(data) => {
                if let Some(variant) = data.variants.iter().find(|v| !matches!(v.fields, Fields::Unit)) {
                    return Err(darling::Error::custom("only field-less enums can be derived").with_span(variant));
                }
                let repr = parse_repr(input)?;
                Ok(Self::Enum { repr })
            }
            Data::Union(_) => Err(darling::Error::custom("unions are not supported").with_span(&input.ident)),
        }
    }
}

fn parse_byte_tag(input: &DeriveInput) -> darling::Result<Option<u16>> {
    let mut tag = None;
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("smb_byte_tag")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("value") {
                let lit: LitInt = meta.value()?.parse()?;
                tag = Some(lit.base10_parse::<u16>()?);
                Ok(())
            } else {
                Err(meta.error("expected `value = <u16>`"))
            }
        })?;
    }
    Ok(tag)
}

fn parse_repr(input: &DeriveInput) -> darling::Result<Ident> {
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("repr")) {
        let repr: Ident = attr.parse_args()?;
        if ["u8", "u16", "u32", "u64"].iter().any(|name| repr == *name) {
            return Ok(repr);
        }
    }
    Err(darling::Error::custom("enums need #[repr(u8|u16|u32|u64)]").with_span(&input.ident))
}
