macro_rules! impl_smb_byte_size_for_bitflag {(
    $($t:ty)*
) => (
    $(
        impl ::smb_core::SMBByteSize for $t {
            fn smb_byte_size(&self) -> usize {
                std::mem::size_of_val(&self.bits())
            }
        }
    )*
)}

macro_rules! impl_smb_from_bytes_for_bitflag {(
    $($t:ty)*
) => (
    $(
        impl ::smb_core::SMBFromBytes for $t {
            fn smb_from_bytes(input: &[u8]) -> ::smb_core::SMBParseResult<&[u8], Self> {
                let (remaining, bits) = <<$t as ::bitflags::Flags>::Bits as ::smb_core::SMBFromBytes>::smb_from_bytes(input)?;
                Ok((remaining, Self::from_bits_retain(bits)))
            }
        }
    )*
)}

macro_rules! impl_smb_to_bytes_for_bitflag {(
    $($t:ty)*
) => (
    $(
        impl ::smb_core::SMBToBytes for $t {
            fn smb_to_bytes(&self) -> Vec<u8> {
                ::smb_core::SMBToBytes::smb_to_bytes(&self.bits())
            }
        }
    )*
)}

pub(crate) use impl_smb_byte_size_for_bitflag;
pub(crate) use impl_smb_from_bytes_for_bitflag;
pub(crate) use impl_smb_to_bytes_for_bitflag;
