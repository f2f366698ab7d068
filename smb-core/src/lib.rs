use uuid::Uuid;

use error::SMBError;

pub mod error;
pub mod logging;
pub mod nt_status;

pub type SMBResult<T> = Result<T, SMBError>;

pub type SMBParseResult<I, O, E = SMBError> = Result<(I, O), E>;

pub trait SMBByteSize {
    fn smb_byte_size(&self) -> usize;
}

pub trait SMBFromBytes: SMBByteSize {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized;
}

pub trait SMBToBytes: SMBByteSize {
    fn smb_to_bytes(&self) -> Vec<u8>;
}

impl<T: SMBByteSize> SMBByteSize for Vec<T> {
    fn smb_byte_size(&self) -> usize {
        self.iter().fold(0, |prev, x| prev + x.smb_byte_size())
    }
}

impl<T: SMBToBytes> SMBToBytes for Vec<T> {
    fn smb_to_bytes(&self) -> Vec<u8> {
        self.iter().flat_map(|x| x.smb_to_bytes()).collect()
    }
}

pub trait SMBVecFromBytes {
    fn smb_from_bytes_vec(input: &[u8], count: usize) -> SMBParseResult<&[u8], Self> where Self: Sized;
}

impl<T: SMBFromBytes> SMBVecFromBytes for Vec<T> {
    fn smb_from_bytes_vec(input: &[u8], count: usize) -> SMBParseResult<&[u8], Self> where Self: Sized {
        let mut remaining = input;
        let mut msg_vec = Vec::<T>::with_capacity(count);
        for _ in 0..count {
            let (r, val) = T::smb_from_bytes(remaining)?;
            msg_vec.push(val);
            remaining = r;
        }
        Ok((remaining, msg_vec))
    }
}

/// UTF-16LE strings. `count` is the length in bytes.
impl SMBVecFromBytes for String {
    fn smb_from_bytes_vec(input: &[u8], count: usize) -> SMBParseResult<&[u8], Self> where Self: Sized {
        let (remaining, vec) = <Vec<u16>>::smb_from_bytes_vec(input, count / 2)?;
        let string = String::from_utf16(&vec)
            .map_err(SMBError::parse_error)?;
        Ok((remaining, string))
    }
}

impl SMBFromBytes for Uuid {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        if input.len() < 16 {
            return Err(SMBError::payload_too_small(16usize, input.len()));
        }
        let uuid = Uuid::from_slice(&input[0..16])
            .map_err(SMBError::parse_error)?;
        Ok((&input[16..], uuid))
    }
}

impl SMBByteSize for Uuid {
    fn smb_byte_size(&self) -> usize {
        self.as_bytes().len()
    }
}

impl SMBToBytes for Uuid {
    fn smb_to_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

macro_rules! impl_parse_fixed_slice {
    ($size: expr, $input: expr) => {{
        if $input.len() < $size {
            return Err(SMBError::payload_too_small($size as usize, $input.len()));
        }
        let res = <[u8; $size]>::try_from(&$input[0..$size])
            .map_err(SMBError::parse_error)?;
        Ok((&$input[$size..], res))
    }}
}

macro_rules! impl_smb_for_slice {(
    $($N:literal)*
) => (
    $(
        impl SMBByteSize for [u8; $N] {
            fn smb_byte_size(&self) -> usize {
                $N
            }
        }

        impl SMBFromBytes for [u8; $N] {
            fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> {
                impl_parse_fixed_slice!($N, input)
            }
        }

        impl SMBToBytes for [u8; $N] {
            fn smb_to_bytes(&self) -> Vec<u8> {
                self.to_vec()
            }
        }
    )*
)}

macro_rules! impl_smb_for_unsigned_type {(
    $($t:ty)*
) => (
    $(
        impl SMBByteSize for $t {
            fn smb_byte_size(&self) -> usize {
                std::mem::size_of_val(self)
            }
        }

        impl SMBFromBytes for $t {
            fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> {
                const T_SIZE: usize = std::mem::size_of::<$t>();
                let value: SMBParseResult<&[u8], [u8; T_SIZE]> = impl_parse_fixed_slice!(T_SIZE, input);
                let (remaining, bytes) = value?;
                Ok((remaining, <$t>::from_le_bytes(bytes)))
            }
        }

        impl SMBToBytes for $t {
            fn smb_to_bytes(&self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }
        }
    )*
)}

impl_smb_for_slice! {
    1 2 3 4 5 6 7 8 9
    10 11 12 13 14 15 16
    17 18 19 20 21 22 23 24
    25 26 27 28 29 30 31 32
}

impl_smb_for_unsigned_type! {
    u8 u16 u32 u64 u128
}
