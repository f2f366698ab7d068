use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::{SMBByteSize, SMBFromBytes, SMBParseResult, SMBToBytes};
use crate::error::SMBError;

#[repr(u32)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, Copy)]
pub enum NTStatus {
    StatusSuccess = 0x0,
    StatusPending = 0x00000103,
    BufferOverflow = 0x80000005,
    NoMoreFiles = 0x80000006,
    InvalidDeviceRequest = 0xC0000010,
    NoSuchFile = 0xC000000F,
    MoreProcessingRequired = 0xC0000016,
    InvalidParameter = 0xC000000D,
    AccessDenied = 0xC0000022,
    ObjectNameNotFound = 0xC0000034,
    ObjectPathNotFound = 0xC000003A,
    StatusLogonFailure = 0xC000006D,
    StatusNotSupported = 0xC00000BB,
    BadNetworkName = 0xC00000CC,
    RequestNotAccepted = 0xC00000D0,
    FsDriverRequired = 0xC000019C,
    UserSessionDeleted = 0xC0000203,
    NotFound = 0xC0000225,
    PathNotCovered = 0xC0000257,
    NetworkSessionExpired = 0xC000035C,
    UnknownError = 0xFFFFFFFF,
}

impl NTStatus {
    /// Maps a raw status to a known value, collapsing everything else to `UnknownError`.
    pub fn from_code(code: u32) -> Self {
        Self::try_from_primitive(code).unwrap_or(Self::UnknownError)
    }

    /// Success and informational/warning severities are not failures.
    pub fn is_error_code(code: u32) -> bool {
        code >> 30 == 0b11
    }
}

impl SMBByteSize for NTStatus {
    fn smb_byte_size(&self) -> usize {
        std::mem::size_of_val(&(*self as u32))
    }
}

impl SMBFromBytes for NTStatus {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        let (remaining, underlying) = u32::smb_from_bytes(input)?;
        let res = Self::try_from_primitive(underlying)
            .map_err(SMBError::parse_error)?;
        Ok((remaining, res))
    }
}

impl SMBToBytes for NTStatus {
    fn smb_to_bytes(&self) -> Vec<u8> {
        (*self as u32).smb_to_bytes()
    }
}
