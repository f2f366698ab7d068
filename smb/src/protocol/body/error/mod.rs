use bytes::BufMut;
use serde::{Deserialize, Serialize};

use smb_core::{SMBByteSize, SMBFromBytes, SMBParseResult, SMBToBytes};
use smb_core::error::SMBError;

use crate::byte_helper::{read_u32, slice_at};

const ERROR_STRUCTURE_SIZE: u16 = 9;
const ERROR_FIXED_SIZE: usize = 8;

/// SMB2 ERROR body. The status itself lives in the header; the body only
/// carries optional error data, such as symbolic link details.
#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct SMBErrorResponse {
    error_context_count: u8,
    error_data: Vec<u8>,
}

impl SMBErrorResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_data(&self) -> &[u8] {
        &self.error_data
    }

    /// Error bodies are recognised by structure size alone, whatever the command.
    pub fn is_error_body(body: &[u8]) -> bool {
        body.len() >= 2 && u16::from_le_bytes([body[0], body[1]]) == ERROR_STRUCTURE_SIZE
    }
}

impl SMBByteSize for SMBErrorResponse {
    fn smb_byte_size(&self) -> usize {
        ERROR_FIXED_SIZE + self.error_data.len().max(1)
    }
}

impl SMBToBytes for SMBErrorResponse {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(ERROR_STRUCTURE_SIZE);
        bytes.put_u8(self.error_context_count);
        bytes.put_u8(0);
        bytes.put_u32_le(self.error_data.len() as u32);
        if self.error_data.is_empty() {
            bytes.put_u8(0);
        } else {
            bytes.extend_from_slice(&self.error_data);
        }
        bytes
    }
}

impl SMBFromBytes for SMBErrorResponse {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        if !Self::is_error_body(input) {
            return Err(SMBError::parse_error("not an SMB2 error body"));
        }
        let byte_count = read_u32(input, 4)? as usize;
        let error_context_count = input.get(2).copied().unwrap_or_default();
        let error_data = slice_at(input, ERROR_FIXED_SIZE, byte_count)?.to_vec();
        let consumed = (ERROR_FIXED_SIZE + byte_count.max(1)).min(input.len());
        Ok((&input[consumed..], Self { error_context_count, error_data }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_error_body_is_nine_bytes() {
        let bytes = SMBErrorResponse::new().smb_to_bytes();
        assert_eq!(bytes, vec![9, 0, 0, 0, 0, 0, 0, 0, 0]);
        let (remaining, parsed) = SMBErrorResponse::smb_from_bytes(&bytes).unwrap();
        assert!(remaining.is_empty());
        assert!(parsed.error_data().is_empty());
    }
}
