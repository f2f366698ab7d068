use bytes::BufMut;
use serde::{Deserialize, Serialize};

use smb_core::{SMBByteSize, SMBFromBytes, SMBParseResult, SMBToBytes};
use smb_core::error::SMBError;

use crate::byte_helper::{read_u16, read_u32, slice_at};
use crate::protocol::body::create::file_id::SMBFileId;
use crate::protocol::header::SMB2_HEADER_LENGTH;

pub mod dfs_referral;
pub mod flags;
pub mod method;

pub use flags::SMBIoCtlRequestFlags;
pub use method::SMBIoCtlCode;

const IOCTL_REQUEST_STRUCTURE_SIZE: u16 = 57;
const IOCTL_REQUEST_FIXED_SIZE: usize = 56;
const IOCTL_RESPONSE_STRUCTURE_SIZE: u16 = 49;
const IOCTL_RESPONSE_FIXED_SIZE: usize = 48;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SMBIoCtlRequest {
    pub(crate) ctl_code: SMBIoCtlCode,
    pub(crate) file_id: SMBFileId,
    pub(crate) flags: SMBIoCtlRequestFlags,
    pub(crate) max_output_response: u32,
    pub(crate) input: Vec<u8>,
}

impl SMBIoCtlRequest {
    pub fn fsctl(ctl_code: SMBIoCtlCode, input: Vec<u8>, max_output_response: u32) -> Self {
        Self {
            ctl_code,
            file_id: SMBFileId::ANY,
            flags: SMBIoCtlRequestFlags::FSCTL,
            max_output_response,
            input,
        }
    }

    pub fn ctl_code(&self) -> SMBIoCtlCode {
        self.ctl_code
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }
}

impl SMBByteSize for SMBIoCtlRequest {
    fn smb_byte_size(&self) -> usize {
        IOCTL_REQUEST_FIXED_SIZE + self.input.len()
    }
}

impl SMBToBytes for SMBIoCtlRequest {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let input_offset = if self.input.is_empty() { 0 } else { (SMB2_HEADER_LENGTH + IOCTL_REQUEST_FIXED_SIZE) as u32 };
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(IOCTL_REQUEST_STRUCTURE_SIZE);
        bytes.put_u16_le(0);
        bytes.extend_from_slice(&self.ctl_code.smb_to_bytes());
        bytes.extend_from_slice(&self.file_id.smb_to_bytes());
        bytes.put_u32_le(input_offset);
        bytes.put_u32_le(self.input.len() as u32);
        bytes.put_u32_le(0);
        bytes.put_u32_le(0);
        bytes.put_u32_le(0);
        bytes.put_u32_le(self.max_output_response);
        bytes.extend_from_slice(&self.flags.smb_to_bytes());
        bytes.put_u32_le(0);
        bytes.extend_from_slice(&self.input);
        bytes
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SMBIoCtlResponse {
    pub(crate) ctl_code: u32,
    pub(crate) file_id: SMBFileId,
    pub(crate) output: Vec<u8>,
}

impl SMBIoCtlResponse {
    pub fn ctl_code(&self) -> u32 {
        self.ctl_code
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }
}

impl SMBByteSize for SMBIoCtlResponse {
    fn smb_byte_size(&self) -> usize {
        IOCTL_RESPONSE_FIXED_SIZE + self.output.len()
    }
}

impl SMBToBytes for SMBIoCtlResponse {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let output_offset = (SMB2_HEADER_LENGTH + IOCTL_RESPONSE_FIXED_SIZE) as u32;
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(IOCTL_RESPONSE_STRUCTURE_SIZE);
        bytes.put_u16_le(0);
        bytes.put_u32_le(self.ctl_code);
        bytes.extend_from_slice(&self.file_id.smb_to_bytes());
        bytes.put_u32_le(output_offset);
        bytes.put_u32_le(0);
        bytes.put_u32_le(output_offset);
        bytes.put_u32_le(self.output.len() as u32);
        bytes.put_u32_le(0);
        bytes.put_u32_le(0);
        bytes.extend_from_slice(&self.output);
        bytes
    }
}

impl SMBFromBytes for SMBIoCtlResponse {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        let structure_size = read_u16(input, 0)?;
        if structure_size != IOCTL_RESPONSE_STRUCTURE_SIZE {
            return Err(SMBError::parse_error(format!("invalid IOCTL structure size {}", structure_size)));
        }
        let ctl_code = read_u32(input, 4)?;
        let (_, file_id) = SMBFileId::smb_from_bytes(slice_at(input, 8, 16)?)?;
        let output_offset = read_u32(input, 32)? as usize;
        let output_count = read_u32(input, 36)? as usize;
        let output = if output_count == 0 {
            Vec::new()
        } else {
            let start = output_offset.checked_sub(SMB2_HEADER_LENGTH)
                .ok_or_else(|| SMBError::parse_error("IOCTL output offset inside header"))?;
            slice_at(input, start, output_count)?.to_vec()
        };
        let consumed = (IOCTL_RESPONSE_FIXED_SIZE + output.len()).min(input.len());
        Ok((&input[consumed..], Self { ctl_code, file_id, output }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fsctl_request_layout() {
        let request = SMBIoCtlRequest::fsctl(SMBIoCtlCode::DfsGetReferrals, vec![4, 0, 0, 0], 8192);
        let bytes = request.smb_to_bytes();
        assert_eq!(bytes.len(), 60);
        assert_eq!(&bytes[0..2], &[57, 0]);
        assert_eq!(&bytes[4..8], &[0x94, 0x01, 0x06, 0x00]);
        assert_eq!(&bytes[8..24], &[0xFF; 16]);
        assert_eq!(&bytes[24..28], &[120, 0, 0, 0]);
        assert_eq!(&bytes[28..32], &[4, 0, 0, 0]);
        assert_eq!(&bytes[44..48], &8192u32.to_le_bytes());
        assert_eq!(&bytes[48..52], &[1, 0, 0, 0]);
    }

    #[test]
    fn response_output_is_located_by_offset() {
        let response = SMBIoCtlResponse { ctl_code: 0x00060194, file_id: SMBFileId::ANY, output: vec![1, 2, 3] };
        let bytes = response.smb_to_bytes();
        let (remaining, parsed) = SMBIoCtlResponse::smb_from_bytes(&bytes).unwrap();
        assert!(remaining.is_empty());
        assert_eq!(parsed.output(), &[1, 2, 3]);
    }
}
