use bytes::BufMut;
use serde::{Deserialize, Serialize};

use smb_core::{SMBByteSize, SMBFromBytes, SMBParseResult, SMBResult, SMBToBytes};
use smb_core::error::SMBError;

use crate::byte_helper::{read_u16, read_u32, slice_at, utf16_bytes};
use crate::protocol::body::create::file_id::SMBFileId;
use crate::protocol::header::SMB2_HEADER_LENGTH;

pub mod directory_info;
pub mod flags;
pub mod information_class;

pub use directory_info::FileBothDirectoryInformation;
pub use flags::SMBQueryDirectoryFlags;
pub use information_class::SMBInformationClass;

const QUERY_DIRECTORY_REQUEST_STRUCTURE_SIZE: u16 = 33;
const QUERY_DIRECTORY_REQUEST_FIXED_SIZE: usize = 32;
const QUERY_DIRECTORY_RESPONSE_STRUCTURE_SIZE: u16 = 9;
const QUERY_DIRECTORY_RESPONSE_FIXED_SIZE: usize = 8;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SMBQueryDirectoryRequest {
    pub(crate) information_class: SMBInformationClass,
    pub(crate) flags: SMBQueryDirectoryFlags,
    pub(crate) file_index: u32,
    pub(crate) file_id: SMBFileId,
    pub(crate) max_output_len: u32,
    pub(crate) search_pattern: String,
}

impl SMBQueryDirectoryRequest {
    pub fn new<T: Into<String>>(file_id: SMBFileId, search_pattern: T, flags: SMBQueryDirectoryFlags, max_output_len: u32) -> Self {
        Self {
            information_class: SMBInformationClass::FileBothDirectoryInformation,
            flags,
            file_index: 0,
            file_id,
            max_output_len,
            search_pattern: search_pattern.into(),
        }
    }

    pub fn flags(&self) -> SMBQueryDirectoryFlags {
        self.flags
    }

    pub fn search_pattern(&self) -> &str {
        &self.search_pattern
    }
}

impl SMBByteSize for SMBQueryDirectoryRequest {
    fn smb_byte_size(&self) -> usize {
        QUERY_DIRECTORY_REQUEST_FIXED_SIZE + (self.search_pattern.encode_utf16().count() * 2).max(1)
    }
}

impl SMBToBytes for SMBQueryDirectoryRequest {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let pattern = utf16_bytes(&self.search_pattern);
        let pattern_offset = if pattern.is_empty() { 0 } else { (SMB2_HEADER_LENGTH + QUERY_DIRECTORY_REQUEST_FIXED_SIZE) as u16 };
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(QUERY_DIRECTORY_REQUEST_STRUCTURE_SIZE);
        bytes.extend_from_slice(&self.information_class.smb_to_bytes());
        bytes.extend_from_slice(&self.flags.smb_to_bytes());
        bytes.put_u32_le(self.file_index);
        bytes.extend_from_slice(&self.file_id.smb_to_bytes());
        bytes.put_u16_le(pattern_offset);
        bytes.put_u16_le(pattern.len() as u16);
        bytes.put_u32_le(self.max_output_len);
        if pattern.is_empty() {
            bytes.put_u8(0);
        } else {
            bytes.extend_from_slice(&pattern);
        }
        bytes
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SMBQueryDirectoryResponse {
    pub(crate) buffer: Vec<u8>,
}

impl SMBQueryDirectoryResponse {
    pub fn new(buffer: Vec<u8>) -> Self {
        Self { buffer }
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn entries(&self) -> SMBResult<Vec<FileBothDirectoryInformation>> {
        FileBothDirectoryInformation::parse_chain(&self.buffer)
    }
}

impl SMBByteSize for SMBQueryDirectoryResponse {
    fn smb_byte_size(&self) -> usize {
        QUERY_DIRECTORY_RESPONSE_FIXED_SIZE + self.buffer.len().max(1)
    }
}

impl SMBToBytes for SMBQueryDirectoryResponse {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(QUERY_DIRECTORY_RESPONSE_STRUCTURE_SIZE);
        bytes.put_u16_le((SMB2_HEADER_LENGTH + QUERY_DIRECTORY_RESPONSE_FIXED_SIZE) as u16);
        bytes.put_u32_le(self.buffer.len() as u32);
        if self.buffer.is_empty() {
            bytes.put_u8(0);
        } else {
            bytes.extend_from_slice(&self.buffer);
        }
        bytes
    }
}

impl SMBFromBytes for SMBQueryDirectoryResponse {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        let structure_size = read_u16(input, 0)?;
        if structure_size != QUERY_DIRECTORY_RESPONSE_STRUCTURE_SIZE {
            return Err(SMBError::parse_error(format!("invalid QUERY_DIRECTORY structure size {}", structure_size)));
        }
        let offset = read_u16(input, 2)? as usize;
        let length = read_u32(input, 4)? as usize;
        let buffer = if length == 0 {
            Vec::new()
        } else {
            let start = offset.checked_sub(SMB2_HEADER_LENGTH)
                .ok_or_else(|| SMBError::parse_error("QUERY_DIRECTORY buffer offset inside header"))?;
            slice_at(input, start, length)?.to_vec()
        };
        let consumed = (QUERY_DIRECTORY_RESPONSE_FIXED_SIZE + length.max(1)).min(input.len());
        Ok((&input[consumed..], Self { buffer }))
    }
}
