use bytes::BufMut;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use smb_core::{SMBByteSize, SMBFromBytes, SMBParseResult, SMBResult, SMBToBytes, SMBVecFromBytes};
use smb_core::error::SMBError;

use crate::byte_helper::{pad8, read_u16, read_u32, slice_at};
use crate::protocol::body::capabilities::Capabilities;
use crate::protocol::body::dialect::SMBDialect;
use crate::protocol::body::filetime::FileTime;
use crate::protocol::body::negotiate::context::NegotiateContext;
use crate::protocol::body::negotiate::security_mode::NegotiateSecurityMode;
use crate::protocol::header::SMB2_HEADER_LENGTH;

const REQUEST_STRUCTURE_SIZE: u16 = 36;
const RESPONSE_STRUCTURE_SIZE: u16 = 65;
const REQUEST_FIXED_SIZE: usize = 36;
const RESPONSE_FIXED_SIZE: usize = 64;

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct SMBNegotiateRequest {
    pub(crate) security_mode: NegotiateSecurityMode,
    pub(crate) capabilities: Capabilities,
    pub(crate) client_guid: Uuid,
    pub(crate) dialects: Vec<SMBDialect>,
    pub(crate) negotiate_contexts: Vec<NegotiateContext>,
}

impl SMBNegotiateRequest {
    pub fn new(security_mode: NegotiateSecurityMode, capabilities: Capabilities, client_guid: Uuid, dialects: Vec<SMBDialect>, negotiate_contexts: Vec<NegotiateContext>) -> Self {
        Self {
            security_mode,
            capabilities,
            client_guid,
            dialects,
            negotiate_contexts,
        }
    }

    pub fn security_mode(&self) -> NegotiateSecurityMode {
        self.security_mode
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn client_guid(&self) -> Uuid {
        self.client_guid
    }

    pub fn dialects(&self) -> &[SMBDialect] {
        &self.dialects
    }

    pub fn negotiate_contexts(&self) -> &[NegotiateContext] {
        &self.negotiate_contexts
    }

    /// Bytes up to and including the alignment padding after the dialect list.
    fn dialects_end(&self) -> usize {
        let end = REQUEST_FIXED_SIZE + 2 * self.dialects.len();
        end + pad8(SMB2_HEADER_LENGTH + end)
    }
}

impl SMBByteSize for SMBNegotiateRequest {
    fn smb_byte_size(&self) -> usize {
        self.dialects_end() + self.negotiate_contexts.iter()
            .map(NegotiateContext::padded_size)
            .sum::<usize>()
    }
}

impl SMBToBytes for SMBNegotiateRequest {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(REQUEST_STRUCTURE_SIZE);
        bytes.put_u16_le(self.dialects.len() as u16);
        bytes.extend_from_slice(&self.security_mode.smb_to_bytes());
        bytes.put_u16_le(0);
        bytes.extend_from_slice(&self.capabilities.smb_to_bytes());
        bytes.extend_from_slice(self.client_guid.as_bytes());
        // Context offset and count, patched below when contexts follow.
        bytes.put_u64_le(0);
        for dialect in &self.dialects {
            bytes.put_u16_le(*dialect as u16);
        }
        bytes.put_bytes(0, pad8(SMB2_HEADER_LENGTH + bytes.len()));

        if !self.negotiate_contexts.is_empty() {
            let context_offset = (SMB2_HEADER_LENGTH + bytes.len()) as u32;
            bytes[28..32].copy_from_slice(&context_offset.to_le_bytes());
            bytes[32..34].copy_from_slice(&(self.negotiate_contexts.len() as u16).to_le_bytes());
            for context in &self.negotiate_contexts {
                let encoded = context.smb_to_bytes();
                let padding = pad8(encoded.len());
                bytes.extend_from_slice(&encoded);
                bytes.put_bytes(0, padding);
            }
        }
        bytes
    }
}

impl SMBFromBytes for SMBNegotiateRequest {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        check_structure_size(input, REQUEST_STRUCTURE_SIZE)?;
        if input.len() < REQUEST_FIXED_SIZE {
            return Err(SMBError::payload_too_small(REQUEST_FIXED_SIZE, input.len()));
        }
        let dialect_count = read_u16(input, 2)? as usize;
        let (_, security_mode) = NegotiateSecurityMode::smb_from_bytes(&input[4..])?;
        let (_, capabilities) = Capabilities::smb_from_bytes(slice_at(input, 8, 4)?)?;
        let (_, client_guid) = Uuid::smb_from_bytes(slice_at(input, 12, 16)?)?;
        let context_offset = read_u32(input, 28)? as usize;
        let context_count = read_u16(input, 32)? as usize;
        let dialect_bytes = slice_at(input, REQUEST_FIXED_SIZE, 2 * dialect_count)?;
        let (_, dialects) = <Vec<SMBDialect>>::smb_from_bytes_vec(dialect_bytes, dialect_count)?;
        let negotiate_contexts = parse_contexts(input, context_offset, context_count)?;
        let value = Self { security_mode, capabilities, client_guid, dialects, negotiate_contexts };
        let consumed = value.smb_byte_size().min(input.len());
        Ok((&input[consumed..], value))
    }
}

/// Parsed NEGOTIATE response body. The security buffer carries the server's
/// GSS token and is surfaced for the authentication layer untouched.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct SMBNegotiateResponse {
    pub(crate) security_mode: NegotiateSecurityMode,
    pub(crate) dialect: SMBDialect,
    pub(crate) guid: Uuid,
    pub(crate) capabilities: Capabilities,
    pub(crate) max_transact_size: u32,
    pub(crate) max_read_size: u32,
    pub(crate) max_write_size: u32,
    pub(crate) system_time: FileTime,
    pub(crate) server_start_time: FileTime,
    pub(crate) buffer: Vec<u8>,
    pub(crate) negotiate_contexts: Vec<NegotiateContext>,
}

impl SMBNegotiateResponse {
    pub fn security_mode(&self) -> NegotiateSecurityMode {
        self.security_mode
    }

    pub fn dialect(&self) -> SMBDialect {
        self.dialect
    }

    pub fn guid(&self) -> Uuid {
        self.guid
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn max_transact_size(&self) -> u32 {
        self.max_transact_size
    }

    pub fn max_read_size(&self) -> u32 {
        self.max_read_size
    }

    pub fn max_write_size(&self) -> u32 {
        self.max_write_size
    }

    pub fn system_time(&self) -> &FileTime {
        &self.system_time
    }

    pub fn security_buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn negotiate_contexts(&self) -> &[NegotiateContext] {
        &self.negotiate_contexts
    }

    fn buffer_offset(&self) -> usize {
        SMB2_HEADER_LENGTH + RESPONSE_FIXED_SIZE
    }

    fn contexts_offset(&self) -> usize {
        let end = self.buffer_offset() + self.buffer.len();
        end + pad8(end)
    }
}

impl SMBByteSize for SMBNegotiateResponse {
    fn smb_byte_size(&self) -> usize {
        let buffer_end = RESPONSE_FIXED_SIZE + self.buffer.len();
        if self.negotiate_contexts.is_empty() {
            return buffer_end;
        }
        self.contexts_offset() - SMB2_HEADER_LENGTH + self.negotiate_contexts.iter()
            .map(NegotiateContext::padded_size)
            .sum::<usize>()
    }
}

impl SMBToBytes for SMBNegotiateResponse {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(RESPONSE_STRUCTURE_SIZE);
        bytes.extend_from_slice(&self.security_mode.smb_to_bytes());
        bytes.put_u16_le(self.dialect as u16);
        bytes.put_u16_le(self.negotiate_contexts.len() as u16);
        bytes.extend_from_slice(self.guid.as_bytes());
        bytes.extend_from_slice(&self.capabilities.smb_to_bytes());
        bytes.put_u32_le(self.max_transact_size);
        bytes.put_u32_le(self.max_read_size);
        bytes.put_u32_le(self.max_write_size);
        bytes.extend_from_slice(&self.system_time.smb_to_bytes());
        bytes.extend_from_slice(&self.server_start_time.smb_to_bytes());
        bytes.put_u16_le(self.buffer_offset() as u16);
        bytes.put_u16_le(self.buffer.len() as u16);
        let context_offset = if self.negotiate_contexts.is_empty() { 0 } else { self.contexts_offset() as u32 };
        bytes.put_u32_le(context_offset);
        bytes.extend_from_slice(&self.buffer);
        if !self.negotiate_contexts.is_empty() {
            bytes.put_bytes(0, pad8(SMB2_HEADER_LENGTH + bytes.len()));
            for context in &self.negotiate_contexts {
                let encoded = context.smb_to_bytes();
                let padding = pad8(encoded.len());
                bytes.extend_from_slice(&encoded);
                bytes.put_bytes(0, padding);
            }
        }
        bytes
    }
}

impl SMBFromBytes for SMBNegotiateResponse {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        check_structure_size(input, RESPONSE_STRUCTURE_SIZE)?;
        if input.len() < RESPONSE_FIXED_SIZE {
            return Err(SMBError::payload_too_small(RESPONSE_FIXED_SIZE, input.len()));
        }
        let (_, security_mode) = NegotiateSecurityMode::smb_from_bytes(&input[2..])?;
        let (_, dialect) = SMBDialect::smb_from_bytes(&input[4..])?;
        let context_count = read_u16(input, 6)? as usize;
        let (_, guid) = Uuid::smb_from_bytes(&input[8..])?;
        let (_, capabilities) = Capabilities::smb_from_bytes(&input[24..])?;
        let max_transact_size = read_u32(input, 28)?;
        let max_read_size = read_u32(input, 32)?;
        let max_write_size = read_u32(input, 36)?;
        let (_, system_time) = FileTime::smb_from_bytes(&input[40..])?;
        let (_, server_start_time) = FileTime::smb_from_bytes(&input[48..])?;
        let buffer_offset = read_u16(input, 56)? as usize;
        let buffer_len = read_u16(input, 58)? as usize;
        let context_offset = read_u32(input, 60)? as usize;

        let buffer = if buffer_len == 0 {
            Vec::new()
        } else {
            let start = buffer_offset.checked_sub(SMB2_HEADER_LENGTH)
                .ok_or_else(|| SMBError::parse_error("security buffer offset inside header"))?;
            slice_at(input, start, buffer_len)?.to_vec()
        };
        let negotiate_contexts = if dialect == SMBDialect::V3_1_1 {
            parse_contexts(input, context_offset, context_count)?
        } else {
            Vec::new()
        };

        let value = Self {
            security_mode,
            dialect,
            guid,
            capabilities,
            max_transact_size,
            max_read_size,
            max_write_size,
            system_time,
            server_start_time,
            buffer,
            negotiate_contexts,
        };
        let consumed = value.smb_byte_size().min(input.len());
        Ok((&input[consumed..], value))
    }
}

fn check_structure_size(input: &[u8], expected: u16) -> Result<(), SMBError> {
    let found = read_u16(input, 0)?;
    if found != expected {
        return Err(SMBError::parse_error(format!("invalid NEGOTIATE structure size {}, expected {}", found, expected)));
    }
    Ok(())
}

fn parse_contexts(body: &[u8], header_offset: usize, count: usize) -> SMBResult<Vec<NegotiateContext>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let start = header_offset.checked_sub(SMB2_HEADER_LENGTH)
        .ok_or_else(|| SMBError::parse_error("negotiate context offset inside header"))?;
    let contexts = body.get(start..)
        .ok_or_else(|| SMBError::payload_too_small(start, body.len()))?;
    let (_, contexts) = <Vec<NegotiateContext>>::smb_from_bytes_vec(contexts, count)?;
    Ok(contexts)
}
