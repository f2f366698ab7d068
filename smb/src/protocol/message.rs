use serde::{Deserialize, Serialize};

use smb_core::{SMBFromBytes, SMBParseResult, SMBResult, SMBToBytes};
use smb_core::error::SMBError;
use smb_core::nt_status::NTStatus;

use crate::protocol::body::{Body, SMBRequestBody, SMBResponseBody};
use crate::protocol::header::{SMB2_HEADER_LENGTH, SMBSyncHeader};

pub type SMBRequestMessage = SMBMessage<SMBRequestBody>;
pub type SMBResponseMessage = SMBMessage<SMBResponseBody>;

/// Largest payload a direct-TCP session frame can carry (24-bit length).
pub const MAX_FRAME_LENGTH: usize = 0x00FF_FFFF;

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct SMBMessage<B: Body> {
    pub header: SMBSyncHeader,
    pub body: B,
}

impl<B: Body> SMBMessage<B> {
    pub fn new(header: SMBSyncHeader, body: B) -> Self {
        SMBMessage {
            header,
            body,
        }
    }

    /// Exact number of bytes `encode` writes, padding included.
    pub fn size(&self) -> usize {
        SMB2_HEADER_LENGTH + self.body.smb_byte_size()
    }

    /// Writes header then body into `buffer` at `offset`. Body offsets are
    /// relative to the header start, which is `offset`, not the buffer start.
    pub fn encode(&self, buffer: &mut [u8], offset: usize) -> SMBResult<usize> {
        let size = self.size();
        let available = buffer.len().saturating_sub(offset);
        if available < size {
            return Err(SMBError::payload_too_small(size, available));
        }
        let header = self.header.smb_to_bytes();
        let body = self.body.as_bytes();
        buffer[offset..offset + header.len()].copy_from_slice(&header);
        let body_start = offset + header.len();
        buffer[body_start..body_start + body.len()].copy_from_slice(&body);
        Ok(header.len() + body.len())
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        [self.header.smb_to_bytes(), self.body.as_bytes()].concat()
    }

    /// Message prefixed with the direct-TCP transport header: a zero byte and
    /// a 24-bit big-endian length.
    pub fn as_framed_bytes(&self) -> SMBResult<Vec<u8>> {
        let message = self.as_bytes();
        if message.len() > MAX_FRAME_LENGTH {
            return Err(SMBError::request_error(format!("message of {} bytes exceeds frame limit", message.len())));
        }
        let len = (message.len() as u32).to_be_bytes();
        Ok([&[0, len[1], len[2], len[3]], message.as_slice()].concat())
    }
}

impl SMBRequestMessage {
    pub fn request(body: SMBRequestBody) -> Self {
        let header = SMBSyncHeader::new(body.command_code());
        Self::new(header, body)
    }
}

impl SMBResponseMessage {
    pub fn parse(bytes: &[u8]) -> SMBParseResult<&[u8], Self> {
        let (remaining, header) = SMBSyncHeader::smb_from_bytes(bytes)?;
        let (remaining, body) = SMBResponseBody::parse_with_cc(remaining, header.command, header.status)?;
        Ok((remaining, Self { header, body }))
    }

    pub fn status(&self) -> NTStatus {
        NTStatus::from_code(self.header.status)
    }

    /// Success and the informational statuses a client treats as data-bearing.
    pub fn is_success(&self) -> bool {
        !NTStatus::is_error_code(self.header.status) && !matches!(self.body, SMBResponseBody::ErrorResponse(..))
    }
}
