use bytes::BufMut;
use serde::{Deserialize, Serialize};

use smb_core::{SMBByteSize, SMBFromBytes, SMBParseResult, SMBToBytes};
use smb_core::error::SMBError;

use crate::protocol::header::{SMBCommandCode, SMBFlags, SMBSender};

/// Every relative offset in an SMB2 body is measured from the start of this header.
pub const SMB2_HEADER_LENGTH: usize = 64;

const PROTOCOL_ID: [u8; 4] = [0xFE, b'S', b'M', b'B'];

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct SMBSyncHeader {
    pub credit_charge: u16,
    /// NT status on responses, channel sequence on requests.
    pub status: u32,
    pub command: SMBCommandCode,
    pub credits: u16,
    pub flags: SMBFlags,
    pub next_command: u32,
    pub message_id: u64,
    pub process_id: u32,
    pub tree_id: u32,
    pub session_id: u64,
    pub signature: [u8; 16],
}

impl SMBSyncHeader {
    pub fn new(command: SMBCommandCode) -> Self {
        Self {
            credit_charge: 1,
            status: 0,
            command,
            credits: 1,
            flags: SMBFlags::empty(),
            next_command: 0,
            message_id: 0,
            process_id: 0xFEFF,
            tree_id: 0,
            session_id: 0,
            signature: [0; 16],
        }
    }

    pub fn response(request: &SMBSyncHeader, status: u32) -> Self {
        Self {
            status,
            flags: request.flags | SMBFlags::SERVER_TO_REDIR,
            ..request.clone()
        }
    }

    pub fn sender(&self) -> SMBSender {
        if self.flags.contains(SMBFlags::SERVER_TO_REDIR) {
            SMBSender::Server
        } else {
            SMBSender::Client
        }
    }

    /// Async responses reuse the process/tree id words as a single 64-bit id.
    pub fn async_id(&self) -> Option<u64> {
        self.flags.contains(SMBFlags::ASYNC_COMMAND)
            .then(|| ((self.tree_id as u64) << 32) | self.process_id as u64)
    }
}

impl SMBByteSize for SMBSyncHeader {
    fn smb_byte_size(&self) -> usize {
        SMB2_HEADER_LENGTH
    }
}

impl SMBToBytes for SMBSyncHeader {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SMB2_HEADER_LENGTH);
        buf.put_slice(&PROTOCOL_ID);
        buf.put_u16_le(SMB2_HEADER_LENGTH as u16);
        buf.put_u16_le(self.credit_charge);
        buf.put_u32_le(self.status);
        buf.put_u16_le(self.command as u16);
        buf.put_u16_le(self.credits);
        buf.put_u32_le(self.flags.bits());
        buf.put_u32_le(self.next_command);
        buf.put_u64_le(self.message_id);
        buf.put_u32_le(self.process_id);
        buf.put_u32_le(self.tree_id);
        buf.put_u64_le(self.session_id);
        buf.put_slice(&self.signature);
        buf
    }
}

impl SMBFromBytes for SMBSyncHeader {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        if input.len() < SMB2_HEADER_LENGTH {
            return Err(SMBError::payload_too_small(SMB2_HEADER_LENGTH, input.len()));
        }
        if input[0..4] != PROTOCOL_ID {
            return Err(SMBError::parse_error("missing SMB2 protocol id"));
        }
        let (_, structure_size) = u16::smb_from_bytes(&input[4..])?;
        if structure_size as usize != SMB2_HEADER_LENGTH {
            return Err(SMBError::parse_error(format!("invalid SMB2 header size {}", structure_size)));
        }
        let (_, credit_charge) = u16::smb_from_bytes(&input[6..])?;
        let (_, status) = u32::smb_from_bytes(&input[8..])?;
        let (_, command) = SMBCommandCode::smb_from_bytes(&input[12..])?;
        let (_, credits) = u16::smb_from_bytes(&input[14..])?;
        let (_, flags) = SMBFlags::smb_from_bytes(&input[16..])?;
        let (_, next_command) = u32::smb_from_bytes(&input[20..])?;
        let (_, message_id) = u64::smb_from_bytes(&input[24..])?;
        let (_, process_id) = u32::smb_from_bytes(&input[32..])?;
        let (_, tree_id) = u32::smb_from_bytes(&input[36..])?;
        let (_, session_id) = u64::smb_from_bytes(&input[40..])?;
        let (_, signature) = <[u8; 16]>::smb_from_bytes(&input[48..])?;
        Ok((&input[SMB2_HEADER_LENGTH..], Self {
            credit_charge,
            status,
            command,
            credits,
            flags,
            next_command,
            message_id,
            process_id,
            tree_id,
            session_id,
            signature,
        }))
    }
}
