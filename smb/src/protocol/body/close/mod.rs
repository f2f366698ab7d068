use serde::{Deserialize, Serialize};

use smb_derive::{SMBByteSize, SMBFromBytes, SMBToBytes};

use crate::protocol::body::close::flags::SMBCloseFlags;
use crate::protocol::body::create::file_attributes::SMBFileAttributes;
use crate::protocol::body::create::file_id::SMBFileId;
use crate::protocol::body::filetime::FileTime;

pub mod flags;

#[derive(Debug, PartialEq, Eq, Clone, SMBByteSize, SMBToBytes, SMBFromBytes, Serialize, Deserialize)]
#[smb_byte_tag(value = 24)]
pub struct SMBCloseRequest {
    #[smb_direct(start = 2)]
    flags: SMBCloseFlags,
    #[smb_direct(start = 8)]
    file_id: SMBFileId,
}

impl SMBCloseRequest {
    pub fn new(file_id: SMBFileId) -> Self {
        Self {
            flags: SMBCloseFlags::empty(),
            file_id,
        }
    }

    pub fn file_id(&self) -> SMBFileId {
        self.file_id
    }
}

#[derive(Debug, PartialEq, Eq, Clone, SMBByteSize, SMBToBytes, SMBFromBytes, Serialize, Deserialize)]
#[smb_byte_tag(value = 60)]
pub struct SMBCloseResponse {
    #[smb_direct(start = 2)]
    flags: SMBCloseFlags,
    #[smb_direct(start = 8)]
    creation_time: FileTime,
    #[smb_direct(start = 16)]
    last_access_time: FileTime,
    #[smb_direct(start = 24)]
    last_write_time: FileTime,
    #[smb_direct(start = 32)]
    change_time: FileTime,
    #[smb_direct(start = 40)]
    allocation_size: u64,
    #[smb_direct(start = 48)]
    end_of_file: u64,
    #[smb_direct(start = 56)]
    attributes: SMBFileAttributes,
}
