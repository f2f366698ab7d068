use bytes::BufMut;
use serde::{Deserialize, Serialize};

use smb_core::{SMBByteSize, SMBToBytes};
use smb_derive::{SMBByteSize, SMBFromBytes, SMBToBytes};

use crate::byte_helper::{utf16_bytes, utf16_len};
use crate::protocol::body::create::access_mask::SMBDirectoryAccessMask;
use crate::protocol::body::create::disposition::SMBCreateDisposition;
use crate::protocol::body::create::file_attributes::SMBFileAttributes;
use crate::protocol::body::create::file_id::SMBFileId;
use crate::protocol::body::create::options::SMBCreateOptions;
use crate::protocol::body::create::share_access::SMBShareAccess;
use crate::protocol::body::filetime::FileTime;
use crate::protocol::header::SMB2_HEADER_LENGTH;

pub mod access_mask;
pub mod disposition;
pub mod file_attributes;
pub mod file_id;
pub mod options;
pub mod share_access;

const CREATE_REQUEST_STRUCTURE_SIZE: u16 = 57;
const CREATE_REQUEST_FIXED_SIZE: usize = 56;
const IMPERSONATION_LEVEL_IMPERSONATION: u32 = 2;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SMBCreateRequest {
    pub(crate) desired_access: SMBDirectoryAccessMask,
    pub(crate) attributes: SMBFileAttributes,
    pub(crate) share_access: SMBShareAccess,
    pub(crate) create_disposition: SMBCreateDisposition,
    pub(crate) create_options: SMBCreateOptions,
    pub(crate) file_name: String,
}

impl SMBCreateRequest {
    /// Opens an existing directory for listing. `path` is share-relative with
    /// backslash separators and no leading separator.
    pub fn open_directory<T: Into<String>>(path: T) -> Self {
        Self {
            desired_access: SMBDirectoryAccessMask::FILE_LIST_DIRECTORY | SMBDirectoryAccessMask::FILE_READ_ATTRIBUTES | SMBDirectoryAccessMask::SYNCHRONIZE,
            attributes: SMBFileAttributes::empty(),
            share_access: SMBShareAccess::READ | SMBShareAccess::WRITE | SMBShareAccess::DELETE,
            create_disposition: SMBCreateDisposition::Open,
            create_options: SMBCreateOptions::DIRECTORY_FILE,
            file_name: path.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl SMBByteSize for SMBCreateRequest {
    fn smb_byte_size(&self) -> usize {
        // An empty name still occupies one byte of the buffer.
        CREATE_REQUEST_FIXED_SIZE + (utf16_len(&self.file_name) * 2).max(1)
    }
}

impl SMBToBytes for SMBCreateRequest {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let name = utf16_bytes(&self.file_name);
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(CREATE_REQUEST_STRUCTURE_SIZE);
        bytes.put_u8(0);
        bytes.put_u8(0);
        bytes.put_u32_le(IMPERSONATION_LEVEL_IMPERSONATION);
        bytes.put_u64_le(0);
        bytes.put_u64_le(0);
        bytes.extend_from_slice(&self.desired_access.smb_to_bytes());
        bytes.extend_from_slice(&self.attributes.smb_to_bytes());
        bytes.extend_from_slice(&self.share_access.smb_to_bytes());
        bytes.extend_from_slice(&self.create_disposition.smb_to_bytes());
        bytes.extend_from_slice(&self.create_options.smb_to_bytes());
        bytes.put_u16_le((SMB2_HEADER_LENGTH + CREATE_REQUEST_FIXED_SIZE) as u16);
        bytes.put_u16_le(name.len() as u16);
        bytes.put_u32_le(0);
        bytes.put_u32_le(0);
        if name.is_empty() {
            bytes.put_u8(0);
        } else {
            bytes.extend_from_slice(&name);
        }
        bytes
    }
}

#[derive(Debug, PartialEq, Eq, Clone, SMBByteSize, SMBToBytes, SMBFromBytes, Serialize, Deserialize)]
#[smb_byte_tag(value = 89)]
pub struct SMBCreateResponse {
    #[smb_direct(start = 2)]
    oplock_level: u8,
    #[smb_direct(start = 4)]
    action: u32,
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
    #[smb_direct(start = 64)]
    file_id: SMBFileId,
    #[smb_direct(start = 80)]
    contexts_offset: u32,
    #[smb_direct(start = 84)]
    contexts_length: u32,
}

impl SMBCreateResponse {
    pub fn file_id(&self) -> SMBFileId {
        self.file_id
    }

    pub fn attributes(&self) -> SMBFileAttributes {
        self.attributes
    }
}
