use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::util::flags_helper::{impl_smb_byte_size_for_bitflag, impl_smb_from_bytes_for_bitflag, impl_smb_to_bytes_for_bitflag};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SMBDirectoryAccessMask: u32 {
        const FILE_LIST_DIRECTORY = 0x00000001;
        const FILE_ADD_FILE = 0x00000002;
        const FILE_ADD_SUBDIRECTORY = 0x00000004;
        const FILE_READ_EA = 0x00000008;
        const FILE_WRITE_EA = 0x00000010;
        const FILE_TRAVERSE = 0x00000020;
        const FILE_DELETE_CHILD = 0x00000040;
        const FILE_READ_ATTRIBUTES = 0x00000080;
        const FILE_WRITE_ATTRIBUTES = 0x00000100;
        const DELETE = 0x00010000;
        const READ_CONTROL = 0x00020000;
        const SYNCHRONIZE = 0x00100000;
        const GENERIC_READ = 0x80000000;
    }
}

impl_smb_byte_size_for_bitflag! { SMBDirectoryAccessMask }
impl_smb_to_bytes_for_bitflag! { SMBDirectoryAccessMask }
impl_smb_from_bytes_for_bitflag! { SMBDirectoryAccessMask }
