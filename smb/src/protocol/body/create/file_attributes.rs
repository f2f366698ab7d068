use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::util::flags_helper::{impl_smb_byte_size_for_bitflag, impl_smb_from_bytes_for_bitflag, impl_smb_to_bytes_for_bitflag};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
    pub struct SMBFileAttributes: u32 {
        const READONLY = 0x00000001;
        const HIDDEN = 0x00000002;
        const SYSTEM = 0x00000004;
        const VOLUME = 0x00000008;
        const DIRECTORY = 0x00000010;
        const ARCHIVE = 0x00000020;
        const NORMAL = 0x00000080;
        const TEMPORARY = 0x00000100;
        const SPARSE_FILE = 0x00000200;
        const REPARSE_POINT= 0x00000400;
        const COMPRESSED = 0x00000800;
        const OFFLINE = 0x00001000;
        const NOT_CONTENT_INDEXED = 0x00002000;
        const ENCRYPTED = 0x00004000;
    }
}

impl SMBFileAttributes {
    /// Attributes a DOS search only reports when explicitly asked for.
    pub const SEARCH_EXCLUSIVE: SMBFileAttributes = SMBFileAttributes::HIDDEN
        .union(SMBFileAttributes::SYSTEM)
        .union(SMBFileAttributes::DIRECTORY);

    /// Inclusive DOS search rule: normal files always match, hidden, system
    /// and directory entries only when their bit is part of `mask`.
    pub fn matches_search(&self, mask: SMBFileAttributes) -> bool {
        (*self & Self::SEARCH_EXCLUSIVE).difference(mask).is_empty()
    }
}

impl_smb_byte_size_for_bitflag! { SMBFileAttributes }
impl_smb_to_bytes_for_bitflag! { SMBFileAttributes }
impl_smb_from_bytes_for_bitflag! { SMBFileAttributes }
