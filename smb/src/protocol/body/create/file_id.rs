use serde::{Deserialize, Serialize};

use smb_derive::{SMBByteSize, SMBFromBytes, SMBToBytes};

#[derive(Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Clone, Copy, SMBFromBytes, SMBByteSize, SMBToBytes)]
pub struct SMBFileId {
    #[smb_direct(start = 0)]
    pub persistent: u64,
    #[smb_direct(start = 8)]
    pub volatile: u64,
}

impl SMBFileId {
    /// Placeholder id for requests that are not bound to an open, such as FSCTLs on IPC$.
    pub const ANY: SMBFileId = SMBFileId { persistent: u64::MAX, volatile: u64::MAX };
}
