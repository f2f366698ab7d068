use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use smb_derive::{SMBByteSize, SMBFromBytes, SMBToBytes};

/// Control codes this client issues.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive, IntoPrimitive, SMBByteSize, SMBFromBytes, SMBToBytes)]
pub enum SMBIoCtlCode {
    DfsGetReferrals = 0x00060194,
    PipeTransceive = 0x0011C017,
    DfsGetReferralsEx = 0x000601B0,
}
