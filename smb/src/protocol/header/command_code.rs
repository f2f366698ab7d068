use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use smb_derive::{SMBByteSize, SMBFromBytes, SMBToBytes};

#[repr(u16)]
#[derive(Debug, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize, Clone, Copy, SMBFromBytes, SMBByteSize, SMBToBytes)]
pub enum SMBCommandCode {
    Negotiate = 0x0,
    SessionSetup,
    LogOff,
    TreeConnect,
    TreeDisconnect,
    Create,
    Close,
    Flush,
    Read,
    Write,
    Lock,
    IOCTL,
    Cancel,
    Echo,
    QueryDirectory,
    ChangeNotify,
    QueryInfo,
    SetInfo,
    OplockBreak,
}

/// SMB1 commands a legacy tree handle carries for enumeration.
#[repr(u8)]
#[derive(Debug, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize, Clone, Copy, SMBFromBytes, SMBByteSize, SMBToBytes)]
pub enum LegacySMBCommandCode {
    Transaction = 0x25,
    Transaction2 = 0x32,
    FindClose2 = 0x34,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// MS-SMB2 2.2.1: command codes used by the client core.
    #[test]
    fn command_codes_match_wire_values() {
        assert_eq!(SMBCommandCode::Negotiate as u16, 0x0000);
        assert_eq!(SMBCommandCode::TreeConnect as u16, 0x0003);
        assert_eq!(SMBCommandCode::Create as u16, 0x0005);
        assert_eq!(SMBCommandCode::Close as u16, 0x0006);
        assert_eq!(SMBCommandCode::IOCTL as u16, 0x000B);
        assert_eq!(SMBCommandCode::QueryDirectory as u16, 0x000E);
        assert_eq!(SMBCommandCode::OplockBreak as u16, 0x0012);
    }

    #[test]
    fn legacy_codes_match_wire_values() {
        assert_eq!(u8::from(LegacySMBCommandCode::Transaction), 0x25);
        assert_eq!(u8::from(LegacySMBCommandCode::Transaction2), 0x32);
        assert_eq!(LegacySMBCommandCode::try_from(0x34u8).unwrap(), LegacySMBCommandCode::FindClose2);
    }
}
