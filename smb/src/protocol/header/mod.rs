mod command_code;
mod flags;
mod header;

pub use command_code::{LegacySMBCommandCode, SMBCommandCode};
pub use flags::SMBFlags;
pub use header::{SMB2_HEADER_LENGTH, SMBSyncHeader};

pub enum SMBSender {
    Client,
    Server,
}
