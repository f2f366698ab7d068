//! DCE/RPC calls the enumeration code makes over named pipes.
//!
//! Binding and PDU framing are the pipe handle's job; messages here only
//! marshal their NDR request stub and unmarshal the response stub.

use smb_core::SMBResult;

pub mod ndr;
pub mod netdfs;
pub mod srvsvc;

pub const SRVSVC_PIPE: &str = "\\PIPE\\srvsvc";
pub const NETDFS_PIPE: &str = "\\PIPE\\netdfs";

/// A bound RPC pipe. Dropping the handle releases the pipe.
pub trait DcerpcHandle {
    fn send_and_receive(&mut self, opnum: u16, stub: &[u8]) -> SMBResult<Vec<u8>>;
}

pub trait DcerpcMessage {
    fn opnum(&self) -> u16;
    fn encode_stub(&self) -> Vec<u8>;
    fn decode_stub(&mut self, stub: &[u8]) -> SMBResult<()>;
    /// Status the server returned; 0 is success.
    fn retval(&self) -> u32;
}

/// Sends `message` and decodes the reply into it.
pub fn call<H: DcerpcHandle + ?Sized, M: DcerpcMessage>(handle: &mut H, message: &mut M) -> SMBResult<()> {
    let stub = message.encode_stub();
    let response = handle.send_and_receive(message.opnum(), &stub)?;
    message.decode_stub(&response)
}
