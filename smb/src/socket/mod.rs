//! Blocking SMB2 transport over direct TCP framing.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use smb_core::error::SMBError;
use smb_core::logging::trace;
use smb_core::nt_status::NTStatus;
use smb_core::SMBResult;

use crate::client::session::Session;
use crate::protocol::message::{SMBRequestMessage, SMBResponseMessage, MAX_FRAME_LENGTH};

pub trait SMBReadStream {
    /// Reads one direct-TCP frame and returns its payload.
    fn read_frame(&mut self) -> SMBResult<Vec<u8>>;
}

pub trait SMBWriteStream {
    fn write_message(&mut self, message: &SMBRequestMessage) -> SMBResult<usize>;
}

impl<Reader> SMBReadStream for Reader where Reader: Read {
    fn read_frame(&mut self) -> SMBResult<Vec<u8>> {
        let mut header = [0_u8; 4];
        self.read_exact(&mut header).map_err(SMBError::transport_error)?;
        if header[0] != 0 {
            return Err(SMBError::transport_error(format!("unexpected session message type {:#x}", header[0])));
        }
        let length = u32::from_be_bytes([0, header[1], header[2], header[3]]) as usize;
        if length > MAX_FRAME_LENGTH {
            return Err(SMBError::transport_error(format!("frame of {} bytes exceeds limit", length)));
        }
        let mut payload = vec![0_u8; length];
        self.read_exact(&mut payload).map_err(SMBError::transport_error)?;
        Ok(payload)
    }
}

impl<Writer> SMBWriteStream for Writer where Writer: Write {
    fn write_message(&mut self, message: &SMBRequestMessage) -> SMBResult<usize> {
        let bytes = message.as_framed_bytes()?;
        self.write_all(&bytes).map_err(SMBError::transport_error)?;
        self.flush().map_err(SMBError::transport_error)?;
        Ok(bytes.len())
    }
}

/// A connection to one server that stamps message, session and tree ids on
/// outgoing requests and pairs each with its final response.
#[derive(Debug)]
pub struct SMBSocketConnection<R: SMBReadStream, W: SMBWriteStream> {
    name: String,
    read_stream: R,
    write_stream: W,
    next_message_id: u64,
    session_id: u64,
    tree_id: u32,
}

impl SMBSocketConnection<TcpStream, TcpStream> {
    pub fn connect<A: ToSocketAddrs>(address: A) -> SMBResult<Self> {
        let stream = TcpStream::connect(address).map_err(SMBError::transport_error)?;
        let name = stream.peer_addr().map(|addr| addr.to_string()).unwrap_or_default();
        let write_stream = stream.try_clone().map_err(SMBError::transport_error)?;
        Ok(Self::new(name, stream, write_stream))
    }
}

impl<R: SMBReadStream, W: SMBWriteStream> SMBSocketConnection<R, W> {
    pub fn new(name: String, read_stream: R, write_stream: W) -> Self {
        Self {
            name,
            read_stream,
            write_stream,
            next_message_id: 0,
            session_id: 0,
            tree_id: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_session_id(&mut self, session_id: u64) {
        self.session_id = session_id;
    }

    pub fn set_tree_id(&mut self, tree_id: u32) {
        self.tree_id = tree_id;
    }

    pub fn into_streams(self) -> (R, W) {
        (self.read_stream, self.write_stream)
    }

    fn receive(&mut self, message_id: u64) -> SMBResult<SMBResponseMessage> {
        loop {
            let frame = self.read_stream.read_frame()?;
            let (_, response) = SMBResponseMessage::parse(&frame)?;
            if response.header.message_id != message_id {
                return Err(SMBError::transport_error(format!(
                    "response for message {} while waiting for {}", response.header.message_id, message_id
                )));
            }
            if response.header.status == NTStatus::StatusPending as u32 {
                trace!("message {} pending", message_id);
                continue;
            }
            return Ok(response);
        }
    }
}

impl<R: SMBReadStream, W: SMBWriteStream> Session for SMBSocketConnection<R, W> {
    fn send_and_receive(&mut self, mut request: SMBRequestMessage) -> SMBResult<SMBResponseMessage> {
        let message_id = self.next_message_id;
        self.next_message_id += 1;
        request.header.message_id = message_id;
        request.header.session_id = self.session_id;
        request.header.tree_id = self.tree_id;
        let written = self.write_stream.write_message(&request)?;
        trace!("{}: sent {:?} ({} bytes) as message {}", self.name, request.header.command, written, message_id);
        self.receive(message_id)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::client::session::SessionExt;
    use crate::protocol::body::close::SMBCloseRequest;
    use crate::protocol::body::create::file_id::SMBFileId;
    use crate::protocol::body::error::SMBErrorResponse;
    use crate::protocol::body::SMBResponseBody;
    use crate::protocol::header::{SMBCommandCode, SMBSyncHeader};
    use crate::protocol::message::SMBMessage;
    use crate::test_support::close_response;

    use super::*;

    fn framed(message_id: u64, status: NTStatus, body: SMBResponseBody) -> Vec<u8> {
        let mut header = SMBSyncHeader::new(SMBCommandCode::Close);
        header.message_id = message_id;
        let header = SMBSyncHeader::response(&header, status as u32);
        SMBMessage::new(header, body).as_framed_bytes().unwrap()
    }

    #[test]
    fn stamps_ids_and_skips_interim_responses() {
        let mut input = framed(0, NTStatus::StatusPending, SMBResponseBody::ErrorResponse(SMBCommandCode::Close, SMBErrorResponse::new()));
        input.extend(framed(0, NTStatus::StatusSuccess, SMBResponseBody::CloseResponse(close_response())));
        let mut connection = SMBSocketConnection::new("test".into(), Cursor::new(input), Vec::new());
        connection.set_session_id(0x44);
        connection.set_tree_id(5);

        let response = connection.call(SMBCloseRequest::new(SMBFileId::ANY)).unwrap();
        assert_eq!(response, close_response());

        let (_, written) = connection.into_streams();
        assert_eq!(written[0], 0);
        let sent = &written[4..];
        assert_eq!(&sent[0..4], b"\xFESMB");
        assert_eq!(&sent[24..32], &0u64.to_le_bytes());
        assert_eq!(&sent[36..40], &5u32.to_le_bytes());
        assert_eq!(&sent[40..48], &0x44u64.to_le_bytes());
    }

    #[test]
    fn mismatched_message_id_is_a_transport_error() {
        let input = framed(9, NTStatus::StatusSuccess, SMBResponseBody::CloseResponse(close_response()));
        let mut connection = SMBSocketConnection::new("test".into(), Cursor::new(input), Vec::new());
        let error = connection.call(SMBCloseRequest::new(SMBFileId::ANY)).unwrap_err();
        assert!(error.is_transport());
    }

    #[test]
    fn truncated_stream_is_a_transport_error() {
        let mut connection = SMBSocketConnection::new("test".into(), Cursor::new(vec![0, 0, 0, 80, 0xFE]), Vec::new());
        let error = connection.call(SMBCloseRequest::new(SMBFileId::ANY)).unwrap_err();
        assert!(error.is_transport());
    }
}
