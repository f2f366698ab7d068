use std::io::Cursor;

use bytes::BufMut;
use smb_client::client::{NegotiationEngine, SMBClientConfig};
use smb_client::protocol::body::error::SMBErrorResponse;
use smb_client::protocol::body::negotiate::SMBNegotiateResponse;
use smb_client::protocol::body::{SMBDialect, SMBResponseBody};
use smb_client::protocol::header::{SMBCommandCode, SMBSyncHeader, SMB2_HEADER_LENGTH};
use smb_client::protocol::message::SMBMessage;
use smb_client::socket::SMBSocketConnection;
use smb_core::SMBFromBytes;
use uuid::Uuid;

const SERVER_GUID: [u8; 16] = [9; 16];

/// An SMB 3.0.2 NEGOTIATE response body with DFS capability and no security buffer.
fn smb302_response_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.put_u16_le(65);
    body.put_u16_le(0x0001);
    body.put_u16_le(0x0302);
    body.put_u16_le(0);
    body.extend_from_slice(&SERVER_GUID);
    body.put_u32_le(0x0000_0001);
    body.put_u32_le(0x0080_0000);
    body.put_u32_le(0x0010_0000);
    body.put_u32_le(0x0020_0000);
    body.put_u64_le(0);
    body.put_u64_le(0);
    body.put_u16_le(SMB2_HEADER_LENGTH as u16 + 64);
    body.put_u16_le(0);
    body.put_u32_le(0);
    body
}

fn framed_response(status: u32) -> Vec<u8> {
    let (_, response) = SMBNegotiateResponse::smb_from_bytes(&smb302_response_body()).unwrap();
    let header = SMBSyncHeader::response(&SMBSyncHeader::new(SMBCommandCode::Negotiate), status);
    SMBMessage::new(header, SMBResponseBody::NegotiateResponse(response))
        .as_framed_bytes()
        .unwrap()
}

#[test]
fn negotiates_over_a_framed_stream() {
    let config = SMBClientConfig::builder().max_dialect(SMBDialect::V3_0_2).build().unwrap();
    let engine = NegotiationEngine::with_client_guid(&config, Uuid::from_bytes([3; 16]));
    let mut connection = SMBSocketConnection::new("fixture".into(), Cursor::new(framed_response(0)), Vec::new());

    let state = engine.negotiate(&mut connection).unwrap();

    assert_eq!(state.dialect, SMBDialect::V3_0_2);
    assert_eq!(state.server_guid, Uuid::from_bytes(SERVER_GUID));
    assert!(state.is_dfs_capable());
    assert!(!state.signing_required);
    assert_eq!(state.max_read_size, 0x0010_0000);
    assert!(state.cipher.is_none());

    let (_, written) = connection.into_streams();
    let length = u32::from_be_bytes([0, written[1], written[2], written[3]]) as usize;
    assert_eq!(written.len(), length + 4);
    let request = &written[4..];
    assert_eq!(&request[0..4], b"\xFESMB");
    assert_eq!(&request[12..14], &[0, 0]);
    let body = &request[SMB2_HEADER_LENGTH..];
    assert_eq!(&body[0..2], &36u16.to_le_bytes());
    assert_eq!(&body[2..4], &4u16.to_le_bytes());
    assert_eq!(&body[12..28], &[3; 16]);
    // No 3.1.1 offered, so no negotiate contexts.
    assert_eq!(&body[28..34], &[0; 6]);
}

#[test]
fn failing_status_is_a_status_error() {
    let config = SMBClientConfig::builder().max_dialect(SMBDialect::V3_0_2).build().unwrap();
    let engine = NegotiationEngine::new(&config);
    let input = {
        let header = SMBSyncHeader::response(&SMBSyncHeader::new(SMBCommandCode::Negotiate), 0xC000_0022);
        SMBMessage::new(header, SMBResponseBody::ErrorResponse(SMBCommandCode::Negotiate, SMBErrorResponse::new()))
            .as_framed_bytes()
            .unwrap()
    };
    let mut connection = SMBSocketConnection::new("fixture".into(), Cursor::new(input), Vec::new());

    let error = engine.negotiate(&mut connection).unwrap_err();

    assert_eq!(error.status_code(), Some(0xC000_0022));
}

#[test]
fn closed_stream_is_a_transport_error() {
    let config = SMBClientConfig::default();
    let engine = NegotiationEngine::new(&config);
    let mut connection = SMBSocketConnection::new("fixture".into(), Cursor::new(Vec::new()), Vec::new());

    let error = engine.negotiate(&mut connection).unwrap_err();

    assert!(error.is_transport());
}
