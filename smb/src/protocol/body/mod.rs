use serde::{Deserialize, Serialize};

use smb_core::{SMBByteSize, SMBFromBytes, SMBParseResult, SMBToBytes};
use smb_core::error::SMBError;

use crate::protocol::body::close::{SMBCloseRequest, SMBCloseResponse};
use crate::protocol::body::create::{SMBCreateRequest, SMBCreateResponse};
use crate::protocol::body::error::SMBErrorResponse;
use crate::protocol::body::ioctl::{SMBIoCtlRequest, SMBIoCtlResponse};
use crate::protocol::body::negotiate::{SMBNegotiateRequest, SMBNegotiateResponse};
use crate::protocol::body::query_directory::{SMBQueryDirectoryRequest, SMBQueryDirectoryResponse};
use crate::protocol::header::SMBCommandCode;

pub mod capabilities;
pub mod close;
pub mod create;
pub mod dialect;
pub mod error;
pub mod filetime;
pub mod ioctl;
pub mod negotiate;
pub mod query_directory;

pub use capabilities::Capabilities;
pub use dialect::{SMBDialect, SMBDialectSet};
pub use filetime::FileTime;

/// Shared by request and response bodies: the command a body belongs to and its encoding.
pub trait Body: SMBByteSize {
    fn command_code(&self) -> SMBCommandCode;
    fn as_bytes(&self) -> Vec<u8>;
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub enum SMBRequestBody {
    NegotiateRequest(SMBNegotiateRequest),
    CreateRequest(SMBCreateRequest),
    CloseRequest(SMBCloseRequest),
    IoCtlRequest(SMBIoCtlRequest),
    QueryDirectoryRequest(SMBQueryDirectoryRequest),
}

impl SMBByteSize for SMBRequestBody {
    fn smb_byte_size(&self) -> usize {
        match self {
            SMBRequestBody::NegotiateRequest(x) => x.smb_byte_size(),
            SMBRequestBody::CreateRequest(x) => x.smb_byte_size(),
            SMBRequestBody::CloseRequest(x) => x.smb_byte_size(),
            SMBRequestBody::IoCtlRequest(x) => x.smb_byte_size(),
            SMBRequestBody::QueryDirectoryRequest(x) => x.smb_byte_size(),
        }
    }
}

impl Body for SMBRequestBody {
    fn command_code(&self) -> SMBCommandCode {
        match self {
            SMBRequestBody::NegotiateRequest(_) => SMBCommandCode::Negotiate,
            SMBRequestBody::CreateRequest(_) => SMBCommandCode::Create,
            SMBRequestBody::CloseRequest(_) => SMBCommandCode::Close,
            SMBRequestBody::IoCtlRequest(_) => SMBCommandCode::IOCTL,
            SMBRequestBody::QueryDirectoryRequest(_) => SMBCommandCode::QueryDirectory,
        }
    }

    fn as_bytes(&self) -> Vec<u8> {
        match self {
            SMBRequestBody::NegotiateRequest(x) => x.smb_to_bytes(),
            SMBRequestBody::CreateRequest(x) => x.smb_to_bytes(),
            SMBRequestBody::CloseRequest(x) => x.smb_to_bytes(),
            SMBRequestBody::IoCtlRequest(x) => x.smb_to_bytes(),
            SMBRequestBody::QueryDirectoryRequest(x) => x.smb_to_bytes(),
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub enum SMBResponseBody {
    NegotiateResponse(SMBNegotiateResponse),
    CreateResponse(SMBCreateResponse),
    CloseResponse(SMBCloseResponse),
    IoCtlResponse(SMBIoCtlResponse),
    QueryDirectoryResponse(SMBQueryDirectoryResponse),
    ErrorResponse(SMBCommandCode, SMBErrorResponse),
}

impl SMBResponseBody {
    /// Picks the body type from the header's command. A failing status whose
    /// body is the 9-byte error structure parses as `ErrorResponse`; some
    /// warnings (buffer overflow on IOCTL) still carry a full body.
    pub fn parse_with_cc(bytes: &[u8], command_code: SMBCommandCode, status: u32) -> SMBParseResult<&[u8], Self> {
        if status != 0 && SMBErrorResponse::is_error_body(bytes) {
            let (remaining, body) = SMBErrorResponse::smb_from_bytes(bytes)?;
            return Ok((remaining, SMBResponseBody::ErrorResponse(command_code, body)));
        }
        match command_code {
            SMBCommandCode::Negotiate => {
                let (remaining, body) = SMBNegotiateResponse::smb_from_bytes(bytes)?;
                Ok((remaining, SMBResponseBody::NegotiateResponse(body)))
            }
            SMBCommandCode::Create => {
                let (remaining, body) = SMBCreateResponse::smb_from_bytes(bytes)?;
                Ok((remaining, SMBResponseBody::CreateResponse(body)))
            }
            SMBCommandCode::Close => {
                let (remaining, body) = SMBCloseResponse::smb_from_bytes(bytes)?;
                Ok((remaining, SMBResponseBody::CloseResponse(body)))
            }
            SMBCommandCode::IOCTL => {
                let (remaining, body) = SMBIoCtlResponse::smb_from_bytes(bytes)?;
                Ok((remaining, SMBResponseBody::IoCtlResponse(body)))
            }
            SMBCommandCode::QueryDirectory => {
                let (remaining, body) = SMBQueryDirectoryResponse::smb_from_bytes(bytes)?;
                Ok((remaining, SMBResponseBody::QueryDirectoryResponse(body)))
            }
            other => Err(SMBError::parse_error(format!("unsupported response command {:?}", other))),
        }
    }
}

impl SMBByteSize for SMBResponseBody {
    fn smb_byte_size(&self) -> usize {
        match self {
            SMBResponseBody::NegotiateResponse(x) => x.smb_byte_size(),
            SMBResponseBody::CreateResponse(x) => x.smb_byte_size(),
            SMBResponseBody::CloseResponse(x) => x.smb_byte_size(),
            SMBResponseBody::IoCtlResponse(x) => x.smb_byte_size(),
            SMBResponseBody::QueryDirectoryResponse(x) => x.smb_byte_size(),
            SMBResponseBody::ErrorResponse(_, x) => x.smb_byte_size(),
        }
    }
}

impl Body for SMBResponseBody {
    fn command_code(&self) -> SMBCommandCode {
        match self {
            SMBResponseBody::NegotiateResponse(_) => SMBCommandCode::Negotiate,
            SMBResponseBody::CreateResponse(_) => SMBCommandCode::Create,
            SMBResponseBody::CloseResponse(_) => SMBCommandCode::Close,
            SMBResponseBody::IoCtlResponse(_) => SMBCommandCode::IOCTL,
            SMBResponseBody::QueryDirectoryResponse(_) => SMBCommandCode::QueryDirectory,
            SMBResponseBody::ErrorResponse(command, _) => *command,
        }
    }

    fn as_bytes(&self) -> Vec<u8> {
        match self {
            SMBResponseBody::NegotiateResponse(x) => x.smb_to_bytes(),
            SMBResponseBody::CreateResponse(x) => x.smb_to_bytes(),
            SMBResponseBody::CloseResponse(x) => x.smb_to_bytes(),
            SMBResponseBody::IoCtlResponse(x) => x.smb_to_bytes(),
            SMBResponseBody::QueryDirectoryResponse(x) => x.smb_to_bytes(),
            SMBResponseBody::ErrorResponse(_, x) => x.smb_to_bytes(),
        }
    }
}
