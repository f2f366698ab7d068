use smb_core::error::SMBError;
use smb_core::SMBResult;

use crate::protocol::body::{SMBRequestBody, SMBResponseBody};
use crate::protocol::body::close::{SMBCloseRequest, SMBCloseResponse};
use crate::protocol::body::create::{SMBCreateRequest, SMBCreateResponse};
use crate::protocol::body::ioctl::{SMBIoCtlRequest, SMBIoCtlResponse};
use crate::protocol::body::negotiate::{SMBNegotiateRequest, SMBNegotiateResponse};
use crate::protocol::body::query_directory::{SMBQueryDirectoryRequest, SMBQueryDirectoryResponse};
use crate::protocol::header::SMBCommandCode;
use crate::protocol::message::{SMBRequestMessage, SMBResponseMessage};

/// An established, authenticated message exchange with one server.
///
/// Implementors stamp the message, session and tree ids and handle signing;
/// callers only build bodies.
pub trait Session {
    fn send_and_receive(&mut self, request: SMBRequestMessage) -> SMBResult<SMBResponseMessage>;
}

/// A request body bound to the only response body it can produce.
pub trait SMBRequest: Sized {
    type Response;
    const COMMAND: SMBCommandCode;

    fn into_body(self) -> SMBRequestBody;
    fn response_from_body(body: SMBResponseBody) -> Option<Self::Response>;
}

pub trait SessionExt: Session {
    /// Sends `request` and returns its typed response. Any status the client
    /// treats as a failure becomes a status error carrying that code.
    fn call<R: SMBRequest>(&mut self, request: R) -> SMBResult<R::Response> {
        let response = self.send_and_receive(SMBRequestMessage::request(request.into_body()))?;
        if !response.is_success() {
            return Err(SMBError::status_error(response.header.status));
        }
        let command = response.header.command;
        R::response_from_body(response.body)
            .ok_or_else(|| SMBError::parse_error(format!("{:?} answered with a {:?} body", R::COMMAND, command)))
    }
}

impl<S: Session + ?Sized> SessionExt for S {}

macro_rules! smb_request {
    ($request: ty => $response: ty, $command: ident, $req_variant: ident, $resp_variant: ident) => {
        impl SMBRequest for $request {
            type Response = $response;
            const COMMAND: SMBCommandCode = SMBCommandCode::$command;

            fn into_body(self) -> SMBRequestBody {
                SMBRequestBody::$req_variant(self)
            }

            fn response_from_body(body: SMBResponseBody) -> Option<Self::Response> {
                match body {
                    SMBResponseBody::$resp_variant(response) => Some(response),
                    _ => None,
                }
            }
        }
    };
}

smb_request!(SMBNegotiateRequest => SMBNegotiateResponse, Negotiate, NegotiateRequest, NegotiateResponse);
smb_request!(SMBCreateRequest => SMBCreateResponse, Create, CreateRequest, CreateResponse);
smb_request!(SMBCloseRequest => SMBCloseResponse, Close, CloseRequest, CloseResponse);
smb_request!(SMBIoCtlRequest => SMBIoCtlResponse, IOCTL, IoCtlRequest, IoCtlResponse);
smb_request!(SMBQueryDirectoryRequest => SMBQueryDirectoryResponse, QueryDirectory, QueryDirectoryRequest, QueryDirectoryResponse);
