use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

use num_enum::TryFromPrimitive;

use crate::nt_status::NTStatus;

#[derive(Debug)]
pub enum SMBError {
    ParseError(SMBParseError),
    PayloadTooSmall(SMBPayloadTooSmallError),
    TransportError(SMBTransportError),
    StatusError(SMBStatusError),
    RequestError(SMBRequestError),
    LocatedError(SMBLocatedError),
}

impl SMBError {
    pub fn parse_error<T: Into<SMBParseError>>(error: T) -> Self {
        Self::ParseError(error.into())
    }

    pub fn payload_too_small<T: Into<usize>, U: Into<usize>>(expected: T, actual: U) -> Self {
        Self::PayloadTooSmall((expected, actual).into())
    }

    pub fn transport_error<T: Into<SMBTransportError>>(error: T) -> Self {
        Self::TransportError(error.into())
    }

    pub fn status_error<T: Into<SMBStatusError>>(status: T) -> Self {
        Self::StatusError(status.into())
    }

    pub fn request_error<T: Into<SMBRequestError>>(error: T) -> Self {
        Self::RequestError(error.into())
    }

    /// Attaches the resource the failing operation was working on.
    pub fn at_locator<T: Into<String>>(self, locator: T) -> Self {
        match self {
            located @ Self::LocatedError(_) => located,
            error => Self::LocatedError(SMBLocatedError {
                locator: locator.into(),
                source: Box::new(error),
            }),
        }
    }

    /// The status code carried by a protocol status failure, looking through locator context.
    pub fn status_code(&self) -> Option<u32> {
        match self {
            Self::StatusError(x) => Some(x.status),
            Self::LocatedError(x) => x.source.status_code(),
            _ => None,
        }
    }

    pub fn is_status(&self, status: NTStatus) -> bool {
        self.status_code() == Some(status as u32)
    }

    pub fn is_transport(&self) -> bool {
        match self {
            Self::TransportError(_) => true,
            Self::LocatedError(x) => x.source.is_transport(),
            _ => false,
        }
    }

    pub fn is_request(&self) -> bool {
        match self {
            Self::RequestError(_) => true,
            Self::LocatedError(x) => x.source.is_request(),
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct SMBParseError {
    error: Box<dyn Error + Send + Sync>,
}

impl<T: Into<Box<dyn Error + Send + Sync>>> From<T> for SMBParseError {
    fn from(value: T) -> Self {
        Self {
            error: value.into()
        }
    }
}

impl Display for SMBParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse failed with error: {}", self.error)
    }
}

#[derive(Debug)]
pub struct SMBPayloadTooSmallError {
    expected: usize,
    actual: usize,
}

impl<T: Into<usize>, U: Into<usize>> From<(T, U)> for SMBPayloadTooSmallError {
    fn from(value: (T, U)) -> Self {
        Self {
            expected: value.0.into(),
            actual: value.1.into(),
        }
    }
}

impl Display for SMBPayloadTooSmallError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Expected {} bytes, was actually {} bytes", self.expected, self.actual)
    }
}

#[derive(Debug)]
pub enum SMBTransportError {
    IO(io::Error),
    Message(String),
}

impl From<io::Error> for SMBTransportError {
    fn from(value: io::Error) -> Self {
        Self::IO(value)
    }
}

impl From<String> for SMBTransportError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for SMBTransportError {
    fn from(value: &str) -> Self {
        Self::Message(value.into())
    }
}

impl Display for SMBTransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IO(x) => write!(f, "SMB transport failed with error: {}", x),
            Self::Message(x) => write!(f, "SMB transport failed: {}", x),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SMBStatusError {
    status: u32,
}

impl SMBStatusError {
    pub fn status(&self) -> u32 {
        self.status
    }
}

impl From<u32> for SMBStatusError {
    fn from(value: u32) -> Self {
        Self { status: value }
    }
}

impl From<NTStatus> for SMBStatusError {
    fn from(value: NTStatus) -> Self {
        Self { status: value as u32 }
    }
}

impl Display for SMBStatusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match NTStatus::try_from_primitive(self.status) {
            Ok(status) => write!(f, "Server responded with status {:?} (0x{:08X})", status, self.status),
            Err(_) => write!(f, "Server responded with status 0x{:08X}", self.status),
        }
    }
}

#[derive(Debug)]
pub struct SMBRequestError {
    message: String,
}

impl<T: Into<String>> From<T> for SMBRequestError {
    fn from(value: T) -> Self {
        Self {
            message: value.into()
        }
    }
}

impl Display for SMBRequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid request: {}", self.message)
    }
}

#[derive(Debug)]
pub struct SMBLocatedError {
    locator: String,
    source: Box<SMBError>,
}

impl SMBLocatedError {
    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn source_error(&self) -> &SMBError {
        &self.source
    }
}

impl Display for SMBLocatedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.source, self.locator)
    }
}

impl Display for SMBError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseError(x) => write!(f, "{}", x),
            Self::PayloadTooSmall(x) => write!(f, "{}", x),
            Self::TransportError(x) => write!(f, "{}", x),
            Self::StatusError(x) => write!(f, "{}", x),
            Self::RequestError(x) => write!(f, "{}", x),
            Self::LocatedError(x) => write!(f, "{}", x),
        }
    }
}

impl std::error::Error for SMBError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LocatedError(x) => Some(x.source.as_ref()),
            Self::TransportError(SMBTransportError::IO(x)) => Some(x),
            _ => None,
        }
    }
}
