pub mod context;
mod negotiate;
mod security_mode;

pub use context::{CompressionAlgorithm, EncryptionCipher, HashAlgorithm, NegotiateContext, RDMATransformID, SigningAlgorithm};
pub use negotiate::{SMBNegotiateRequest, SMBNegotiateResponse};
pub use security_mode::NegotiateSecurityMode;
