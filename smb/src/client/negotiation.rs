use serde::{Deserialize, Serialize};
use uuid::Uuid;

use smb_core::error::SMBError;
use smb_core::logging::debug;
use smb_core::SMBResult;

use crate::client::config::SMBClientConfig;
use crate::client::session::{Session, SessionExt};
use crate::protocol::body::{Capabilities, SMBDialect, SMBDialectSet};
use crate::protocol::body::negotiate::{EncryptionCipher, HashAlgorithm, NegotiateContext, NegotiateSecurityMode, SigningAlgorithm, SMBNegotiateRequest, SMBNegotiateResponse};
use crate::protocol::body::negotiate::context::{EncryptionCapabilities, PreAuthIntegrityCapabilities, SigningCapabilities};

/// Builds the NEGOTIATE request for a client and validates the server's answer.
#[derive(Debug, Clone)]
pub struct NegotiationEngine<'a> {
    config: &'a SMBClientConfig,
    client_guid: Uuid,
}

/// What both sides agreed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiatedState {
    pub dialect: SMBDialect,
    pub server_security_mode: NegotiateSecurityMode,
    pub signing_required: bool,
    pub server_guid: Uuid,
    pub server_capabilities: Capabilities,
    pub max_transact_size: u32,
    pub max_read_size: u32,
    pub max_write_size: u32,
    pub cipher: Option<EncryptionCipher>,
    pub signing_algorithm: Option<SigningAlgorithm>,
    pub preauth_hash: Option<HashAlgorithm>,
}

impl NegotiatedState {
    pub fn is_dfs_capable(&self) -> bool {
        self.server_capabilities.contains(Capabilities::DFS)
    }
}

impl<'a> NegotiationEngine<'a> {
    pub fn new(config: &'a SMBClientConfig) -> Self {
        Self::with_client_guid(config, Uuid::new_v4())
    }

    pub fn with_client_guid(config: &'a SMBClientConfig, client_guid: Uuid) -> Self {
        Self { config, client_guid }
    }

    pub fn client_guid(&self) -> Uuid {
        self.client_guid
    }

    pub fn build_request(&self) -> SMBResult<SMBNegotiateRequest> {
        let dialects = self.config.dialects()?;
        let offers_smb3 = dialects.as_slice().iter().any(SMBDialect::is_smb3);
        let capabilities = Capabilities::for_client(
            !self.config.is_dfs_disabled(),
            self.config.is_encryption_enabled() && offers_smb3,
        );
        let contexts = self.negotiate_contexts(&dialects);
        Ok(SMBNegotiateRequest::new(
            self.config.security_mode(),
            capabilities,
            self.client_guid,
            dialects.into(),
            contexts,
        ))
    }

    fn negotiate_contexts(&self, dialects: &SMBDialectSet) -> Vec<NegotiateContext> {
        if !dialects.contains(SMBDialect::V3_1_1) {
            return Vec::new();
        }
        let mut contexts = vec![NegotiateContext::PreAuthIntegrityCapabilities(PreAuthIntegrityCapabilities::sha512_with_random_salt())];
        if self.config.is_encryption_enabled() && !self.config.encryption_ciphers().is_empty() {
            contexts.push(NegotiateContext::EncryptionCapabilities(EncryptionCapabilities::new(self.config.encryption_ciphers().to_vec())));
        }
        if !self.config.signing_algorithms().is_empty() {
            contexts.push(NegotiateContext::SigningCapabilities(SigningCapabilities::new(self.config.signing_algorithms().to_vec())));
        }
        contexts
    }

    /// Sends the request over `session`. Transport failures and failing
    /// statuses propagate unchanged.
    pub fn negotiate<S: Session + ?Sized>(&self, session: &mut S) -> SMBResult<NegotiatedState> {
        let request = self.build_request()?;
        let response = session.call(request.clone())?;
        self.process_response(&request, &response)
    }

    pub fn process_response(&self, request: &SMBNegotiateRequest, response: &SMBNegotiateResponse) -> SMBResult<NegotiatedState> {
        let dialect = response.dialect();
        if !request.dialects().contains(&dialect) {
            return Err(SMBError::parse_error(format!("server selected dialect {:?} that was not offered", dialect)));
        }

        let mut cipher = None;
        let mut signing_algorithm = None;
        let mut preauth_hash = None;
        for context in response.negotiate_contexts() {
            match context {
                NegotiateContext::PreAuthIntegrityCapabilities(preauth) => {
                    preauth_hash = preauth.hash_algorithms().first().copied();
                }
                NegotiateContext::EncryptionCapabilities(encryption) => {
                    cipher = encryption.ciphers().first().copied()
                        .filter(|selected| *selected != EncryptionCipher::None);
                }
                NegotiateContext::SigningCapabilities(signing) => {
                    signing_algorithm = signing.signing_algorithms().first().copied();
                }
                other => debug!("ignoring negotiate context type {}", other.context_type()),
            }
        }

        if dialect == SMBDialect::V3_1_1 && preauth_hash.is_none() {
            return Err(SMBError::parse_error("SMB 3.1.1 response without pre-auth integrity context"));
        }
        if let Some(selected) = cipher {
            if !self.config.encryption_ciphers().contains(&selected) {
                return Err(SMBError::parse_error(format!("server selected cipher {:?} that was not offered", selected)));
            }
        }

        let server_security_mode = response.security_mode();
        let signing_required = self.config.is_signing_required()
            || server_security_mode.contains(NegotiateSecurityMode::NEGOTIATE_SIGNING_REQUIRED);
        debug!("negotiated dialect {:?}, signing required {}", dialect, signing_required);

        Ok(NegotiatedState {
            dialect,
            server_security_mode,
            signing_required,
            server_guid: response.guid(),
            server_capabilities: response.capabilities(),
            max_transact_size: response.max_transact_size(),
            max_read_size: response.max_read_size(),
            max_write_size: response.max_write_size(),
            cipher,
            signing_algorithm,
            preauth_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use smb_core::error::SMBError;
    use smb_core::nt_status::NTStatus;

    use crate::protocol::body::{FileTime, SMBResponseBody};
    use crate::protocol::body::error::SMBErrorResponse;
    use crate::protocol::header::{SMBCommandCode, SMBSyncHeader};
    use crate::protocol::message::{SMBMessage, SMBRequestMessage, SMBResponseMessage};

    use super::*;

    fn response(dialect: SMBDialect, negotiate_contexts: Vec<NegotiateContext>) -> SMBNegotiateResponse {
        SMBNegotiateResponse {
            security_mode: NegotiateSecurityMode::NEGOTIATE_SIGNING_ENABLED,
            dialect,
            guid: Uuid::from_bytes([9; 16]),
            capabilities: Capabilities::DFS | Capabilities::LARGE_MTU,
            max_transact_size: 0x0080_0000,
            max_read_size: 0x0080_0000,
            max_write_size: 0x0080_0000,
            system_time: FileTime::from_unix(1_700_000_000),
            server_start_time: FileTime::default(),
            buffer: Vec::new(),
            negotiate_contexts,
        }
    }

    fn smb311_contexts() -> Vec<NegotiateContext> {
        vec![
            NegotiateContext::PreAuthIntegrityCapabilities(PreAuthIntegrityCapabilities::sha512_with_random_salt()),
            NegotiateContext::EncryptionCapabilities(EncryptionCapabilities::new(vec![EncryptionCipher::AES128GCM])),
            NegotiateContext::SigningCapabilities(SigningCapabilities::new(vec![SigningAlgorithm::AesGmac])),
        ]
    }

    /// Answers every request with a fixed negotiate response and records what was sent.
    struct Responder {
        status: u32,
        response: SMBResponseBody,
        sent: Vec<SMBRequestMessage>,
    }

    impl Session for Responder {
        fn send_and_receive(&mut self, request: SMBRequestMessage) -> SMBResult<SMBResponseMessage> {
            let header = SMBSyncHeader::response(&request.header, self.status);
            self.sent.push(request);
            Ok(SMBMessage::new(header, self.response.clone()))
        }
    }

    #[test]
    fn dfs_capability_follows_configuration() {
        let enabled = SMBClientConfig::default();
        let disabled = SMBClientConfig::builder().dfs_disabled(true).build().unwrap();
        let with_dfs = NegotiationEngine::new(&enabled).build_request().unwrap();
        let without_dfs = NegotiationEngine::new(&disabled).build_request().unwrap();
        assert!(with_dfs.capabilities().contains(Capabilities::DFS));
        assert!(!without_dfs.capabilities().contains(Capabilities::DFS));
    }

    #[test]
    fn contexts_only_when_smb311_is_offered() {
        let config = SMBClientConfig::builder().max_dialect(SMBDialect::V3_0_2).build().unwrap();
        let request = NegotiationEngine::new(&config).build_request().unwrap();
        assert!(request.negotiate_contexts().is_empty());
        assert_eq!(request.dialects().len(), 4);

        let config = SMBClientConfig::default();
        let request = NegotiationEngine::new(&config).build_request().unwrap();
        let types = request.negotiate_contexts().iter().map(NegotiateContext::context_type).collect::<Vec<_>>();
        assert_eq!(types, vec![1, 2, 8]);
    }

    #[test]
    fn client_guid_is_sent_verbatim() {
        let config = SMBClientConfig::default();
        let guid = Uuid::from_bytes([3; 16]);
        let request = NegotiationEngine::with_client_guid(&config, guid).build_request().unwrap();
        assert_eq!(request.client_guid(), guid);
    }

    #[test]
    fn negotiates_smb311_state() {
        let config = SMBClientConfig::default();
        let engine = NegotiationEngine::new(&config);
        let mut session = Responder {
            status: 0,
            response: SMBResponseBody::NegotiateResponse(response(SMBDialect::V3_1_1, smb311_contexts())),
            sent: Vec::new(),
        };
        let state = engine.negotiate(&mut session).unwrap();
        assert_eq!(state.dialect, SMBDialect::V3_1_1);
        assert_eq!(state.cipher, Some(EncryptionCipher::AES128GCM));
        assert_eq!(state.signing_algorithm, Some(SigningAlgorithm::AesGmac));
        assert_eq!(state.preauth_hash, Some(HashAlgorithm::SHA512));
        assert!(state.is_dfs_capable());
        assert!(!state.signing_required);
        assert_eq!(session.sent.len(), 1);
        assert_eq!(session.sent[0].header.command, SMBCommandCode::Negotiate);
    }

    #[test]
    fn rejects_dialect_that_was_not_offered() {
        let config = SMBClientConfig::builder().max_dialect(SMBDialect::V2_1_0).build().unwrap();
        let engine = NegotiationEngine::new(&config);
        let request = engine.build_request().unwrap();
        assert!(engine.process_response(&request, &response(SMBDialect::V3_0_0, Vec::new())).is_err());
    }

    #[test]
    fn smb311_requires_preauth_context() {
        let config = SMBClientConfig::default();
        let engine = NegotiationEngine::new(&config);
        let request = engine.build_request().unwrap();
        assert!(engine.process_response(&request, &response(SMBDialect::V3_1_1, Vec::new())).is_err());
    }

    #[test]
    fn server_signing_requirement_is_honoured() {
        let config = SMBClientConfig::default();
        let engine = NegotiationEngine::new(&config);
        let request = engine.build_request().unwrap();
        let mut response = response(SMBDialect::V2_1_0, Vec::new());
        response.security_mode = NegotiateSecurityMode::NEGOTIATE_SIGNING_ENABLED | NegotiateSecurityMode::NEGOTIATE_SIGNING_REQUIRED;
        assert!(engine.process_response(&request, &response).unwrap().signing_required);
    }

    #[test]
    fn error_status_surfaces_as_status_error() {
        let config = SMBClientConfig::default();
        let mut session = Responder {
            status: NTStatus::StatusNotSupported as u32,
            response: SMBResponseBody::ErrorResponse(SMBCommandCode::Negotiate, SMBErrorResponse::new()),
            sent: Vec::new(),
        };
        let error = NegotiationEngine::new(&config).negotiate(&mut session).unwrap_err();
        assert_eq!(error.status_code(), Some(NTStatus::StatusNotSupported as u32));
    }

    struct Broken;

    impl Session for Broken {
        fn send_and_receive(&mut self, _request: SMBRequestMessage) -> SMBResult<SMBResponseMessage> {
            Err(SMBError::transport_error("unreachable"))
        }
    }

    #[test]
    fn transport_error_propagates() {
        let config = SMBClientConfig::default();
        let error = NegotiationEngine::new(&config).negotiate(&mut Broken).unwrap_err();
        assert!(error.is_transport());
    }
}
