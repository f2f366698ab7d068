use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use smb_core::SMBResult;

use crate::protocol::body::{SMBDialect, SMBDialectSet};
use crate::protocol::body::negotiate::{EncryptionCipher, NegotiateSecurityMode, SigningAlgorithm};

/// Read-only client settings shared by negotiation, DFS and enumeration.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq, Eq)]
#[builder(name = "SMBClientConfigBuilder", pattern = "owned", default)]
pub struct SMBClientConfig {
    dfs_disabled: bool,
    dfs_ttl: Duration,
    /// Surface failures while discovering trusted domains instead of treating
    /// them as "no domains".
    dfs_strict_view: bool,
    min_dialect: SMBDialect,
    max_dialect: SMBDialect,
    signing_enabled: bool,
    signing_required: bool,
    encryption_enabled: bool,
    encryption_ciphers: Vec<EncryptionCipher>,
    signing_algorithms: Vec<SigningAlgorithm>,
    list_count: u16,
    list_size: u32,
    transaction_buffer_size: u16,
    max_referral_level: u16,
}

impl Default for SMBClientConfig {
    fn default() -> Self {
        Self {
            dfs_disabled: false,
            dfs_ttl: Duration::from_secs(300),
            dfs_strict_view: false,
            min_dialect: SMBDialect::V2_0_2,
            max_dialect: SMBDialect::V3_1_1,
            signing_enabled: true,
            signing_required: false,
            encryption_enabled: true,
            encryption_ciphers: vec![EncryptionCipher::AES128GCM, EncryptionCipher::AES128CCM],
            signing_algorithms: vec![SigningAlgorithm::AesGmac, SigningAlgorithm::AesCmac, SigningAlgorithm::HmacSha256],
            list_count: 200,
            list_size: 65535,
            transaction_buffer_size: 0xFFFF - 512,
            max_referral_level: 4,
        }
    }
}

impl SMBClientConfig {
    pub fn builder() -> SMBClientConfigBuilder {
        SMBClientConfigBuilder::default()
    }

    pub fn is_dfs_disabled(&self) -> bool {
        self.dfs_disabled
    }

    pub fn dfs_ttl(&self) -> Duration {
        self.dfs_ttl
    }

    pub fn is_dfs_strict_view(&self) -> bool {
        self.dfs_strict_view
    }

    pub fn dialects(&self) -> SMBResult<SMBDialectSet> {
        SMBDialectSet::range(self.min_dialect, self.max_dialect)
    }

    pub fn security_mode(&self) -> NegotiateSecurityMode {
        NegotiateSecurityMode::for_signing(self.signing_enabled, self.signing_required)
    }

    pub fn is_signing_required(&self) -> bool {
        self.signing_required
    }

    pub fn is_encryption_enabled(&self) -> bool {
        self.encryption_enabled
    }

    pub fn encryption_ciphers(&self) -> &[EncryptionCipher] {
        &self.encryption_ciphers
    }

    pub fn signing_algorithms(&self) -> &[SigningAlgorithm] {
        &self.signing_algorithms
    }

    pub fn list_count(&self) -> u16 {
        self.list_count
    }

    pub fn list_size(&self) -> u32 {
        self.list_size
    }

    pub fn transaction_buffer_size(&self) -> u16 {
        self.transaction_buffer_size
    }

    pub fn max_referral_level(&self) -> u16 {
        self.max_referral_level
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    user: String,
    domain: String,
}

impl Credentials {
    pub fn new<T: Into<String>, U: Into<String>>(user: T, domain: U) -> Self {
        Self {
            user: user.into(),
            domain: domain.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}
