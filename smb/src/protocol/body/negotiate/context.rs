use bitflags::bitflags;
use bytes::BufMut;
use num_enum::TryFromPrimitive;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use smb_core::{SMBByteSize, SMBFromBytes, SMBParseResult, SMBToBytes, SMBVecFromBytes};
use smb_core::error::SMBError;
use smb_derive::{SMBByteSize, SMBFromBytes, SMBToBytes};

use crate::byte_helper::{pad8, read_u16, slice_at, string_from_utf16, utf16_bytes};
use crate::util::flags_helper::{impl_smb_byte_size_for_bitflag, impl_smb_from_bytes_for_bitflag, impl_smb_to_bytes_for_bitflag};

const PRE_AUTH_INTEGRITY_CAPABILITIES_TAG: u16 = 0x01;
const ENCRYPTION_CAPABILITIES_TAG: u16 = 0x02;
const COMPRESSION_CAPABILITIES_TAG: u16 = 0x03;
const NETNAME_NEGOTIATE_CONTEXT_ID_TAG: u16 = 0x05;
const TRANSPORT_CAPABILITIES_TAG: u16 = 0x06;
const RDMA_TRANSFORM_CAPABILITIES_TAG: u16 = 0x07;
const SIGNING_CAPABILITIES_TAG: u16 = 0x08;

/// Type tag, data length and four reserved bytes.
pub const CONTEXT_HEADER_SIZE: usize = 8;

const PREAUTH_SALT_SIZE: usize = 32;

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub enum NegotiateContext {
    PreAuthIntegrityCapabilities(PreAuthIntegrityCapabilities),
    EncryptionCapabilities(EncryptionCapabilities),
    CompressionCapabilities(CompressionCapabilities),
    NetnameNegotiateContextID(NetnameNegotiateContextID),
    TransportCapabilities(TransportCapabilities),
    RDMATransformCapabilities(RDMATransformCapabilities),
    SigningCapabilities(SigningCapabilities),
    Unknown { context_type: u16, data: Vec<u8> },
}

impl NegotiateContext {
    pub fn context_type(&self) -> u16 {
        match self {
            NegotiateContext::PreAuthIntegrityCapabilities(_) => PRE_AUTH_INTEGRITY_CAPABILITIES_TAG,
            NegotiateContext::EncryptionCapabilities(_) => ENCRYPTION_CAPABILITIES_TAG,
            NegotiateContext::CompressionCapabilities(_) => COMPRESSION_CAPABILITIES_TAG,
            NegotiateContext::NetnameNegotiateContextID(_) => NETNAME_NEGOTIATE_CONTEXT_ID_TAG,
            NegotiateContext::TransportCapabilities(_) => TRANSPORT_CAPABILITIES_TAG,
            NegotiateContext::RDMATransformCapabilities(_) => RDMA_TRANSFORM_CAPABILITIES_TAG,
            NegotiateContext::SigningCapabilities(_) => SIGNING_CAPABILITIES_TAG,
            NegotiateContext::Unknown { context_type, .. } => *context_type,
        }
    }

    /// Length of the payload alone, as carried in the record's length field.
    pub fn data_len(&self) -> usize {
        match self {
            NegotiateContext::PreAuthIntegrityCapabilities(x) => x.smb_byte_size(),
            NegotiateContext::EncryptionCapabilities(x) => x.smb_byte_size(),
            NegotiateContext::CompressionCapabilities(x) => x.smb_byte_size(),
            NegotiateContext::NetnameNegotiateContextID(x) => x.smb_byte_size(),
            NegotiateContext::TransportCapabilities(x) => x.smb_byte_size(),
            NegotiateContext::RDMATransformCapabilities(x) => x.smb_byte_size(),
            NegotiateContext::SigningCapabilities(x) => x.smb_byte_size(),
            NegotiateContext::Unknown { data, .. } => data.len(),
        }
    }

    fn data_bytes(&self) -> Vec<u8> {
        match self {
            NegotiateContext::PreAuthIntegrityCapabilities(x) => x.smb_to_bytes(),
            NegotiateContext::EncryptionCapabilities(x) => x.smb_to_bytes(),
            NegotiateContext::CompressionCapabilities(x) => x.smb_to_bytes(),
            NegotiateContext::NetnameNegotiateContextID(x) => x.smb_to_bytes(),
            NegotiateContext::TransportCapabilities(x) => x.smb_to_bytes(),
            NegotiateContext::RDMATransformCapabilities(x) => x.smb_to_bytes(),
            NegotiateContext::SigningCapabilities(x) => x.smb_to_bytes(),
            NegotiateContext::Unknown { data, .. } => data.clone(),
        }
    }

    /// Size of the record including its header and the zero padding that follows it.
    pub fn padded_size(&self) -> usize {
        let size = self.smb_byte_size();
        size + pad8(size)
    }
}

impl SMBByteSize for NegotiateContext {
    fn smb_byte_size(&self) -> usize {
        CONTEXT_HEADER_SIZE + self.data_len()
    }
}

impl SMBToBytes for NegotiateContext {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(self.context_type());
        bytes.put_u16_le(0);
        bytes.put_u32_le(0);
        bytes.extend_from_slice(&self.data_bytes());
        let data_len = (bytes.len() - CONTEXT_HEADER_SIZE) as u16;
        bytes[2..4].copy_from_slice(&data_len.to_le_bytes());
        bytes
    }
}

impl SMBFromBytes for NegotiateContext {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        if input.len() < CONTEXT_HEADER_SIZE {
            return Err(SMBError::payload_too_small(CONTEXT_HEADER_SIZE, input.len()));
        }
        let context_type = read_u16(input, 0)?;
        let data_len = read_u16(input, 2)? as usize;
        let data = slice_at(input, CONTEXT_HEADER_SIZE, data_len)?;
        let context = match context_type {
            PRE_AUTH_INTEGRITY_CAPABILITIES_TAG => Self::PreAuthIntegrityCapabilities(PreAuthIntegrityCapabilities::smb_from_bytes(data)?.1),
            ENCRYPTION_CAPABILITIES_TAG => Self::EncryptionCapabilities(EncryptionCapabilities::smb_from_bytes(data)?.1),
            COMPRESSION_CAPABILITIES_TAG => Self::CompressionCapabilities(CompressionCapabilities::smb_from_bytes(data)?.1),
            NETNAME_NEGOTIATE_CONTEXT_ID_TAG => Self::NetnameNegotiateContextID(NetnameNegotiateContextID::smb_from_bytes(data)?.1),
            TRANSPORT_CAPABILITIES_TAG => Self::TransportCapabilities(TransportCapabilities::smb_from_bytes(data)?.1),
            RDMA_TRANSFORM_CAPABILITIES_TAG => Self::RDMATransformCapabilities(RDMATransformCapabilities::smb_from_bytes(data)?.1),
            SIGNING_CAPABILITIES_TAG => Self::SigningCapabilities(SigningCapabilities::smb_from_bytes(data)?.1),
            _ => Self::Unknown { context_type, data: data.to_vec() },
        };
        // The final record of a list may omit its padding.
        let consumed = (CONTEXT_HEADER_SIZE + data_len + pad8(data_len)).min(input.len());
        Ok((&input[consumed..], context))
    }
}

fn parse_counted<T: SMBFromBytes>(input: &[u8], count: usize) -> SMBParseResult<&[u8], Vec<T>> {
    <Vec<T>>::smb_from_bytes_vec(input, count)
}

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone)]
pub struct PreAuthIntegrityCapabilities {
    pub(crate) hash_algorithms: Vec<HashAlgorithm>,
    pub(crate) salt: Vec<u8>,
}

#[repr(u16)]
#[derive(Debug, Eq, PartialEq, TryFromPrimitive, Serialize, Deserialize, Copy, Clone, Ord, PartialOrd, SMBFromBytes, SMBByteSize, SMBToBytes)]
pub enum HashAlgorithm {
    SHA512 = 0x01,
}

impl PreAuthIntegrityCapabilities {
    pub fn sha512_with_random_salt() -> Self {
        let mut salt = vec![0_u8; PREAUTH_SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut salt);
        Self {
            hash_algorithms: vec![HashAlgorithm::SHA512],
            salt,
        }
    }

    pub fn hash_algorithms(&self) -> &[HashAlgorithm] {
        &self.hash_algorithms
    }
}

impl SMBByteSize for PreAuthIntegrityCapabilities {
    fn smb_byte_size(&self) -> usize {
        4 + self.hash_algorithms.smb_byte_size() + self.salt.len()
    }
}

impl SMBToBytes for PreAuthIntegrityCapabilities {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(self.hash_algorithms.len() as u16);
        bytes.put_u16_le(self.salt.len() as u16);
        bytes.extend_from_slice(&self.hash_algorithms.smb_to_bytes());
        bytes.extend_from_slice(&self.salt);
        bytes
    }
}

impl SMBFromBytes for PreAuthIntegrityCapabilities {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        let count = read_u16(input, 0)? as usize;
        let salt_len = read_u16(input, 2)? as usize;
        let (remaining, hash_algorithms) = parse_counted(&input[4..], count)?;
        let salt = slice_at(remaining, 0, salt_len)?.to_vec();
        Ok((&remaining[salt_len..], Self { hash_algorithms, salt }))
    }
}

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone)]
pub struct EncryptionCapabilities {
    pub(crate) ciphers: Vec<EncryptionCipher>,
}

#[repr(u16)]
#[derive(Debug, Eq, PartialEq, TryFromPrimitive, Serialize, Deserialize, Clone, Ord, PartialOrd, Copy, SMBFromBytes, SMBByteSize, SMBToBytes)]
pub enum EncryptionCipher {
    None = 0x0,
    AES128CCM = 0x01,
    AES128GCM = 0x02,
    AES256CCM = 0x03,
    AES256GCM = 0x04,
}

impl EncryptionCapabilities {
    pub fn new(ciphers: Vec<EncryptionCipher>) -> Self {
        Self { ciphers }
    }

    pub fn ciphers(&self) -> &[EncryptionCipher] {
        &self.ciphers
    }
}

impl SMBByteSize for EncryptionCapabilities {
    fn smb_byte_size(&self) -> usize {
        2 + self.ciphers.smb_byte_size()
    }
}

impl SMBToBytes for EncryptionCapabilities {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(self.ciphers.len() as u16);
        bytes.extend_from_slice(&self.ciphers.smb_to_bytes());
        bytes
    }
}

impl SMBFromBytes for EncryptionCapabilities {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        let count = read_u16(input, 0)? as usize;
        let (remaining, ciphers) = parse_counted(&input[2..], count)?;
        Ok((remaining, Self { ciphers }))
    }
}

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone)]
pub struct CompressionCapabilities {
    pub(crate) flags: u32,
    pub(crate) compression_algorithms: Vec<CompressionAlgorithm>,
}

#[repr(u16)]
#[derive(Debug, Eq, PartialEq, TryFromPrimitive, Serialize, Deserialize, Clone, Ord, PartialOrd, Copy, SMBFromBytes, SMBByteSize, SMBToBytes)]
pub enum CompressionAlgorithm {
    None = 0x0,
    LZNT1,
    LZ77,
    LZ77Huffman,
    PatternV1,
    LZ4,
}

impl SMBByteSize for CompressionCapabilities {
    fn smb_byte_size(&self) -> usize {
        8 + self.compression_algorithms.smb_byte_size()
    }
}

impl SMBToBytes for CompressionCapabilities {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(self.compression_algorithms.len() as u16);
        bytes.put_u16_le(0);
        bytes.put_u32_le(self.flags);
        bytes.extend_from_slice(&self.compression_algorithms.smb_to_bytes());
        bytes
    }
}

impl SMBFromBytes for CompressionCapabilities {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        let count = read_u16(input, 0)? as usize;
        let (_, flags) = u32::smb_from_bytes(slice_at(input, 4, 4)?)?;
        let (remaining, compression_algorithms) = parse_counted(&input[8..], count)?;
        Ok((remaining, Self { flags, compression_algorithms }))
    }
}

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone)]
pub struct NetnameNegotiateContextID {
    pub(crate) net_name: String,
}

impl NetnameNegotiateContextID {
    pub fn new<T: Into<String>>(net_name: T) -> Self {
        Self { net_name: net_name.into() }
    }
}

impl SMBByteSize for NetnameNegotiateContextID {
    fn smb_byte_size(&self) -> usize {
        self.net_name.encode_utf16().count() * 2
    }
}

impl SMBToBytes for NetnameNegotiateContextID {
    fn smb_to_bytes(&self) -> Vec<u8> {
        utf16_bytes(&self.net_name)
    }
}

impl SMBFromBytes for NetnameNegotiateContextID {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        let net_name = string_from_utf16(input)?;
        Ok((&input[input.len()..], Self { net_name }))
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
    pub struct TransportCapabilitiesFlags: u32 {
        const ACCEPT_TRANSPORT_LEVEL_SECURITY = 0x01;
    }
}

impl_smb_byte_size_for_bitflag! {TransportCapabilitiesFlags}
impl_smb_from_bytes_for_bitflag! {TransportCapabilitiesFlags}
impl_smb_to_bytes_for_bitflag! {TransportCapabilitiesFlags}

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone, SMBFromBytes, SMBByteSize, SMBToBytes)]
pub struct TransportCapabilities {
    #[smb_direct(start = 0)]
    pub(crate) flags: TransportCapabilitiesFlags,
}

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone)]
pub struct RDMATransformCapabilities {
    pub(crate) transform_ids: Vec<RDMATransformID>,
}

#[repr(u16)]
#[derive(Debug, Eq, PartialEq, TryFromPrimitive, Serialize, Deserialize, Clone, Ord, PartialOrd, Copy, SMBFromBytes, SMBByteSize, SMBToBytes)]
pub enum RDMATransformID {
    None = 0x0,
    Encryption,
    Signing,
}

impl SMBByteSize for RDMATransformCapabilities {
    fn smb_byte_size(&self) -> usize {
        8 + self.transform_ids.smb_byte_size()
    }
}

impl SMBToBytes for RDMATransformCapabilities {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(self.transform_ids.len() as u16);
        bytes.put_u16_le(0);
        bytes.put_u32_le(0);
        bytes.extend_from_slice(&self.transform_ids.smb_to_bytes());
        bytes
    }
}

impl SMBFromBytes for RDMATransformCapabilities {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        let count = read_u16(input, 0)? as usize;
        let (remaining, transform_ids) = parse_counted(slice_at(input, 8, input.len().saturating_sub(8))?, count)?;
        Ok((remaining, Self { transform_ids }))
    }
}

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone)]
pub struct SigningCapabilities {
    pub(crate) signing_algorithms: Vec<SigningAlgorithm>,
}

#[repr(u16)]
#[derive(Debug, Eq, PartialEq, TryFromPrimitive, Serialize, Deserialize, Clone, Ord, PartialOrd, Copy, SMBFromBytes, SMBByteSize, SMBToBytes)]
pub enum SigningAlgorithm {
    HmacSha256 = 0x0,
    AesCmac,
    AesGmac,
}

impl SigningCapabilities {
    pub fn new(signing_algorithms: Vec<SigningAlgorithm>) -> Self {
        Self { signing_algorithms }
    }

    pub fn signing_algorithms(&self) -> &[SigningAlgorithm] {
        &self.signing_algorithms
    }
}

impl SMBByteSize for SigningCapabilities {
    fn smb_byte_size(&self) -> usize {
        2 + self.signing_algorithms.smb_byte_size()
    }
}

impl SMBToBytes for SigningCapabilities {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(self.signing_algorithms.len() as u16);
        bytes.extend_from_slice(&self.signing_algorithms.smb_to_bytes());
        bytes
    }
}

impl SMBFromBytes for SigningCapabilities {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        let count = read_u16(input, 0)? as usize;
        let (remaining, signing_algorithms) = parse_counted(&input[2..], count)?;
        Ok((remaining, Self { signing_algorithms }))
    }
}
