use bitflags::bitflags;
use bytes::BufMut;
use nom::number::complete::{le_u16, le_u32};
use nom::sequence::tuple;
use serde::{Deserialize, Serialize};

use smb_core::{SMBByteSize, SMBFromBytes, SMBParseResult, SMBResult, SMBToBytes};
use smb_core::error::SMBError;

use crate::byte_helper::{nom_error, string_from_utf16_nul, utf16_bytes_nul};

const REFERRAL_HEADER_SIZE: usize = 8;

/// `REQ_GET_DFS_REFERRAL`: the FSCTL input for a referral lookup.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct DfsReferralRequest {
    max_referral_level: u16,
    request_file_name: String,
}

impl DfsReferralRequest {
    pub fn new<T: Into<String>>(max_referral_level: u16, request_file_name: T) -> Self {
        Self {
            max_referral_level,
            request_file_name: request_file_name.into(),
        }
    }

    pub fn request_file_name(&self) -> &str {
        &self.request_file_name
    }
}

impl SMBByteSize for DfsReferralRequest {
    fn smb_byte_size(&self) -> usize {
        2 + utf16_bytes_nul(&self.request_file_name).len()
    }
}

impl SMBToBytes for DfsReferralRequest {
    fn smb_to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.smb_byte_size());
        bytes.put_u16_le(self.max_referral_level);
        bytes.extend_from_slice(&utf16_bytes_nul(&self.request_file_name));
        bytes
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
    pub struct DfsReferralHeaderFlags: u32 {
        const REFERRAL_SERVERS = 0x01;
        const STORAGE_SERVERS = 0x02;
        const TARGET_FAILBACK = 0x04;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
    pub struct DfsReferralEntryFlags: u16 {
        const NAME_LIST_REFERRAL = 0x02;
        const TARGET_SET_BOUNDARY = 0x04;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DfsServerType {
    Link,
    Root,
}

impl From<u16> for DfsServerType {
    fn from(value: u16) -> Self {
        if value & 0x01 == 0x01 { DfsServerType::Root } else { DfsServerType::Link }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DfsReferralTarget {
    /// A storage target: `dfs_path` is the namespace prefix resolved, `network_address`
    /// the `\server\share[\path]` it maps to.
    Storage {
        dfs_path: String,
        dfs_alternate_path: String,
        network_address: String,
    },
    /// Domain or DC referral: `special_name` is the domain, `expanded_names` its
    /// controllers (or, for a trusted domain listing, empty).
    NameList {
        special_name: String,
        expanded_names: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfsReferralEntry {
    pub version: u16,
    /// Length of the entry's fixed part as the server declared it.
    pub size: u16,
    pub server_type: DfsServerType,
    pub flags: DfsReferralEntryFlags,
    pub ttl: u32,
    pub target: DfsReferralTarget,
}

/// `RESP_GET_DFS_REFERRAL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfsReferralResponse {
    /// Bytes of the UTF-16 request path the referral covers.
    pub path_consumed: u16,
    pub flags: DfsReferralHeaderFlags,
    pub entries: Vec<DfsReferralEntry>,
}

impl DfsReferralResponse {
    /// Path consumed in UTF-16 code units.
    pub fn chars_consumed(&self) -> usize {
        self.path_consumed as usize / 2
    }
}

/// Header plus the declared entry sizes. The string area that trails the
/// entries is not counted; it is what `smb_from_bytes` hands back as remaining.
impl SMBByteSize for DfsReferralResponse {
    fn smb_byte_size(&self) -> usize {
        REFERRAL_HEADER_SIZE + self.entries.iter().map(|entry| entry.size as usize).sum::<usize>()
    }
}

impl SMBFromBytes for DfsReferralResponse {
    fn smb_from_bytes(input: &[u8]) -> SMBParseResult<&[u8], Self> where Self: Sized {
        let (_, (path_consumed, count, flags)) = tuple((le_u16, le_u16, le_u32))(input)
            .map_err(nom_error("DFS referral header"))?;
        let mut entries = Vec::with_capacity(count as usize);
        let mut position = REFERRAL_HEADER_SIZE;
        for _ in 0..count {
            let entry_bytes = input.get(position..)
                .ok_or_else(|| SMBError::payload_too_small(position, input.len()))?;
            let (size, entry) = parse_entry(entry_bytes)?;
            entries.push(entry);
            position += size;
        }
        let response = Self {
            path_consumed,
            flags: DfsReferralHeaderFlags::from_bits_retain(flags),
            entries,
        };
        Ok((&input[position.min(input.len())..], response))
    }
}

/// Offsets inside an entry are relative to the start of that entry, and the
/// strings may live past its fixed part, so `entry` extends to the end of the buffer.
fn parse_entry(entry: &[u8]) -> SMBResult<(usize, DfsReferralEntry)> {
    let (rest, (version, size, server_type, flags)) = tuple((le_u16, le_u16, le_u16, le_u16))(entry)
        .map_err(nom_error("DFS referral entry"))?;
    let flags = DfsReferralEntryFlags::from_bits_retain(flags);
    let server_type = DfsServerType::from(server_type);
    let (ttl, target) = match version {
        1 => {
            let share = string_from_utf16_nul(entry, 8)?;
            (0, DfsReferralTarget::Storage {
                dfs_path: String::new(),
                dfs_alternate_path: String::new(),
                network_address: share,
            })
        }
        2 => {
            let (_, (_proximity, ttl, dfs_path, alt_path, network_address)) = tuple((le_u32, le_u32, le_u16, le_u16, le_u16))(rest)
                .map_err(nom_error("DFS referral v2 entry"))?;
            (ttl, storage_target(entry, dfs_path, alt_path, network_address)?)
        }
        3 | 4 => {
            let (rest, ttl) = le_u32(rest).map_err(nom_error("DFS referral v3 entry"))?;
            let (_, (first, second, third)) = tuple((le_u16, le_u16, le_u16))(rest)
                .map_err(nom_error("DFS referral v3 entry"))?;
            if flags.contains(DfsReferralEntryFlags::NAME_LIST_REFERRAL) {
                let special_name = string_from_utf16_nul(entry, first as usize)?;
                let mut expanded_names = Vec::with_capacity(second as usize);
                let mut offset = third as usize;
                for _ in 0..second {
                    let name = string_from_utf16_nul(entry, offset)?;
                    offset += (name.encode_utf16().count() + 1) * 2;
                    expanded_names.push(name);
                }
                (ttl, DfsReferralTarget::NameList { special_name, expanded_names })
            } else {
                (ttl, storage_target(entry, first, second, third)?)
            }
        }
        _ => return Err(SMBError::parse_error(format!("unsupported DFS referral version {}", version))),
    };
    if size == 0 {
        return Err(SMBError::parse_error("DFS referral entry with zero size"));
    }
    Ok((size as usize, DfsReferralEntry { version, size, server_type, flags, ttl, target }))
}

fn storage_target(entry: &[u8], dfs_path: u16, alt_path: u16, network_address: u16) -> SMBResult<DfsReferralTarget> {
    Ok(DfsReferralTarget::Storage {
        dfs_path: string_from_utf16_nul(entry, dfs_path as usize)?,
        dfs_alternate_path: string_from_utf16_nul(entry, alt_path as usize)?,
        network_address: string_from_utf16_nul(entry, network_address as usize)?,
    })
}

/// Splits a referral network address `\server\share\rest` into its parts.
pub fn split_network_address(address: &str) -> SMBResult<(String, String, String)> {
    let trimmed = address.trim_start_matches('\\');
    let mut parts = trimmed.splitn(3, '\\');
    let server = parts.next().filter(|s| !s.is_empty())
        .ok_or_else(|| SMBError::parse_error(format!("invalid referral address {}", address)))?;
    let share = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default();
    Ok((server.to_string(), share.to_string(), rest.to_string()))
}
