use bytes::BufMut;
use nom::number::complete::le_u16;
use nom::sequence::tuple;
use serde::{Deserialize, Serialize};

use smb_core::error::SMBError;
use smb_core::SMBResult;

use crate::byte_helper::{nom_error, read_u16, read_u32, slice_at, string_from_oem};
use crate::protocol::legacy::{LANMAN_PIPE, SMBTransaction, SMBTransactionResponse};

pub const NET_SHARE_ENUM: u16 = 0;
pub const NET_SERVER_ENUM2: u16 = 104;
pub const NET_SERVER_ENUM3: u16 = 215;

pub const ERROR_SUCCESS: u16 = 0;
pub const ERROR_MORE_DATA: u16 = 234;

pub const SV_TYPE_ALL: u32 = 0xFFFF_FFFF;
pub const SV_TYPE_DOMAIN_ENUM: u32 = 0x8000_0000;

const SHARE_INFO_1_SIZE: usize = 20;
const SHARE_NAME_MAX: usize = 13;
const SERVER_INFO_1_SIZE: usize = 26;
const SERVER_NAME_MAX: usize = 16;

fn rap_parameters(api: u16, param_desc: &str, data_desc: &str) -> Vec<u8> {
    let mut parameters = Vec::new();
    parameters.put_u16_le(api);
    parameters.extend_from_slice(param_desc.as_bytes());
    parameters.put_u8(0);
    parameters.extend_from_slice(data_desc.as_bytes());
    parameters.put_u8(0);
    parameters
}

/// `NetShareEnum` at info level 1.
pub fn net_share_enum(buffer_size: u16) -> SMBTransaction {
    let mut parameters = rap_parameters(NET_SHARE_ENUM, "WrLeh", "B13BWz");
    parameters.put_u16_le(1);
    parameters.put_u16_le(buffer_size);
    SMBTransaction::transaction(LANMAN_PIPE, parameters, buffer_size)
}

/// `NetServerEnum2` at info level 1, listing servers of `server_types` in `domain`.
pub fn net_server_enum2(buffer_size: u16, server_types: u32, domain: &str) -> SMBTransaction {
    let mut parameters = rap_parameters(NET_SERVER_ENUM2, "WrLehDz", "B16BBDz");
    parameters.put_u16_le(1);
    parameters.put_u16_le(buffer_size);
    parameters.put_u32_le(server_types);
    parameters.extend_from_slice(domain.to_uppercase().as_bytes());
    parameters.put_u8(0);
    SMBTransaction::transaction(LANMAN_PIPE, parameters, buffer_size)
}

/// Continuation of a `NetServerEnum2` listing after `last_name`.
pub fn net_server_enum3(buffer_size: u16, server_types: u32, domain: &str, last_name: &str) -> SMBTransaction {
    let mut parameters = rap_parameters(NET_SERVER_ENUM3, "WrLehDzz", "B16BBDz");
    parameters.put_u16_le(1);
    parameters.put_u16_le(buffer_size);
    parameters.put_u32_le(server_types);
    parameters.extend_from_slice(domain.to_uppercase().as_bytes());
    parameters.put_u8(0);
    parameters.extend_from_slice(last_name.as_bytes());
    parameters.put_u8(0);
    SMBTransaction::transaction(LANMAN_PIPE, parameters, buffer_size)
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct RapShareInfo {
    pub name: String,
    pub share_type: u32,
    pub remark: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct RapServerInfo {
    pub name: String,
    pub version_major: u8,
    pub version_minor: u8,
    pub server_type: u32,
    pub comment: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct RapResponse<T> {
    pub status: u16,
    pub available: u16,
    pub entries: Vec<T>,
}

impl<T> RapResponse<T> {
    pub fn is_more_data(&self) -> bool {
        self.status == ERROR_MORE_DATA
    }
}

/// Status, pointer converter and entry counts from the parameter block.
fn parse_rap_parameters(parameters: &[u8]) -> SMBResult<(u16, u16, u16, u16)> {
    let (_, (status, converter, count, available)) = tuple((le_u16, le_u16, le_u16, le_u16))(parameters)
        .map_err(nom_error("RAP response parameters"))?;
    Ok((status, converter, count, available))
}

/// Reads the string a RAP pointer refers to. Pointers are relative to the
/// server's buffer, shifted by `converter`.
fn rap_string(data: &[u8], pointer: u32, converter: u16) -> SMBResult<String> {
    let offset = (pointer & 0xFFFF) as usize;
    match offset.checked_sub(converter as usize) {
        Some(offset) if offset < data.len() => string_from_oem(data, offset, data.len() - offset),
        _ => Ok(String::new()),
    }
}

pub fn parse_net_share_enum(response: &SMBTransactionResponse) -> SMBResult<RapResponse<RapShareInfo>> {
    let (status, converter, count, available) = parse_rap_parameters(&response.parameters)?;
    if status != ERROR_SUCCESS && status != ERROR_MORE_DATA {
        return Ok(RapResponse { status, available, entries: Vec::new() });
    }
    let data = &response.data;
    let mut entries = Vec::with_capacity(count as usize);
    for idx in 0..count as usize {
        let start = idx * SHARE_INFO_1_SIZE;
        let record = slice_at(data, start, SHARE_INFO_1_SIZE)?;
        let name = string_from_oem(record, 0, SHARE_NAME_MAX)?;
        let share_type = read_u16(record, 14)? as u32;
        let remark = rap_string(data, read_u32(record, 16)?, converter)?;
        entries.push(RapShareInfo { name, share_type, remark });
    }
    Ok(RapResponse { status, available, entries })
}

pub fn parse_net_server_enum(response: &SMBTransactionResponse) -> SMBResult<RapResponse<RapServerInfo>> {
    let (status, converter, count, available) = parse_rap_parameters(&response.parameters)?;
    if status != ERROR_SUCCESS && status != ERROR_MORE_DATA {
        return Ok(RapResponse { status, available, entries: Vec::new() });
    }
    let data = &response.data;
    let mut entries = Vec::with_capacity(count as usize);
    for idx in 0..count as usize {
        let start = idx * SERVER_INFO_1_SIZE;
        let record = slice_at(data, start, SERVER_INFO_1_SIZE)?;
        let name = string_from_oem(record, 0, SERVER_NAME_MAX)?;
        let version_major = record[16];
        let version_minor = record[17];
        let server_type = read_u32(record, 18)?;
        let comment = rap_string(data, read_u32(record, 22)?, converter)?;
        entries.push(RapServerInfo { name, version_major, version_minor, server_type, comment });
    }
    Ok(RapResponse { status, available, entries })
}

/// Maps a failing RAP status to the crate error type.
pub fn rap_status_error(status: u16) -> SMBError {
    SMBError::status_error(status as u32)
}
