use bytes::BufMut;
use nom::number::complete::le_u16;
use nom::sequence::tuple;

use smb_core::{SMBResult, SMBToBytes};

use crate::byte_helper::{nom_error, utf16_bytes_nul};
use crate::protocol::body::create::file_attributes::SMBFileAttributes;
use crate::protocol::body::ioctl::dfs_referral::DfsReferralRequest;
use crate::protocol::body::query_directory::FileBothDirectoryInformation;
use crate::protocol::legacy::{SMBTransaction, SMBTransactionResponse};

pub const TRANS2_FIND_FIRST2: u16 = 0x0001;
pub const TRANS2_FIND_NEXT2: u16 = 0x0002;
pub const TRANS2_GET_DFS_REFERRAL: u16 = 0x0010;

pub const SMB_FIND_FILE_BOTH_DIRECTORY_INFO: u16 = 0x0104;

const FLAGS_CLOSE_IF_END_REACHED: u16 = 0x0002;
const FLAGS_RETURN_RESUME_KEYS: u16 = 0x0004;
const FLAGS_CONTINUE_FROM_LAST: u16 = 0x0008;

/// `TRANS2_FIND_FIRST2` for `pattern` (a full `\dir\wildcard` path).
pub fn find_first2(pattern: &str, search_attributes: SMBFileAttributes, search_count: u16, max_data_count: u16) -> SMBTransaction {
    let mut parameters = Vec::new();
    parameters.put_u16_le(search_attributes.bits() as u16);
    parameters.put_u16_le(search_count);
    parameters.put_u16_le(FLAGS_CLOSE_IF_END_REACHED | FLAGS_RETURN_RESUME_KEYS);
    parameters.put_u16_le(SMB_FIND_FILE_BOTH_DIRECTORY_INFO);
    parameters.put_u32_le(0);
    parameters.extend_from_slice(&utf16_bytes_nul(pattern));
    SMBTransaction::transaction2(TRANS2_FIND_FIRST2, parameters, max_data_count)
}

/// `TRANS2_FIND_NEXT2` resuming search `sid` after `last_name`.
pub fn find_next2(sid: u16, resume_key: u32, last_name: &str, search_count: u16, max_data_count: u16) -> SMBTransaction {
    let mut parameters = Vec::new();
    parameters.put_u16_le(sid);
    parameters.put_u16_le(search_count);
    parameters.put_u16_le(SMB_FIND_FILE_BOTH_DIRECTORY_INFO);
    parameters.put_u32_le(resume_key);
    parameters.put_u16_le(FLAGS_CLOSE_IF_END_REACHED | FLAGS_RETURN_RESUME_KEYS | FLAGS_CONTINUE_FROM_LAST);
    parameters.extend_from_slice(&utf16_bytes_nul(last_name));
    SMBTransaction::transaction2(TRANS2_FIND_NEXT2, parameters, max_data_count)
}

/// `TRANS2_GET_DFS_REFERRAL`; the parameter block is a `REQ_GET_DFS_REFERRAL`
/// and the response data a `RESP_GET_DFS_REFERRAL`.
pub fn get_dfs_referral(request: &DfsReferralRequest, max_data_count: u16) -> SMBTransaction {
    SMBTransaction::transaction2(TRANS2_GET_DFS_REFERRAL, request.smb_to_bytes(), max_data_count)
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FindResponse {
    /// Only FIND_FIRST2 returns a search id.
    pub sid: Option<u16>,
    pub end_of_search: bool,
    pub entries: Vec<FileBothDirectoryInformation>,
}

impl FindResponse {
    /// Resume key and name of the last record, needed to continue the search.
    pub fn resume_point(&self) -> Option<(u32, &str)> {
        self.entries.last().map(|entry| (entry.file_index, entry.file_name.as_str()))
    }
}

pub fn parse_find_first2(response: &SMBTransactionResponse) -> SMBResult<FindResponse> {
    let (_, (sid, count, end_of_search)) = tuple((le_u16, le_u16, le_u16))(response.parameters.as_slice())
        .map_err(nom_error("FIND_FIRST2 parameters"))?;
    let entries = parse_entries(&response.data, count)?;
    Ok(FindResponse { sid: Some(sid), end_of_search: end_of_search != 0, entries })
}

pub fn parse_find_next2(response: &SMBTransactionResponse) -> SMBResult<FindResponse> {
    let (_, (count, end_of_search)) = tuple((le_u16, le_u16))(response.parameters.as_slice())
        .map_err(nom_error("FIND_NEXT2 parameters"))?;
    let entries = parse_entries(&response.data, count)?;
    Ok(FindResponse { sid: None, end_of_search: end_of_search != 0, entries })
}

fn parse_entries(data: &[u8], count: u16) -> SMBResult<Vec<FileBothDirectoryInformation>> {
    let mut entries = FileBothDirectoryInformation::parse_chain(data)?;
    entries.truncate(count as usize);
    Ok(entries)
}
