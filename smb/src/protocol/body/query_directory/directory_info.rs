use nom::number::complete::{le_u32, le_u64, le_u8};
use nom::sequence::tuple;
use serde::{Deserialize, Serialize};

use smb_core::error::SMBError;
use smb_core::{SMBFromBytes, SMBResult};

use crate::byte_helper::{nom_error, slice_at, string_from_utf16};
use crate::protocol::body::create::file_attributes::SMBFileAttributes;
use crate::protocol::body::filetime::FileTime;

const FILE_NAME_OFFSET: usize = 94;
const SHORT_NAME_OFFSET: usize = 70;
const SHORT_NAME_MAX: usize = 24;

/// One `FileBothDirectoryInformation` record. SMB1's
/// `SMB_FIND_FILE_BOTH_DIRECTORY_INFO` shares the layout byte for byte.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct FileBothDirectoryInformation {
    pub file_index: u32,
    pub creation_time: FileTime,
    pub last_access_time: FileTime,
    pub last_write_time: FileTime,
    pub change_time: FileTime,
    pub end_of_file: u64,
    pub allocation_size: u64,
    pub attributes: SMBFileAttributes,
    pub ea_size: u32,
    pub short_name: String,
    pub file_name: String,
}

impl FileBothDirectoryInformation {
    /// Parses one record, returning it with its `NextEntryOffset`.
    pub fn parse(record: &[u8]) -> SMBResult<(u32, Self)> {
        let (rest, (next_entry_offset, file_index)) = tuple((le_u32, le_u32))(record)
            .map_err(nom_error("directory record"))?;
        let (rest, times) = tuple((le_u64, le_u64, le_u64, le_u64))(rest)
            .map_err(nom_error("directory record times"))?;
        let (_, (end_of_file, allocation_size, attributes, file_name_length, ea_size, short_name_length)) =
            tuple((le_u64, le_u64, le_u32, le_u32, le_u32, le_u8))(rest)
                .map_err(nom_error("directory record sizes"))?;
        if record.len() < FILE_NAME_OFFSET {
            return Err(SMBError::payload_too_small(FILE_NAME_OFFSET, record.len()));
        }
        let short_name_length = (short_name_length as usize).min(SHORT_NAME_MAX);
        let short_name = string_from_utf16(slice_at(record, SHORT_NAME_OFFSET, short_name_length)?)?;
        let file_name = string_from_utf16(slice_at(record, FILE_NAME_OFFSET, file_name_length as usize)?)?;
        let info = Self {
            file_index,
            creation_time: FileTime::from_intervals(times.0),
            last_access_time: FileTime::from_intervals(times.1),
            last_write_time: FileTime::from_intervals(times.2),
            change_time: FileTime::from_intervals(times.3),
            end_of_file,
            allocation_size,
            attributes: SMBFileAttributes::from_bits_retain(attributes),
            ea_size,
            short_name,
            file_name,
        };
        Ok((next_entry_offset, info))
    }

    /// Walks a buffer of records linked by `NextEntryOffset`.
    pub fn parse_chain(buffer: &[u8]) -> SMBResult<Vec<Self>> {
        let mut entries = Vec::new();
        let mut position = 0;
        while position < buffer.len() {
            let (next, info) = Self::parse(&buffer[position..])?;
            entries.push(info);
            if next == 0 {
                break;
            }
            position += next as usize;
        }
        Ok(entries)
    }

    pub fn is_dot_entry(&self) -> bool {
        self.file_name == "." || self.file_name == ".."
    }
}

impl smb_core::SMBByteSize for FileBothDirectoryInformation {
    fn smb_byte_size(&self) -> usize {
        FILE_NAME_OFFSET + self.file_name.encode_utf16().count() * 2
    }
}

impl SMBFromBytes for FileBothDirectoryInformation {
    fn smb_from_bytes(input: &[u8]) -> smb_core::SMBParseResult<&[u8], Self> where Self: Sized {
        let (next, info) = Self::parse(input)?;
        let consumed = if next == 0 { input.len() } else { (next as usize).min(input.len()) };
        Ok((&input[consumed..], info))
    }
}
