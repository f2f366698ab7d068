use smb_core::error::SMBError;
use smb_core::{SMBResult, SMBVecFromBytes};

/// Bytes needed to bring `n` up to the next 8-byte boundary.
pub(crate) fn pad8(n: usize) -> usize {
    (8 - n % 8) % 8
}

pub(crate) fn utf16_bytes(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// UTF-16LE with a two byte NUL terminator.
pub(crate) fn utf16_bytes_nul(value: &str) -> Vec<u8> {
    let mut bytes = utf16_bytes(value);
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

pub(crate) fn utf16_len(value: &str) -> usize {
    value.encode_utf16().count()
}

pub(crate) fn string_from_utf16(bytes: &[u8]) -> SMBResult<String> {
    String::smb_from_bytes_vec(bytes, bytes.len() & !1).map(|(_, value)| value)
}

/// Reads a NUL terminated UTF-16LE string starting at `offset`.
pub(crate) fn string_from_utf16_nul(buffer: &[u8], offset: usize) -> SMBResult<String> {
    let slice = buffer.get(offset..)
        .ok_or_else(|| SMBError::payload_too_small(offset, buffer.len()))?;
    let end = slice.chunks_exact(2)
        .position(|c| c == [0, 0])
        .map(|idx| idx * 2)
        .unwrap_or(slice.len() & !1);
    string_from_utf16(&slice[..end])
}

/// Reads a NUL terminated 8-bit string of at most `max` bytes, as legacy RAP records do.
pub(crate) fn string_from_oem(buffer: &[u8], offset: usize, max: usize) -> SMBResult<String> {
    let slice = buffer.get(offset..)
        .ok_or_else(|| SMBError::payload_too_small(offset, buffer.len()))?;
    let slice = &slice[..slice.len().min(max)];
    let end = slice.iter().position(|b| *b == 0).unwrap_or(slice.len());
    Ok(slice[..end].iter().map(|b| *b as char).collect())
}

pub(crate) fn read_u16(buffer: &[u8], offset: usize) -> SMBResult<u16> {
    buffer.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| SMBError::payload_too_small(offset + 2, buffer.len()))
}

pub(crate) fn read_u32(buffer: &[u8], offset: usize) -> SMBResult<u32> {
    buffer.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| SMBError::payload_too_small(offset + 4, buffer.len()))
}

/// Maps a nom failure onto a parse error naming the structure being read.
pub(crate) fn nom_error(structure: &'static str) -> impl Fn(nom::Err<nom::error::Error<&[u8]>>) -> SMBError {
    move |error| SMBError::parse_error(format!("malformed {}: {:?}", structure, error.map(|e| e.code)))
}

pub(crate) fn slice_at(buffer: &[u8], offset: usize, len: usize) -> SMBResult<&[u8]> {
    buffer.get(offset..offset + len)
        .ok_or_else(|| SMBError::payload_too_small(offset + len, buffer.len()))
}
