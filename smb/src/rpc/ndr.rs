//! Minimal NDR20 marshalling for the stubs the enumeration code exchanges.

use bytes::BufMut;

use smb_core::error::SMBError;
use smb_core::SMBResult;

use crate::byte_helper::{read_u16, read_u32};

const FIRST_REFERENT_ID: u32 = 0x0002_0000;

#[derive(Debug)]
pub struct NdrEncoder {
    buffer: Vec<u8>,
    next_referent: u32,
}

impl Default for NdrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NdrEncoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            next_referent: FIRST_REFERENT_ID,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn align(&mut self, alignment: usize) {
        let padding = (alignment - self.buffer.len() % alignment) % alignment;
        self.buffer.put_bytes(0, padding);
    }

    pub fn u16(&mut self, value: u16) {
        self.align(2);
        self.buffer.put_u16_le(value);
    }

    pub fn u32(&mut self, value: u32) {
        self.align(4);
        self.buffer.put_u32_le(value);
    }

    /// Writes a referent id for a non-null unique pointer, or zero.
    pub fn referent(&mut self, present: bool) {
        if present {
            let id = self.next_referent;
            self.next_referent += 4;
            self.u32(id);
        } else {
            self.u32(0);
        }
    }

    /// Conformant varying UTF-16 string including its terminator.
    pub fn string(&mut self, value: &str) {
        let units = value.encode_utf16().chain(std::iter::once(0)).collect::<Vec<_>>();
        self.u32(units.len() as u32);
        self.u32(0);
        self.u32(units.len() as u32);
        for unit in units {
            self.buffer.put_u16_le(unit);
        }
    }

    pub fn unique_string(&mut self, value: Option<&str>) {
        self.referent(value.is_some());
        if let Some(value) = value {
            self.string(value);
        }
    }
}

#[derive(Debug)]
pub struct NdrDecoder<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> NdrDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Checks that `count` elements of at least `element_size` bytes each
    /// can still follow, before anything is allocated for them.
    pub fn bounded_count(&self, count: u32, element_size: usize) -> SMBResult<usize> {
        let count = count as usize;
        let needed = count.saturating_mul(element_size);
        if needed > self.remaining() {
            return Err(SMBError::payload_too_small(needed, self.remaining()));
        }
        Ok(count)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn align(&mut self, alignment: usize) {
        self.position += (alignment - self.position % alignment) % alignment;
    }

    pub fn u16(&mut self) -> SMBResult<u16> {
        self.align(2);
        let value = read_u16(self.data, self.position)?;
        self.position += 2;
        Ok(value)
    }

    pub fn u32(&mut self) -> SMBResult<u32> {
        self.align(4);
        let value = read_u32(self.data, self.position)?;
        self.position += 4;
        Ok(value)
    }

    /// Reads a pointer's referent id, `false` for null.
    pub fn referent(&mut self) -> SMBResult<bool> {
        Ok(self.u32()? != 0)
    }

    pub fn string(&mut self) -> SMBResult<String> {
        let max_count = self.u32()?;
        let offset = self.u32()?;
        let actual_count = self.u32()?;
        if offset != 0 || actual_count > max_count {
            return Err(SMBError::parse_error(format!("invalid NDR string bounds {}/{}/{}", max_count, offset, actual_count)));
        }
        let actual_count = self.bounded_count(actual_count, 2)?;
        let mut units = Vec::with_capacity(actual_count);
        for _ in 0..actual_count {
            let unit = read_u16(self.data, self.position)?;
            self.position += 2;
            units.push(unit);
        }
        let len = units.iter().position(|unit| *unit == 0).unwrap_or(units.len());
        String::from_utf16(&units[..len]).map_err(SMBError::parse_error)
    }

    /// Reads a deferred string for a pointer decoded earlier.
    pub fn deferred_string(&mut self, present: bool) -> SMBResult<Option<String>> {
        if present {
            self.string().map(Some)
        } else {
            Ok(None)
        }
    }
}
