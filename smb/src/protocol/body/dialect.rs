use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use smb_core::error::SMBError;
use smb_core::SMBResult;
use smb_derive::{SMBByteSize, SMBFromBytes, SMBToBytes};

#[repr(u16)]
#[derive(Debug, Eq, PartialEq, Hash, TryFromPrimitive, Serialize, Deserialize, Copy, Clone, Ord, PartialOrd, SMBFromBytes, SMBByteSize, SMBToBytes)]
#[allow(non_camel_case_types)]
pub enum SMBDialect {
    V2_0_2 = 0x202,
    V2_1_0 = 0x210,
    V3_0_0 = 0x300,
    V3_0_2 = 0x302,
    V3_1_1 = 0x311,
    V2_X_X = 0x2FF
}

// Kept out of the derive list: a `#[default]` variant turns into the
// catch-all for unknown wire values under `TryFromPrimitive`.
impl Default for SMBDialect {
    fn default() -> Self {
        SMBDialect::V2_X_X
    }
}

impl SMBDialect {
    pub const KNOWN: [SMBDialect; 5] = [
        SMBDialect::V2_0_2,
        SMBDialect::V2_1_0,
        SMBDialect::V3_0_0,
        SMBDialect::V3_0_2,
        SMBDialect::V3_1_1,
    ];

    pub fn is_smb3(&self) -> bool {
        *self as u16 >= 0x300 && *self != SMBDialect::V2_X_X
    }

    /// Wildcard revision returned when a multi-protocol negotiate has to be repeated.
    pub fn is_wildcard(&self) -> bool {
        *self == SMBDialect::V2_X_X
    }
}

/// Dialects a client offers, in the order they go on the wire. Never empty.
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct SMBDialectSet(Vec<SMBDialect>);

impl SMBDialectSet {
    pub fn new(dialects: Vec<SMBDialect>) -> SMBResult<Self> {
        if dialects.is_empty() {
            return Err(SMBError::request_error("dialect set must not be empty"));
        }
        Ok(Self(dialects))
    }

    /// Every concrete dialect between `min` and `max` inclusive, ascending.
    pub fn range(min: SMBDialect, max: SMBDialect) -> SMBResult<Self> {
        let dialects = SMBDialect::KNOWN.iter()
            .copied()
            .filter(|d| *d >= min && *d <= max)
            .collect::<Vec<_>>();
        Self::new(dialects)
    }

    pub fn as_slice(&self) -> &[SMBDialect] {
        &self.0
    }

    pub fn contains(&self, dialect: SMBDialect) -> bool {
        self.0.contains(&dialect)
    }

    pub fn max(&self) -> SMBDialect {
        self.0.iter().copied().max().unwrap_or_default()
    }
}

impl From<SMBDialectSet> for Vec<SMBDialect> {
    fn from(value: SMBDialectSet) -> Self {
        value.0
    }
}
