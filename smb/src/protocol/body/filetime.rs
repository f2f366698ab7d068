use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use smb_derive::{SMBByteSize, SMBFromBytes, SMBToBytes};

/// 100ns intervals since 1601-01-01, split the way the wire carries it.
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Clone, Copy, SMBFromBytes, SMBToBytes, SMBByteSize, Default)]
pub struct FileTime {
    #[smb_direct(start = 0)]
    low_date_time: u32,
    #[smb_direct(start = 4)]
    high_date_time: u32,
}

const SECONDS_BETWEEN_1601_AND_1970: u64 = 11_644_473_600;
const INTERVALS_PER_SECOND: u64 = 10_000_000;

impl FileTime {
    pub fn from_intervals(intervals: u64) -> Self {
        Self {
            low_date_time: intervals as u32,
            high_date_time: (intervals >> 32) as u32,
        }
    }

    pub fn from_unix(unix_seconds: u64) -> Self {
        Self::from_intervals((unix_seconds + SECONDS_BETWEEN_1601_AND_1970) * INTERVALS_PER_SECOND)
    }

    pub fn now() -> Self {
        let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        Self::from_unix(since_epoch.as_secs())
    }

    pub fn intervals(&self) -> u64 {
        ((self.high_date_time as u64) << 32) | self.low_date_time as u64
    }

    /// Seconds since the unix epoch; times before 1970 clamp to zero.
    pub fn to_unix(&self) -> u64 {
        (self.intervals() / INTERVALS_PER_SECOND).saturating_sub(SECONDS_BETWEEN_1601_AND_1970)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smb_core::SMBToBytes;

    #[test]
    fn unix_conversion() {
        let time = FileTime::from_unix(1_700_000_000);
        assert_eq!(time.to_unix(), 1_700_000_000);
        assert_eq!(FileTime::default().to_unix(), 0);
    }

    #[test]
    fn little_endian_halves() {
        let time = FileTime::from_intervals(0x0102_0304_0506_0708);
        assert_eq!(time.smb_to_bytes(), vec![0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }
}
