use smb_core::error::SMBError;
use smb_core::SMBResult;

use crate::rpc::DcerpcMessage;
use crate::rpc::ndr::{NdrDecoder, NdrEncoder};

const NETR_SHARE_ENUM_ALL: u16 = 15;
const SHARE_INFO_LEVEL_1: u32 = 1;
const MAX_PREFERRED_LENGTH: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareInfo1 {
    pub name: String,
    pub share_type: u32,
    pub remark: Option<String>,
}

/// NetrShareEnum at information level 1.
#[derive(Debug, Clone)]
pub struct NetrShareEnum {
    server_name: String,
    shares: Vec<ShareInfo1>,
    total_entries: u32,
    retval: u32,
}

impl NetrShareEnum {
    pub fn new<T: Into<String>>(server: T) -> Self {
        Self {
            server_name: format!("\\\\{}", server.into()),
            shares: Vec::new(),
            total_entries: 0,
            retval: 0,
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn shares(&self) -> &[ShareInfo1] {
        &self.shares
    }

    pub fn into_shares(self) -> Vec<ShareInfo1> {
        self.shares
    }

    pub fn total_entries(&self) -> u32 {
        self.total_entries
    }
}

impl DcerpcMessage for NetrShareEnum {
    fn opnum(&self) -> u16 {
        NETR_SHARE_ENUM_ALL
    }

    fn encode_stub(&self) -> Vec<u8> {
        let mut ndr = NdrEncoder::new();
        ndr.unique_string(Some(&self.server_name));
        ndr.u32(SHARE_INFO_LEVEL_1);
        // union switch, then an empty level 1 container
        ndr.u32(SHARE_INFO_LEVEL_1);
        ndr.referent(true);
        ndr.u32(0);
        ndr.referent(false);
        ndr.u32(MAX_PREFERRED_LENGTH);
        ndr.referent(true);
        ndr.u32(0);
        ndr.into_bytes()
    }

    fn decode_stub(&mut self, stub: &[u8]) -> SMBResult<()> {
        let mut ndr = NdrDecoder::new(stub);
        let level = ndr.u32()?;
        let switch = ndr.u32()?;
        if level != SHARE_INFO_LEVEL_1 || switch != SHARE_INFO_LEVEL_1 {
            return Err(SMBError::parse_error(format!("unexpected share info level {}", level)));
        }
        self.shares.clear();
        if ndr.referent()? {
            let count = ndr.u32()?;
            if ndr.referent()? {
                let max_count = ndr.u32()?;
                if max_count < count {
                    return Err(SMBError::parse_error("share array shorter than entry count"));
                }
                // name pointer, type and remark pointer
                let count = ndr.bounded_count(count, 12)?;
                let mut pointers = Vec::with_capacity(count);
                for _ in 0..count {
                    let name = ndr.referent()?;
                    let share_type = ndr.u32()?;
                    let remark = ndr.referent()?;
                    pointers.push((name, share_type, remark));
                }
                for (name, share_type, remark) in pointers {
                    let name = ndr.deferred_string(name)?.unwrap_or_default();
                    let remark = ndr.deferred_string(remark)?;
                    self.shares.push(ShareInfo1 { name, share_type, remark });
                }
            }
        }
        self.total_entries = ndr.u32()?;
        if ndr.referent()? {
            ndr.u32()?;
        }
        self.retval = ndr.u32()?;
        Ok(())
    }

    fn retval(&self) -> u32 {
        self.retval
    }
}
