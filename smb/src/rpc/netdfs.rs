use smb_core::error::SMBError;
use smb_core::SMBResult;

use crate::rpc::DcerpcMessage;
use crate::rpc::ndr::{NdrDecoder, NdrEncoder};

const NETR_DFS_ENUM_EX: u16 = 21;
const DFS_INFO_LEVEL_200: u32 = 200;
const PREFERRED_MAX_LENGTH: u32 = 0xFFFF;

/// NetrDfsEnumEx at level 200, which lists the DFS roots of a domain.
#[derive(Debug, Clone)]
pub struct NetrDfsEnumEx {
    dfs_name: String,
    roots: Vec<String>,
    total_entries: u32,
    retval: u32,
}

impl NetrDfsEnumEx {
    pub fn new<T: Into<String>>(domain: T) -> Self {
        Self {
            dfs_name: domain.into(),
            roots: Vec::new(),
            total_entries: 0,
            retval: 0,
        }
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<String> {
        self.roots
    }

    pub fn total_entries(&self) -> u32 {
        self.total_entries
    }
}

impl DcerpcMessage for NetrDfsEnumEx {
    fn opnum(&self) -> u16 {
        NETR_DFS_ENUM_EX
    }

    fn encode_stub(&self) -> Vec<u8> {
        let mut ndr = NdrEncoder::new();
        ndr.string(&self.dfs_name);
        ndr.u32(DFS_INFO_LEVEL_200);
        ndr.u32(PREFERRED_MAX_LENGTH);
        ndr.referent(true);
        ndr.u32(DFS_INFO_LEVEL_200);
        ndr.u32(DFS_INFO_LEVEL_200);
        ndr.referent(true);
        ndr.u32(0);
        ndr.referent(false);
        ndr.referent(true);
        ndr.u32(0);
        ndr.into_bytes()
    }

    fn decode_stub(&mut self, stub: &[u8]) -> SMBResult<()> {
        let mut ndr = NdrDecoder::new(stub);
        self.roots.clear();
        if ndr.referent()? {
            let level = ndr.u32()?;
            let switch = ndr.u32()?;
            if level != DFS_INFO_LEVEL_200 || switch != DFS_INFO_LEVEL_200 {
                return Err(SMBError::parse_error(format!("unexpected DFS info level {}", level)));
            }
            if ndr.referent()? {
                let count = ndr.u32()?;
                if ndr.referent()? {
                    let max_count = ndr.u32()?;
                    if max_count < count {
                        return Err(SMBError::parse_error("DFS root array shorter than entry count"));
                    }
                    let count = ndr.bounded_count(count, 4)?;
                    let mut pointers = Vec::with_capacity(count);
                    for _ in 0..count {
                        pointers.push(ndr.referent()?);
                    }
                    for present in pointers {
                        if let Some(name) = ndr.deferred_string(present)? {
                            self.roots.push(name);
                        }
                    }
                }
            }
        }
        if ndr.referent()? {
            self.total_entries = ndr.u32()?;
        }
        self.retval = ndr.u32()?;
        Ok(())
    }

    fn retval(&self) -> u32 {
        self.retval
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn dfs_enum_stub(roots: &[&str], retval: u32) -> Vec<u8> {
        let mut ndr = NdrEncoder::new();
        ndr.referent(true);
        ndr.u32(200);
        ndr.u32(200);
        ndr.referent(true);
        ndr.u32(roots.len() as u32);
        ndr.referent(true);
        ndr.u32(roots.len() as u32);
        for _ in roots {
            ndr.referent(true);
        }
        for root in roots {
            ndr.string(root);
        }
        ndr.referent(true);
        ndr.u32(roots.len() as u32);
        ndr.u32(retval);
        ndr.into_bytes()
    }

    #[test]
    fn request_uses_level_200() {
        let request = NetrDfsEnumEx::new("corp.example");
        let stub = request.encode_stub();
        assert_eq!(request.opnum(), 21);
        // 13 characters plus terminator, padded to 28 bytes
        let fixed = 12 + 28;
        assert_eq!(&stub[fixed..fixed + 8], &[200, 0, 0, 0, 0xFF, 0xFF, 0, 0]);
    }

    #[test]
    fn response_yields_root_names() {
        let mut request = NetrDfsEnumEx::new("corp.example");
        request.decode_stub(&dfs_enum_stub(&["\\corp.example\\public", "\\corp.example\\teams"], 0)).unwrap();
        assert_eq!(request.roots(), &["\\corp.example\\public".to_string(), "\\corp.example\\teams".to_string()]);
        assert_eq!(request.total_entries(), 2);
        assert_eq!(request.retval(), 0);
    }

    #[test]
    fn root_count_beyond_the_stub_is_an_error() {
        let mut ndr = NdrEncoder::new();
        ndr.referent(true);
        ndr.u32(200);
        ndr.u32(200);
        ndr.referent(true);
        ndr.u32(0x4000_0000);
        ndr.referent(true);
        ndr.u32(0x4000_0000);
        let mut request = NetrDfsEnumEx::new("corp");
        assert!(request.decode_stub(&ndr.into_bytes()).is_err());
    }
}
