use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::util::flags_helper::{impl_smb_byte_size_for_bitflag, impl_smb_from_bytes_for_bitflag, impl_smb_to_bytes_for_bitflag};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, Default)]
    pub struct Capabilities: u32 {
        const DFS                = 0x01;
        const LEASING            = 0x02;
        const LARGE_MTU          = 0x04;
        const MULTI_CHANNEL      = 0x08;
        const PERSISTENT_HANDLES = 0x10;
        const DIRECTORY_LEASING  = 0x20;
        const ENCRYPTION         = 0x40;
    }
}

impl Capabilities {
    /// Capabilities a client advertises. DFS is offered iff referrals are in use.
    pub fn for_client(dfs_enabled: bool, encryption_enabled: bool) -> Self {
        let mut capabilities = Capabilities::LARGE_MTU;
        capabilities.set(Capabilities::DFS, dfs_enabled);
        capabilities.set(Capabilities::ENCRYPTION, encryption_enabled);
        capabilities
    }
}

impl_smb_byte_size_for_bitflag! { Capabilities }
impl_smb_from_bytes_for_bitflag! { Capabilities }
impl_smb_to_bytes_for_bitflag! { Capabilities }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dfs_bit_follows_configuration() {
        assert!(Capabilities::for_client(true, false).contains(Capabilities::DFS));
        assert!(!Capabilities::for_client(false, true).contains(Capabilities::DFS));
        assert!(Capabilities::for_client(false, true).contains(Capabilities::ENCRYPTION));
    }
}
