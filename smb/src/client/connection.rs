use std::net::IpAddr;

use smb_core::SMBResult;

use crate::client::session::Session;
use crate::protocol::body::{Capabilities, SMBDialect};
use crate::protocol::legacy::{SMBTransaction, SMBTransactionResponse};

/// A negotiated, authenticated session to one host.
pub trait Connection: Session {
    fn remote_host(&self) -> &str;

    fn remote_address(&self) -> Option<IpAddr>;

    /// `None` when the server only speaks SMB1.
    fn dialect(&self) -> Option<SMBDialect>;

    /// Server capabilities from negotiation. SMB1 implementations map
    /// `CAP_DFS` onto [`Capabilities::DFS`].
    fn server_capabilities(&self) -> Capabilities;

    fn is_smb2(&self) -> bool {
        self.dialect().is_some()
    }

    fn is_dfs_capable(&self) -> bool {
        self.server_capabilities().contains(Capabilities::DFS)
    }
}

/// A connection bound to one share. The tree is disconnected when the handle
/// is dropped, so releasing it more than once is not possible.
pub trait TreeHandle: Connection {
    fn share(&self) -> &str;

    fn tree_id(&self) -> u32;

    /// Runs an SMB1 `Transaction`/`Transaction2` exchange, including any
    /// secondary requests and reassembly of multi-part responses.
    fn transact(&mut self, transaction: SMBTransaction) -> SMBResult<SMBTransactionResponse>;

    /// `SMB_COM_FIND_CLOSE2` for an SMB1 search that is still open.
    fn find_close(&mut self, sid: u16) -> SMBResult<()>;

    fn is_ipc(&self) -> bool {
        self.share().eq_ignore_ascii_case("IPC$")
    }
}
