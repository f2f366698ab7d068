use smb_core::SMBResult;

use crate::client::config::{Credentials, SMBClientConfig};
use crate::client::connection::TreeHandle;
use crate::dfs::DfsResolver;
use crate::enumeration::locator::ResourceLocator;
use crate::rpc::DcerpcHandle;

/// Everything an operation needs from the surrounding client: settings,
/// identity, the DFS resolver and a way to open connections.
///
/// The resolver, and so its referral cache, lives as long as the context.
pub trait Context {
    fn config(&self) -> &SMBClientConfig;

    fn credentials(&self) -> &Credentials;

    fn dfs(&self) -> &DfsResolver;

    /// Connects `share` on the host `locator` names, at its current address
    /// when one is set. An empty host means the local master browser.
    fn connect_tree(&self, locator: &ResourceLocator, share: &str) -> SMBResult<Box<dyn TreeHandle>>;

    /// Opens and binds the RPC pipe `pipe` (for example `\PIPE\srvsvc`) on the
    /// host `locator` names.
    fn rpc_handle(&self, locator: &ResourceLocator, pipe: &str) -> SMBResult<Box<dyn DcerpcHandle>>;
}
