//! The places a server-root listing gathers entries from.

use smb_core::error::SMBError;
use smb_core::SMBResult;
use smb_core::logging::debug;

use crate::client::connection::TreeHandle;
use crate::client::context::Context;
use crate::enumeration::file_entry::FileEntry;
use crate::enumeration::locator::ResourceLocator;
use crate::protocol::legacy::rap;
use crate::rpc::{self, NETDFS_PIPE, SRVSVC_PIPE, DcerpcMessage};
use crate::rpc::netdfs::NetrDfsEnumEx;
use crate::rpc::srvsvc::NetrShareEnum;

/// Outcome of asking one source for entries. A recoverable absence means the
/// source is unavailable and the caller may continue without it.
#[derive(Debug)]
pub enum SourceResult {
    Success(Vec<FileEntry>),
    RecoverableAbsence(SMBError),
    Fatal(SMBError),
}

impl SourceResult {
    fn recoverable(result: SMBResult<Vec<FileEntry>>) -> Self {
        match result {
            Ok(entries) => Self::Success(entries),
            Err(e) => Self::RecoverableAbsence(e),
        }
    }
}

fn check_retval<M: DcerpcMessage>(message: &M) -> SMBResult<()> {
    match message.retval() {
        0 => Ok(()),
        status => Err(SMBError::status_error(status)),
    }
}

/// The DFS roots of the domain `locator` names, via `NetrDfsEnumEx`.
pub fn dfs_roots(ctx: &dyn Context, locator: &ResourceLocator) -> SourceResult {
    SourceResult::recoverable(enumerate_dfs_roots(ctx, locator))
}

fn enumerate_dfs_roots(ctx: &dyn Context, locator: &ResourceLocator) -> SMBResult<Vec<FileEntry>> {
    let mut handle = ctx.rpc_handle(locator, NETDFS_PIPE)?;
    let mut message = NetrDfsEnumEx::new(locator.host());
    rpc::call(&mut *handle, &mut message)?;
    check_retval(&message)?;
    let entries = message.into_roots().into_iter()
        .filter_map(|root| root_name(&root).map(str::to_string))
        .map(|name| FileEntry::share(name, 0, None))
        .collect();
    Ok(entries)
}

/// `\\domain\root` lists as `root`.
fn root_name(root: &str) -> Option<&str> {
    root.trim_end_matches('\\').rsplit('\\').next().filter(|name| !name.is_empty())
}

/// Shares over srvsvc, addressed at the host the tree is connected to so a
/// multi-homed name is queried at one address only. Failure is fatal on SMB2;
/// on SMB1 the caller may fall back to RAP.
pub fn rpc_shares(ctx: &dyn Context, locator: &ResourceLocator, tree: &dyn TreeHandle) -> SourceResult {
    let pinned = match tree.remote_address() {
        Some(address) => locator.pinned_to(address),
        None => locator.clone(),
    };
    match enumerate_rpc_shares(ctx, &pinned) {
        Ok(entries) => SourceResult::Success(entries),
        Err(e) if tree.is_smb2() => SourceResult::Fatal(e),
        Err(e) => SourceResult::RecoverableAbsence(e),
    }
}

fn enumerate_rpc_shares(ctx: &dyn Context, locator: &ResourceLocator) -> SMBResult<Vec<FileEntry>> {
    let mut handle = ctx.rpc_handle(locator, SRVSVC_PIPE)?;
    let mut message = NetrShareEnum::new(locator.host());
    rpc::call(&mut *handle, &mut message)?;
    check_retval(&message)?;
    let entries = message.into_shares().into_iter()
        .map(|share| FileEntry::share(share.name, share.share_type, share.remark))
        .collect();
    Ok(entries)
}

/// Shares via the RAP `NetShareEnum` call. SMB1 only.
pub fn rap_shares(ctx: &dyn Context, tree: &mut dyn TreeHandle) -> SMBResult<Vec<FileEntry>> {
    let buffer_size = ctx.config().transaction_buffer_size();
    let response = tree.transact(rap::net_share_enum(buffer_size))?;
    let shares = rap::parse_net_share_enum(&response)?;
    if shares.status != rap::ERROR_SUCCESS {
        debug!("NetShareEnum returned status {}", shares.status);
        return Err(rap::rap_status_error(shares.status));
    }
    let entries = shares.entries.into_iter()
        .map(|share| FileEntry::share(share.name, share.share_type, Some(share.remark)))
        .collect();
    Ok(entries)
}
