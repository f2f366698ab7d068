//! Listing workgroups, servers, shares and directories.
//!
//! [`EnumerationOrchestrator`] picks the strategy from the locator: RAP server
//! browsing for the network or a workgroup, a merged share listing for a
//! server root, and a directory search (after DFS resolution) below a share.

use std::collections::HashSet;

use smb_core::error::SMBError;
use smb_core::logging::debug;
use smb_core::SMBResult;

use crate::client::context::Context;
use crate::enumeration::iterator::{DirectoryIterator1, DirectoryIterator2, DirectorySearch, EntrySource, ServerEnumIterator};
use crate::enumeration::source::SourceResult;

pub mod file_entry;
pub mod filter;
pub mod iterator;
pub mod locator;
pub mod request;
pub mod source;

pub use file_entry::{FileEntry, SMBResource};
pub use filter::{DosFileFilter, ResourceFilter, ResourceNameFilter};
pub use iterator::SMBResourceIterator;
pub use locator::{ResourceLocator, ResourceType};
pub use request::EnumerationRequest;

const IPC_SHARE: &str = "IPC$";

pub struct EnumerationOrchestrator<'c> {
    ctx: &'c dyn Context,
}

impl<'c> EnumerationOrchestrator<'c> {
    pub fn new(ctx: &'c dyn Context) -> Self {
        Self { ctx }
    }

    /// Lists the children of `parent`. Failures carry the parent's URL.
    pub fn enumerate<'a>(&self, parent: &ResourceLocator, request: &'a EnumerationRequest<'_>) -> SMBResult<SMBResourceIterator<'a>> {
        self.open(parent, request).map_err(|e| e.at_locator(parent.url()))
    }

    /// Child names, with a trailing `/` on containers.
    pub fn list(&self, parent: &ResourceLocator, request: &EnumerationRequest<'_>) -> SMBResult<Vec<String>> {
        self.enumerate(parent, request)?
            .map(|resource| resource.map(|resource| resource.name()))
            .collect::<SMBResult<Vec<_>>>()
            .map_err(|e| e.at_locator(parent.url()))
    }

    pub fn list_files(&self, parent: &ResourceLocator, request: &EnumerationRequest<'_>) -> SMBResult<Vec<SMBResource>> {
        self.enumerate(parent, request)?
            .collect::<SMBResult<Vec<_>>>()
            .map_err(|e| e.at_locator(parent.url()))
    }

    fn open<'a>(&self, parent: &ResourceLocator, request: &'a EnumerationRequest<'_>) -> SMBResult<SMBResourceIterator<'a>> {
        let config = self.ctx.config();
        let name_filter = request.name_filter();
        let entries: EntrySource<'a> = if parent.host().is_empty() || parent.is_workgroup() {
            let tree = self.ctx.connect_tree(parent, IPC_SHARE)?;
            let domain = self.ctx.credentials().domain().to_string();
            Box::new(ServerEnumIterator::open(tree, parent.clone(), domain, config.transaction_buffer_size(), name_filter)?)
        } else if parent.is_root() {
            let shares = self.share_enum(parent, name_filter)?;
            Box::new(shares.into_iter().map(Ok))
        } else {
            let target = self.resolve(parent)?;
            let share = target.share_name()
                .ok_or_else(|| SMBError::request_error(format!("{} does not name a share", target.url())))?
                .to_string();
            let tree = self.ctx.connect_tree(&target, &share)?;
            let (wildcard, attributes) = request.search_parameters();
            let search = DirectorySearch {
                wildcard: wildcard.to_string(),
                attributes,
                name_filter,
                list_count: config.list_count(),
                list_size: config.list_size(),
                buffer_size: config.transaction_buffer_size(),
            };
            if tree.is_smb2() {
                Box::new(DirectoryIterator2::open(tree, parent.clone(), &target, search)?)
            } else {
                Box::new(DirectoryIterator1::open(tree, parent.clone(), &target, search)?)
            }
        };
        Ok(SMBResourceIterator::new(parent.clone(), entries, request.filter()))
    }

    /// Where `parent` actually lives once DFS referrals are followed.
    fn resolve(&self, parent: &ResourceLocator) -> SMBResult<ResourceLocator> {
        let Some(share) = parent.share_name() else {
            return Ok(parent.clone());
        };
        let referral = self.ctx.dfs().resolve(self.ctx, parent.host(), share, &parent.dfs_path())?;
        Ok(match referral {
            Some(referral) => {
                debug!("{} resolved through DFS to {}\\{}", parent, referral.server(), referral.share());
                parent.redirect(&referral)
            }
            None => parent.clone(),
        })
    }

    /// Shares of a server, merged from the DFS roots of a domain of that name
    /// and from srvsvc (or RAP on SMB1). Each entry appears once.
    fn share_enum(&self, parent: &ResourceLocator, name_filter: Option<&dyn ResourceNameFilter>) -> SMBResult<Vec<FileEntry>> {
        if !parent.path().ends_with('/') {
            return Err(SMBError::request_error(format!("{} directory must end with '/'", parent.url())));
        }
        if parent.resource_type() != ResourceType::Server {
            return Err(SMBError::request_error(format!("the requested list operation is invalid: {}", parent.url())));
        }

        let mut merged = Merged::new(parent, name_filter);
        if self.ctx.dfs().is_trusted_domain(self.ctx, parent.host())? {
            match source::dfs_roots(self.ctx, parent) {
                SourceResult::Success(entries) => merged.extend(entries)?,
                SourceResult::RecoverableAbsence(e) | SourceResult::Fatal(e) => debug!("DFS root enumeration failed: {}", e),
            }
        }

        let mut tree = self.ctx.connect_tree(parent, IPC_SHARE)?;
        let entries = match source::rpc_shares(self.ctx, parent, &*tree) {
            SourceResult::Success(entries) => entries,
            SourceResult::RecoverableAbsence(e) => {
                debug!("srvsvc share enumeration failed, falling back to RAP: {}", e);
                source::rap_shares(self.ctx, &mut *tree)?
            }
            SourceResult::Fatal(e) => return Err(e),
        };
        merged.extend(entries)?;
        Ok(merged.into_entries())
    }
}

/// Entries in first-seen order, each at most once, that passed the name filter.
struct Merged<'p, 'f> {
    parent: &'p ResourceLocator,
    name_filter: Option<&'f dyn ResourceNameFilter>,
    seen: HashSet<FileEntry>,
    entries: Vec<FileEntry>,
}

impl<'p, 'f> Merged<'p, 'f> {
    fn new(parent: &'p ResourceLocator, name_filter: Option<&'f dyn ResourceNameFilter>) -> Self {
        Self { parent, name_filter, seen: HashSet::new(), entries: Vec::new() }
    }

    fn extend(&mut self, entries: Vec<FileEntry>) -> SMBResult<()> {
        for entry in entries {
            if self.seen.contains(&entry) {
                continue;
            }
            if let Some(filter) = self.name_filter {
                if !filter.accept(self.parent, entry.name())? {
                    continue;
                }
            }
            self.seen.insert(entry.clone());
            self.entries.push(entry);
        }
        Ok(())
    }

    fn into_entries(self) -> Vec<FileEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::net::{IpAddr, Ipv4Addr};
    use std::rc::Rc;

    use smb_core::nt_status::NTStatus;

    use crate::client::config::{Credentials, SMBClientConfig};
    use crate::protocol::body::create::file_attributes::SMBFileAttributes;
    use crate::protocol::body::ioctl::dfs_referral::tests::{name_list_response, storage_response};
    use crate::protocol::body::query_directory::directory_info::tests::directory_buffer;
    use crate::protocol::body::query_directory::SMBQueryDirectoryResponse;
    use crate::protocol::body::{SMBRequestBody, SMBResponseBody};
    use crate::protocol::legacy::rap::tests::{server_enum_response, share_enum_response};
    use crate::protocol::legacy::rap::{ERROR_MORE_DATA, ERROR_SUCCESS};
    use crate::protocol::legacy::trans2::{TRANS2_FIND_FIRST2, TRANS2_FIND_NEXT2};
    use crate::protocol::legacy::SMBTransactionResponse;
    use crate::rpc::netdfs::tests::dfs_enum_stub;
    use crate::rpc::srvsvc::tests::share_enum_stub;
    use crate::rpc::{NETDFS_PIPE, SRVSVC_PIPE};
    use crate::test_support::{close_response, create_response, referral_path, referral_reply, MockContext, MockPipe, MockTree, Reply};

    use super::*;

    fn list(ctx: &MockContext, url: &str, request: &EnumerationRequest) -> SMBResult<Vec<String>> {
        EnumerationOrchestrator::new(ctx).list(&ResourceLocator::parse(url).unwrap(), request)
    }

    fn address() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))
    }

    #[test]
    fn server_root_without_separator_fails_before_io() {
        let ctx = MockContext::new(SMBClientConfig::default());
        let error = list(&ctx, "smb://server", &EnumerationRequest::new()).unwrap_err();
        assert!(error.is_request());
        assert!(ctx.events().is_empty());
    }

    #[test]
    fn smb2_shares_come_from_srvsvc_at_the_connected_address() {
        let ctx = MockContext::new(SMBClientConfig::default())
            .tree("server", "IPC$", || Ok(MockTree::smb2("server", "IPC$").at(address())))
            .pipe("server", SRVSVC_PIPE, || Ok(MockPipe::replying(share_enum_stub(&[
                ("docs", 0, "Documents"),
                ("laser", 1, "Printer"),
                ("IPC$", 0x8000_0003, "Remote IPC"),
            ], 0))));
        let names = list(&ctx, "smb://server/", &EnumerationRequest::new()).unwrap();
        assert_eq!(names, vec!["docs/", "laser/", "IPC$/"]);
        assert!(ctx.events().contains(&"rpc server \\PIPE\\srvsvc @10.0.0.5".to_string()));
        assert_eq!(ctx.count("transact"), 0);
    }

    #[test]
    fn smb2_srvsvc_failure_propagates() {
        let ctx = MockContext::new(SMBClientConfig::default())
            .tree("server", "IPC$", || Ok(MockTree::smb2("server", "IPC$")))
            .pipe("server", SRVSVC_PIPE, || Ok(MockPipe::replying(share_enum_stub(&[], 5))));
        let error = list(&ctx, "smb://server/", &EnumerationRequest::new()).unwrap_err();
        assert_eq!(error.status_code(), Some(5));
        assert_eq!(ctx.count("transact"), 0);
    }

    #[test]
    fn smb1_falls_back_to_rap() {
        let ctx = MockContext::new(SMBClientConfig::default())
            .tree("oldbox", "IPC$", || Ok(MockTree::smb1("oldbox", "IPC$").on_transact(|_| {
                Ok(share_enum_response(&[("public", 0, "Public"), ("print$", 0, "Drivers")], ERROR_SUCCESS))
            })));
        let names = list(&ctx, "smb://oldbox/", &EnumerationRequest::new()).unwrap();
        assert_eq!(names, vec!["public/", "print$/"]);
        assert_eq!(ctx.count("rpc oldbox"), 1);
        assert_eq!(ctx.count("transact"), 1);
    }

    fn domain_context(with_roots: bool) -> MockContext {
        let ctx = MockContext::new(SMBClientConfig::default())
            .with_credentials(Credentials::new("alice", "CORP"))
            .tree("corp", "IPC$", || Ok(MockTree::smb1("corp", "IPC$").dfs().on_transact(|transaction| {
                match referral_path(transaction).as_deref() {
                    Some("") => referral_reply(name_list_response("\\CORP", &[], 600)),
                    _ => Err(SMBError::status_error(NTStatus::NotFound)),
                }
            })))
            .pipe("corp", SRVSVC_PIPE, || Ok(MockPipe::replying(share_enum_stub(&[
                ("docs", 0, ""),
                ("NETLOGON", 0, "Logon server share"),
            ], 0))));
        if !with_roots {
            return ctx;
        }
        ctx.pipe("corp", NETDFS_PIPE, || Ok(MockPipe::replying(dfs_enum_stub(&["\\\\corp\\public", "\\\\corp\\docs"], 0))))
    }

    #[test]
    fn domain_listing_merges_dfs_roots_and_shares_once() {
        let ctx = domain_context(true);
        let names = list(&ctx, "smb://corp/", &EnumerationRequest::new()).unwrap();
        assert_eq!(names, vec!["public/", "docs/", "NETLOGON/"]);
    }

    #[test]
    fn name_filter_applies_while_merging() {
        let ctx = domain_context(true);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let recorder = seen.clone();
        let request = EnumerationRequest::new().with_name_filter(move |_: &ResourceLocator, name: &str| {
            recorder.borrow_mut().push(name.to_string());
            name != "NETLOGON"
        });
        let names = list(&ctx, "smb://corp/", &request).unwrap();
        assert_eq!(names, vec!["public/", "docs/"]);
        assert_eq!(*seen.borrow(), vec!["public", "docs", "NETLOGON"]);
    }

    #[test]
    fn dfs_root_failure_is_tolerated() {
        let ctx = domain_context(false);
        let names = list(&ctx, "smb://corp/", &EnumerationRequest::new()).unwrap();
        assert_eq!(names, vec!["docs/", "NETLOGON/"]);
        assert_eq!(ctx.count("rpc corp \\PIPE\\netdfs"), 1);
    }

    #[test]
    fn workgroup_lists_servers_across_pages() {
        let pages = Rc::new(RefCell::new(0));
        let ctx = MockContext::new(SMBClientConfig::default())
            .tree("WORKGROUP", "IPC$", move || {
                let pages = pages.clone();
                Ok(MockTree::smb1("master", "IPC$").on_transact(move |_| {
                    *pages.borrow_mut() += 1;
                    Ok(match *pages.borrow() {
                        1 => server_enum_response(&["ALPHA", "BETA"], ERROR_MORE_DATA),
                        _ => server_enum_response(&["BETA", "GAMMA"], ERROR_SUCCESS),
                    })
                }))
            });
        let orchestrator = EnumerationOrchestrator::new(&ctx);
        let resources = orchestrator.list_files(&ResourceLocator::workgroup("WORKGROUP"), &EnumerationRequest::new()).unwrap();
        let names = resources.iter().map(SMBResource::name).collect::<Vec<_>>();
        assert_eq!(names, vec!["ALPHA/", "BETA/", "GAMMA/"]);
        assert_eq!(resources[0].resource_type(), ResourceType::Server);
        assert_eq!(resources[0].locator().url(), "smb://ALPHA/");
    }

    #[test]
    fn network_lists_workgroups() {
        let ctx = MockContext::new(SMBClientConfig::default())
            .tree("", "IPC$", || Ok(MockTree::smb1("master", "IPC$").on_transact(|_| {
                Ok(server_enum_response(&["WORKGROUP", "CORP"], ERROR_SUCCESS))
            })));
        let resources = EnumerationOrchestrator::new(&ctx).list_files(&ResourceLocator::network(), &EnumerationRequest::new()).unwrap();
        assert!(resources.iter().all(|resource| resource.resource_type() == ResourceType::Workgroup));
        assert_eq!(resources.len(), 2);
    }

    #[test]
    fn server_browsing_needs_smb1() {
        let ctx = MockContext::new(SMBClientConfig::default())
            .tree("WORKGROUP", "IPC$", || Ok(MockTree::smb2("master", "IPC$")));
        let error = EnumerationOrchestrator::new(&ctx)
            .list(&ResourceLocator::workgroup("WORKGROUP"), &EnumerationRequest::new())
            .unwrap_err();
        assert!(error.is_request());
    }

    type Log = Rc<RefCell<Vec<String>>>;

    /// An SMB2 share whose single directory holds `entries`.
    fn smb2_share(ctx: MockContext, host: &'static str, share: &'static str, entries: Vec<(&'static str, SMBFileAttributes)>, log: Log) -> MockContext {
        ctx.tree(host, share, move || {
            let entries = entries.clone();
            let log = log.clone();
            let mut served = false;
            Ok(MockTree::smb2(host, share).on_call(move |body| match body {
                SMBRequestBody::CreateRequest(create) => {
                    log.borrow_mut().push(format!("create {}", create.file_name()));
                    Reply::Body(SMBResponseBody::CreateResponse(create_response()))
                }
                SMBRequestBody::QueryDirectoryRequest(query) => {
                    log.borrow_mut().push(format!("query {}", query.search_pattern()));
                    if served || entries.is_empty() {
                        return Reply::Status(if served { NTStatus::NoMoreFiles } else { NTStatus::NoSuchFile });
                    }
                    served = true;
                    Reply::Body(SMBResponseBody::QueryDirectoryResponse(SMBQueryDirectoryResponse::new(directory_buffer(&entries))))
                }
                SMBRequestBody::CloseRequest(_) => {
                    log.borrow_mut().push("close".into());
                    Reply::Body(SMBResponseBody::CloseResponse(close_response()))
                }
                _ => Reply::Status(NTStatus::InvalidParameter),
            }))
        })
    }

    fn plain_server(host: &'static str) -> MockContext {
        MockContext::new(SMBClientConfig::default())
            .tree(host, "IPC$", move || Ok(MockTree::smb2(host, "IPC$")))
    }

    fn sample_directory() -> Vec<(&'static str, SMBFileAttributes)> {
        vec![
            (".", SMBFileAttributes::DIRECTORY),
            ("..", SMBFileAttributes::DIRECTORY),
            ("a.txt", SMBFileAttributes::ARCHIVE),
            ("sub", SMBFileAttributes::DIRECTORY),
            ("secret", SMBFileAttributes::HIDDEN),
        ]
    }

    #[test]
    fn smb2_directory_listing_skips_dot_entries_and_closes() {
        let log = Log::default();
        let ctx = smb2_share(plain_server("server"), "server", "share", sample_directory(), log.clone());
        let names = list(&ctx, "smb://server/share/dir/", &EnumerationRequest::new()).unwrap();
        assert_eq!(names, vec!["a.txt", "sub/", "secret"]);
        assert_eq!(*log.borrow(), vec!["create dir", "query *", "query *", "close"]);
    }

    #[test]
    fn empty_directory_is_an_empty_listing() {
        let log = Log::default();
        let ctx = smb2_share(plain_server("server"), "server", "share", Vec::new(), log.clone());
        let names = list(&ctx, "smb://server/share/", &EnumerationRequest::new()).unwrap();
        assert!(names.is_empty());
        assert_eq!(*log.borrow(), vec!["create ", "query *", "close"]);
    }

    #[test]
    fn dos_filter_is_pushed_into_the_search() {
        let log = Log::default();
        let ctx = smb2_share(plain_server("server"), "server", "share", sample_directory(), log.clone());
        let request = EnumerationRequest::new()
            .with_filter(DosFileFilter::new(Some("s*".into()), SMBFileAttributes::DIRECTORY));
        let names = list(&ctx, "smb://server/share/", &request).unwrap();
        assert_eq!(names, vec!["sub/"]);
        assert!(log.borrow().contains(&"query s*".to_string()));
    }

    #[test]
    fn directory_in_dfs_namespace_is_listed_at_the_link_target() {
        let log = Log::default();
        let ctx = MockContext::new(SMBClientConfig::default())
            .tree("fs", "IPC$", || Ok(MockTree::smb1("fs", "IPC$").dfs().on_transact(|transaction| {
                match referral_path(transaction).as_deref() {
                    Some(path) if path.starts_with("\\fs\\dfs") =>
                        referral_reply(storage_response("\\fs\\dfs", 1, 600, &[("\\fs\\dfs", "\\store1\\dfsroot")])),
                    _ => Err(SMBError::status_error(NTStatus::NotFound)),
                }
            })))
            .tree("store1", "IPC$", || Ok(MockTree::smb1("store1", "IPC$").dfs().on_transact(|transaction| {
                match referral_path(transaction).as_deref() {
                    Some(path) if path.starts_with("\\store1\\dfsroot\\docs") =>
                        referral_reply(storage_response("\\store1\\dfsroot\\docs", 0, 300, &[("\\store1\\dfsroot\\docs", "\\filer2\\docs")])),
                    _ => Err(SMBError::status_error(NTStatus::PathNotCovered)),
                }
            })));
        let ctx = smb2_share(ctx, "filer2", "docs", vec![("q3.xlsx", SMBFileAttributes::ARCHIVE)], log.clone());

        let resources = EnumerationOrchestrator::new(&ctx)
            .list_files(&ResourceLocator::parse("smb://fs/dfs/docs/reports/").unwrap(), &EnumerationRequest::new())
            .unwrap();
        assert_eq!(log.borrow()[0], "create reports");
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].locator().url(), "smb://fs/dfs/docs/reports/q3.xlsx");
    }

    fn smb1_share(pages: Vec<SMBTransactionResponse>) -> MockContext {
        let pages = Rc::new(RefCell::new(pages));
        plain_server("legacy")
            .tree("legacy", "files", move || {
                let pages = pages.clone();
                Ok(MockTree::smb1("legacy", "files").on_transact(move |transaction| {
                    match transaction.setup.first() {
                        Some(&TRANS2_FIND_FIRST2) | Some(&TRANS2_FIND_NEXT2) if !pages.borrow().is_empty() => Ok(pages.borrow_mut().remove(0)),
                        _ => Err(SMBError::status_error(NTStatus::NoMoreFiles)),
                    }
                }))
            })
    }

    fn first_page() -> SMBTransactionResponse {
        SMBTransactionResponse::new(
            vec![7, 0, 2, 0, 0, 0, 0, 0, 0, 0],
            directory_buffer(&[("a.txt", SMBFileAttributes::ARCHIVE), ("b.txt", SMBFileAttributes::ARCHIVE)]),
        )
    }

    #[test]
    fn smb1_directory_listing_pages_with_find_next() {
        let last_page = SMBTransactionResponse::new(vec![1, 0, 1, 0, 0, 0, 0, 0], directory_buffer(&[("c.txt", SMBFileAttributes::ARCHIVE)]));
        let ctx = smb1_share(vec![first_page(), last_page]);
        let names = list(&ctx, "smb://legacy/files/", &EnumerationRequest::new()).unwrap();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
        assert_eq!(ctx.count("find_close"), 0);
    }

    #[test]
    fn abandoned_smb1_search_is_closed() {
        let ctx = smb1_share(vec![first_page()]);
        let request = EnumerationRequest::new();
        let mut iterator = EnumerationOrchestrator::new(&ctx)
            .enumerate(&ResourceLocator::parse("smb://legacy/files/").unwrap(), &request)
            .unwrap();
        assert_eq!(iterator.next().unwrap().unwrap().name(), "a.txt");
        drop(iterator);
        assert_eq!(ctx.count("find_close 7"), 1);
    }

    #[test]
    fn empty_smb1_page_without_end_closes_the_search() {
        let empty_next = SMBTransactionResponse::new(vec![0, 0, 0, 0, 0, 0, 0, 0], Vec::new());
        let ctx = smb1_share(vec![first_page(), empty_next]);
        let names = list(&ctx, "smb://legacy/files/", &EnumerationRequest::new()).unwrap();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(ctx.count("find_close 7"), 1);
    }

    #[test]
    fn empty_smb1_first_page_closes_the_search() {
        let empty_first = SMBTransactionResponse::new(vec![7, 0, 0, 0, 0, 0, 0, 0, 0, 0], Vec::new());
        let ctx = smb1_share(vec![empty_first]);
        let names = list(&ctx, "smb://legacy/files/", &EnumerationRequest::new()).unwrap();
        assert!(names.is_empty());
        assert_eq!(ctx.count("find_close 7"), 1);
    }
}
