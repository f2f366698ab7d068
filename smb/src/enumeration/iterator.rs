//! Lazy listings. Each entry source yields [`FileEntry`] values with the name
//! filter already applied; [`SMBResourceIterator`] turns them into resources
//! under the listed parent and applies the resource filter.

use std::collections::VecDeque;

use smb_core::error::SMBError;
use smb_core::logging::{debug, trace};
use smb_core::nt_status::NTStatus;
use smb_core::SMBResult;

use crate::client::connection::TreeHandle;
use crate::client::session::SessionExt;
use crate::enumeration::file_entry::{FileEntry, SMBResource};
use crate::enumeration::filter::{ResourceFilter, ResourceNameFilter};
use crate::enumeration::locator::{ResourceLocator, ResourceType};
use crate::protocol::body::close::SMBCloseRequest;
use crate::protocol::body::create::file_attributes::SMBFileAttributes;
use crate::protocol::body::create::file_id::SMBFileId;
use crate::protocol::body::create::SMBCreateRequest;
use crate::protocol::body::query_directory::directory_info::FileBothDirectoryInformation;
use crate::protocol::body::query_directory::flags::SMBQueryDirectoryFlags;
use crate::protocol::body::query_directory::SMBQueryDirectoryRequest;
use crate::protocol::legacy::{rap, trans2};

pub(crate) type EntrySource<'a> = Box<dyn Iterator<Item = SMBResult<FileEntry>> + 'a>;

fn name_accepted(filter: Option<&dyn ResourceNameFilter>, parent: &ResourceLocator, name: &str) -> SMBResult<bool> {
    match filter {
        Some(filter) => filter.accept(parent, name),
        None => Ok(true),
    }
}

/// Resources below `parent`, in source order.
pub struct SMBResourceIterator<'a> {
    parent: ResourceLocator,
    entries: EntrySource<'a>,
    filter: Option<&'a dyn ResourceFilter>,
}

impl<'a> SMBResourceIterator<'a> {
    pub(crate) fn new(parent: ResourceLocator, entries: EntrySource<'a>, filter: Option<&'a dyn ResourceFilter>) -> Self {
        Self { parent, entries, filter }
    }

    pub fn parent(&self) -> &ResourceLocator {
        &self.parent
    }

    fn adapt(&self, entry: FileEntry) -> SMBResult<Option<SMBResource>> {
        let locator = match entry.entry_type() {
            ResourceType::Server => ResourceLocator::server(entry.name()),
            ResourceType::Workgroup => ResourceLocator::workgroup(entry.name()),
            _ => self.parent.child(&entry.display_name())?,
        };
        let resource = SMBResource::new(locator, entry);
        match self.filter {
            Some(filter) if !filter.accept(&resource)? => Ok(None),
            _ => Ok(Some(resource)),
        }
    }
}

impl Iterator for SMBResourceIterator<'_> {
    type Item = SMBResult<SMBResource>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };
            match self.adapt(entry) {
                Ok(Some(resource)) => return Some(Ok(resource)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Servers of a workgroup, or workgroups of the network, via RAP
/// `NetServerEnum2`/`NetServerEnum3` on an SMB1 IPC$ tree.
pub(crate) struct ServerEnumIterator<'a> {
    tree: Box<dyn TreeHandle>,
    parent: ResourceLocator,
    name_filter: Option<&'a dyn ResourceNameFilter>,
    domain: String,
    server_types: u32,
    buffer_size: u16,
    pending: VecDeque<FileEntry>,
    last_name: Option<String>,
    more: bool,
}

impl<'a> ServerEnumIterator<'a> {
    /// Issues the first request immediately so setup failures surface to
    /// the caller rather than the first `next`.
    pub(crate) fn open(
        tree: Box<dyn TreeHandle>,
        parent: ResourceLocator,
        domain: String,
        buffer_size: u16,
        name_filter: Option<&'a dyn ResourceNameFilter>,
    ) -> SMBResult<Self> {
        if tree.is_smb2() {
            return Err(SMBError::request_error("server browsing requires an SMB1 connection"));
        }
        let (domain, server_types) = if parent.host().is_empty() {
            (domain, rap::SV_TYPE_DOMAIN_ENUM)
        } else {
            (parent.host().to_string(), rap::SV_TYPE_ALL)
        };
        let mut iterator = Self {
            tree,
            parent,
            name_filter,
            domain,
            server_types,
            buffer_size,
            pending: VecDeque::new(),
            last_name: None,
            more: true,
        };
        iterator.fetch()?;
        Ok(iterator)
    }

    fn fetch(&mut self) -> SMBResult<()> {
        let request = match &self.last_name {
            None => rap::net_server_enum2(self.buffer_size, self.server_types, &self.domain),
            Some(last) => rap::net_server_enum3(self.buffer_size, self.server_types, &self.domain, last),
        };
        let response = rap::parse_net_server_enum(&self.tree.transact(request)?)?;
        if response.status != rap::ERROR_SUCCESS && !response.is_more_data() {
            return Err(rap::rap_status_error(response.status));
        }
        self.more = response.is_more_data();
        let previous = self.last_name.take();
        self.last_name = response.entries.last().map(|server| server.name.clone());
        let domains = self.server_types == rap::SV_TYPE_DOMAIN_ENUM;
        for server in response.entries {
            // a continuation page starts with the last name of the previous one
            if previous.as_deref() == Some(server.name.as_str()) {
                continue;
            }
            if !name_accepted(self.name_filter, &self.parent, &server.name)? {
                continue;
            }
            let comment = Some(server.comment);
            self.pending.push_back(if domains { FileEntry::workgroup(server.name, comment) } else { FileEntry::server(server.name, comment) });
        }
        if self.last_name.is_none() || self.last_name == previous {
            self.more = false;
        }
        Ok(())
    }
}

impl Iterator for ServerEnumIterator<'_> {
    type Item = SMBResult<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.pending.pop_front() {
                return Some(Ok(entry));
            }
            if !self.more {
                return None;
            }
            if let Err(e) = self.fetch() {
                self.more = false;
                return Some(Err(e));
            }
        }
    }
}

/// Search options shared by both directory iterators.
pub(crate) struct DirectorySearch<'a> {
    pub(crate) wildcard: String,
    pub(crate) attributes: SMBFileAttributes,
    pub(crate) name_filter: Option<&'a dyn ResourceNameFilter>,
    pub(crate) list_count: u16,
    pub(crate) list_size: u32,
    pub(crate) buffer_size: u16,
}

impl DirectorySearch<'_> {
    fn accept(&self, parent: &ResourceLocator, info: &FileBothDirectoryInformation) -> SMBResult<bool> {
        if info.is_dot_entry() || info.file_name.is_empty() {
            return Ok(false);
        }
        if !info.attributes.matches_search(self.attributes) {
            return Ok(false);
        }
        name_accepted(self.name_filter, parent, &info.file_name)
    }
}

fn is_empty_listing(e: &SMBError) -> bool {
    e.is_status(NTStatus::NoSuchFile) || e.is_status(NTStatus::NoMoreFiles) || e.is_status(NTStatus::ObjectNameNotFound)
}

/// SMB2 directory listing: an open handle paged with QUERY_DIRECTORY and
/// closed once the listing ends or the iterator is dropped.
pub(crate) struct DirectoryIterator2<'a> {
    tree: Box<dyn TreeHandle>,
    parent: ResourceLocator,
    search: DirectorySearch<'a>,
    file_id: Option<SMBFileId>,
    pending: VecDeque<FileBothDirectoryInformation>,
}

impl<'a> DirectoryIterator2<'a> {
    /// Lists `target`, the resolved location of `parent`. Names are reported
    /// to the name filter against `parent`.
    pub(crate) fn open(tree: Box<dyn TreeHandle>, parent: ResourceLocator, target: &ResourceLocator, search: DirectorySearch<'a>) -> SMBResult<Self> {
        let mut iterator = Self {
            tree,
            parent,
            search,
            file_id: None,
            pending: VecDeque::new(),
        };
        let path = target.dfs_path().trim_start_matches('\\').to_string();
        let created = iterator.tree.call(SMBCreateRequest::open_directory(path))?;
        iterator.file_id = Some(created.file_id());
        if let Err(e) = iterator.query(SMBQueryDirectoryFlags::RESTART_SCANS) {
            iterator.close();
            if !is_empty_listing(&e) {
                return Err(e);
            }
        }
        Ok(iterator)
    }

    fn query(&mut self, flags: SMBQueryDirectoryFlags) -> SMBResult<()> {
        let Some(file_id) = self.file_id else {
            return Ok(());
        };
        let request = SMBQueryDirectoryRequest::new(file_id, self.search.wildcard.as_str(), flags, self.search.list_size);
        let response = self.tree.call(request)?;
        let entries = response.entries()?;
        trace!("directory page of {} entries", entries.len());
        if entries.is_empty() {
            self.close();
        }
        self.pending.extend(entries);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(file_id) = self.file_id.take() {
            if let Err(e) = self.tree.call(SMBCloseRequest::new(file_id)) {
                debug!("closing directory handle failed: {}", e);
            }
        }
    }
}

impl Iterator for DirectoryIterator2<'_> {
    type Item = SMBResult<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(info) = self.pending.pop_front() {
                match self.search.accept(&self.parent, &info) {
                    Ok(true) => return Some(Ok(FileEntry::from_directory_info(&info))),
                    Ok(false) => continue,
                    Err(e) => return Some(Err(e)),
                }
            }
            self.file_id?;
            match self.query(SMBQueryDirectoryFlags::empty()) {
                Ok(()) => continue,
                Err(e) if e.is_status(NTStatus::NoMoreFiles) => {
                    self.close();
                    return None;
                }
                Err(e) => {
                    self.close();
                    return Some(Err(e));
                }
            }
        }
    }
}

impl Drop for DirectoryIterator2<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

/// SMB1 directory listing over `TRANS2_FIND_FIRST2`/`FIND_NEXT2`.
pub(crate) struct DirectoryIterator1<'a> {
    tree: Box<dyn TreeHandle>,
    parent: ResourceLocator,
    search: DirectorySearch<'a>,
    sid: Option<u16>,
    resume: Option<(u32, String)>,
    pending: VecDeque<FileBothDirectoryInformation>,
}

impl<'a> DirectoryIterator1<'a> {
    pub(crate) fn open(tree: Box<dyn TreeHandle>, parent: ResourceLocator, target: &ResourceLocator, search: DirectorySearch<'a>) -> SMBResult<Self> {
        let mut iterator = Self {
            tree,
            parent,
            search,
            sid: None,
            resume: None,
            pending: VecDeque::new(),
        };
        let pattern = format!("{}{}", target.unc_path(), iterator.search.wildcard);
        let request = trans2::find_first2(&pattern, iterator.search.attributes, iterator.search.list_count, iterator.search.buffer_size);
        let response = match iterator.tree.transact(request).and_then(|response| trans2::parse_find_first2(&response)) {
            Ok(response) => response,
            Err(e) if is_empty_listing(&e) => return Ok(iterator),
            Err(e) => return Err(e),
        };
        iterator.accept_page(response);
        Ok(iterator)
    }

    fn accept_page(&mut self, response: trans2::FindResponse) {
        if let Some(sid) = response.sid {
            self.sid = Some(sid);
        }
        self.resume = response.resume_point().map(|(key, name)| (key, name.to_string()));
        let end = response.end_of_search;
        self.pending.extend(response.entries);
        if end {
            // the server closes the search itself once it reports the end
            self.sid = None;
            self.resume = None;
        }
    }

    fn fetch_next(&mut self) -> SMBResult<()> {
        let (Some(sid), Some((resume_key, last_name))) = (self.sid, self.resume.take()) else {
            // nothing to resume from, but the search may still be open
            self.close();
            return Ok(());
        };
        let request = trans2::find_next2(sid, resume_key, &last_name, self.search.list_count, self.search.buffer_size);
        let response = self.tree.transact(request)?;
        self.accept_page(trans2::parse_find_next2(&response)?);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(sid) = self.sid.take() {
            if let Err(e) = self.tree.find_close(sid) {
                debug!("FIND_CLOSE2 failed: {}", e);
            }
        }
    }
}

impl Iterator for DirectoryIterator1<'_> {
    type Item = SMBResult<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(info) = self.pending.pop_front() {
                match self.search.accept(&self.parent, &info) {
                    Ok(true) => return Some(Ok(FileEntry::from_directory_info(&info))),
                    Ok(false) => continue,
                    Err(e) => return Some(Err(e)),
                }
            }
            self.sid?;
            match self.fetch_next() {
                Ok(()) => continue,
                Err(e) if e.is_status(NTStatus::NoMoreFiles) => {
                    self.sid = None;
                    return None;
                }
                Err(e) => {
                    self.close();
                    return Some(Err(e));
                }
            }
        }
    }
}

impl Drop for DirectoryIterator1<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
