use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::enumeration::locator::{ResourceLocator, ResourceType};
use crate::protocol::body::create::file_attributes::SMBFileAttributes;
use crate::protocol::body::FileTime;
use crate::protocol::body::query_directory::directory_info::FileBothDirectoryInformation;

const SHARE_TYPE_PRINT_QUEUE: u32 = 1;
const SHARE_TYPE_IPC: u32 = 3;

/// One listing record. Two entries are the same entry when name and
/// attributes match, whichever source produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    name: String,
    entry_type: ResourceType,
    attributes: SMBFileAttributes,
    created: FileTime,
    last_modified: FileTime,
    last_access: FileTime,
    size: u64,
    file_index: u32,
    remark: Option<String>,
}

impl FileEntry {
    fn container<T: Into<String>>(name: T, entry_type: ResourceType, remark: Option<String>) -> Self {
        Self {
            name: name.into(),
            entry_type,
            attributes: SMBFileAttributes::READONLY | SMBFileAttributes::DIRECTORY,
            created: FileTime::default(),
            last_modified: FileTime::default(),
            last_access: FileTime::default(),
            size: 0,
            file_index: 0,
            remark: remark.filter(|remark| !remark.is_empty()),
        }
    }

    /// A share as srvsvc or RAP reports it; the low word of `share_type` picks
    /// printer and pipe shares.
    pub fn share<T: Into<String>>(name: T, share_type: u32, remark: Option<String>) -> Self {
        let entry_type = match share_type & 0xFFFF {
            SHARE_TYPE_PRINT_QUEUE => ResourceType::Printer,
            SHARE_TYPE_IPC => ResourceType::NamedPipe,
            _ => ResourceType::Share,
        };
        Self::container(name, entry_type, remark)
    }

    pub fn server<T: Into<String>>(name: T, remark: Option<String>) -> Self {
        Self::container(name, ResourceType::Server, remark)
    }

    pub fn workgroup<T: Into<String>>(name: T, remark: Option<String>) -> Self {
        Self::container(name, ResourceType::Workgroup, remark)
    }

    pub fn from_directory_info(info: &FileBothDirectoryInformation) -> Self {
        Self {
            name: info.file_name.clone(),
            entry_type: ResourceType::Filesystem,
            attributes: info.attributes,
            created: info.creation_time,
            last_modified: info.last_write_time,
            last_access: info.last_access_time,
            size: info.end_of_file,
            file_index: info.file_index,
            remark: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_type(&self) -> ResourceType {
        self.entry_type
    }

    pub fn attributes(&self) -> SMBFileAttributes {
        self.attributes
    }

    pub fn created(&self) -> FileTime {
        self.created
    }

    pub fn last_modified(&self) -> FileTime {
        self.last_modified
    }

    pub fn last_access(&self) -> FileTime {
        self.last_access
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file_index(&self) -> u32 {
        self.file_index
    }

    pub fn remark(&self) -> Option<&str> {
        self.remark.as_deref()
    }

    pub fn is_container(&self) -> bool {
        self.entry_type != ResourceType::Filesystem || self.attributes.contains(SMBFileAttributes::DIRECTORY)
    }

    /// The name as a child of a listing, with a trailing `/` for containers.
    pub fn display_name(&self) -> String {
        if self.is_container() {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl PartialEq for FileEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.attributes == other.attributes
    }
}

impl Eq for FileEntry {}

impl Hash for FileEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.attributes.hash(state);
    }
}

/// A listed resource: its entry and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SMBResource {
    locator: ResourceLocator,
    entry: FileEntry,
}

impl SMBResource {
    pub(crate) fn new(locator: ResourceLocator, entry: FileEntry) -> Self {
        Self { locator, entry }
    }

    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    pub fn entry(&self) -> &FileEntry {
        &self.entry
    }

    pub fn name(&self) -> String {
        self.entry.display_name()
    }

    pub fn resource_type(&self) -> ResourceType {
        self.entry.entry_type()
    }

    pub fn attributes(&self) -> SMBFileAttributes {
        self.entry.attributes()
    }

    pub fn is_directory(&self) -> bool {
        self.entry.is_container()
    }

    pub fn size(&self) -> u64 {
        self.entry.size()
    }

    pub fn last_modified(&self) -> FileTime {
        self.entry.last_modified()
    }

    pub fn into_locator(self) -> ResourceLocator {
        self.locator
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn share_type_low_word_selects_kind() {
        assert_eq!(FileEntry::share("docs", 0, None).entry_type(), ResourceType::Share);
        assert_eq!(FileEntry::share("ADMIN$", 0x8000_0000, None).entry_type(), ResourceType::Share);
        assert_eq!(FileEntry::share("laser", 1, None).entry_type(), ResourceType::Printer);
        assert_eq!(FileEntry::share("IPC$", 0x8000_0003, None).entry_type(), ResourceType::NamedPipe);
    }

    #[test]
    fn identical_entries_from_two_sources_collapse() {
        let mut set = HashSet::new();
        set.insert(FileEntry::share("docs", 0, Some("from rpc".into())));
        set.insert(FileEntry::share("docs", 0, None));
        set.insert(FileEntry::share("public", 0, None));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn containers_display_with_separator() {
        assert_eq!(FileEntry::server("fileserver", None).display_name(), "fileserver/");
        assert!(FileEntry::share("docs", 0, Some(String::new())).remark().is_none());
    }
}
