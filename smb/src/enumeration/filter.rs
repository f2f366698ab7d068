use smb_core::SMBResult;

use crate::enumeration::file_entry::SMBResource;
use crate::enumeration::locator::ResourceLocator;
use crate::protocol::body::create::file_attributes::SMBFileAttributes;

/// Decides on a bare name before a resource is built for it.
pub trait ResourceNameFilter {
    fn accept(&self, parent: &ResourceLocator, name: &str) -> SMBResult<bool>;
}

impl<F> ResourceNameFilter for F where F: Fn(&ResourceLocator, &str) -> bool {
    fn accept(&self, parent: &ResourceLocator, name: &str) -> SMBResult<bool> {
        Ok(self(parent, name))
    }
}

pub trait ResourceFilter {
    fn accept(&self, resource: &SMBResource) -> SMBResult<bool>;

    /// Filters that a directory search can evaluate itself expose their
    /// wildcard and attribute mask here.
    fn as_dos_filter(&self) -> Option<&DosFileFilter> {
        None
    }
}

impl<F> ResourceFilter for F where F: Fn(&SMBResource) -> bool {
    fn accept(&self, resource: &SMBResource) -> SMBResult<bool> {
        Ok(self(resource))
    }
}

/// Classic DOS search filter: an optional wildcard and an attribute mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DosFileFilter {
    wildcard: Option<String>,
    attributes: SMBFileAttributes,
}

impl DosFileFilter {
    pub fn new(wildcard: Option<String>, attributes: SMBFileAttributes) -> Self {
        Self { wildcard, attributes }
    }

    pub fn wildcard(&self) -> Option<&str> {
        self.wildcard.as_deref()
    }

    pub fn attributes(&self) -> SMBFileAttributes {
        self.attributes
    }
}

impl ResourceFilter for DosFileFilter {
    fn accept(&self, resource: &SMBResource) -> SMBResult<bool> {
        Ok(resource.attributes().intersects(self.attributes))
    }

    fn as_dos_filter(&self) -> Option<&DosFileFilter> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::enumeration::file_entry::FileEntry;

    use super::*;

    #[test]
    fn dos_filter_matches_any_attribute_bit() {
        let filter = DosFileFilter::new(None, SMBFileAttributes::DIRECTORY);
        let share = SMBResource::new(ResourceLocator::share("server", "docs"), FileEntry::share("docs", 0, None));
        assert!(filter.accept(&share).unwrap());
        let hidden_only = DosFileFilter::new(Some("*.txt".into()), SMBFileAttributes::HIDDEN);
        assert!(!hidden_only.accept(&share).unwrap());
        assert_eq!(hidden_only.as_dos_filter().and_then(DosFileFilter::wildcard), Some("*.txt"));
    }

    #[test]
    fn closures_are_filters() {
        let starts_with_a = |_: &ResourceLocator, name: &str| name.starts_with('a');
        let parent = ResourceLocator::server("server");
        assert!(starts_with_a.accept(&parent, "alpha").unwrap());
        assert!(!ResourceNameFilter::accept(&starts_with_a, &parent, "beta").unwrap());
    }
}
