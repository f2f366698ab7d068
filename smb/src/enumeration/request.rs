use crate::enumeration::filter::{ResourceFilter, ResourceNameFilter};
use crate::protocol::body::create::file_attributes::SMBFileAttributes;

/// What to list and how to narrow it. Defaults to every entry, including
/// hidden and system files.
pub struct EnumerationRequest<'a> {
    wildcard: String,
    search_attributes: SMBFileAttributes,
    name_filter: Option<Box<dyn ResourceNameFilter + 'a>>,
    filter: Option<Box<dyn ResourceFilter + 'a>>,
}

impl Default for EnumerationRequest<'_> {
    fn default() -> Self {
        Self {
            wildcard: "*".into(),
            search_attributes: SMBFileAttributes::DIRECTORY | SMBFileAttributes::HIDDEN | SMBFileAttributes::SYSTEM,
            name_filter: None,
            filter: None,
        }
    }
}

impl<'a> EnumerationRequest<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wildcard<T: Into<String>>(self, wildcard: T) -> Self {
        Self { wildcard: wildcard.into(), ..self }
    }

    pub fn with_search_attributes(self, search_attributes: SMBFileAttributes) -> Self {
        Self { search_attributes, ..self }
    }

    pub fn with_name_filter<F: ResourceNameFilter + 'a>(self, filter: F) -> Self {
        Self { name_filter: Some(Box::new(filter)), ..self }
    }

    pub fn with_filter<F: ResourceFilter + 'a>(self, filter: F) -> Self {
        Self { filter: Some(Box::new(filter)), ..self }
    }

    pub fn wildcard(&self) -> &str {
        &self.wildcard
    }

    pub fn search_attributes(&self) -> SMBFileAttributes {
        self.search_attributes
    }

    pub fn name_filter(&self) -> Option<&dyn ResourceNameFilter> {
        self.name_filter.as_deref()
    }

    pub fn filter(&self) -> Option<&dyn ResourceFilter> {
        self.filter.as_deref()
    }

    /// Wildcard and attributes a directory search should send, taking them
    /// from a DOS filter when one is set.
    pub(crate) fn search_parameters(&self) -> (&str, SMBFileAttributes) {
        match self.filter().and_then(|filter| filter.as_dos_filter()) {
            Some(dos) => (dos.wildcard().unwrap_or(&self.wildcard), dos.attributes()),
            None => (&self.wildcard, self.search_attributes),
        }
    }
}
