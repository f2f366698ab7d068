use std::fmt::{Display, Formatter};
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use smb_core::error::SMBError;
use smb_core::SMBResult;

use crate::dfs::referral::ReferralData;

const SCHEME: &str = "smb://";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Workgroup,
    Server,
    Share,
    Printer,
    NamedPipe,
    Filesystem,
}

/// A parsed `smb://host/share/path` location. Values are immutable: moving the
/// address cursor or following a referral produces a new locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceLocator {
    host: String,
    /// URL path: empty or `/` for a server, `/share/...` below it. A trailing
    /// `/` marks a container.
    path: String,
    workgroup: bool,
    addresses: Vec<IpAddr>,
    address_index: usize,
}

impl ResourceLocator {
    pub fn parse(url: &str) -> SMBResult<Self> {
        let rest = url.get(..SCHEME.len())
            .filter(|scheme| scheme.eq_ignore_ascii_case(SCHEME))
            .map(|_| &url[SCHEME.len()..])
            .ok_or_else(|| SMBError::request_error(format!("{} is not an smb URL", url)))?;
        let (host, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        if host.is_empty() && !(path.is_empty() || path == "/") {
            return Err(SMBError::request_error(format!("{} has a path but no host", url)));
        }
        if path.contains("//") {
            return Err(SMBError::request_error(format!("{} has an empty path component", url)));
        }
        Ok(Self::from_parts(host, path))
    }

    /// `smb://`, the list of workgroups and domains.
    pub fn network() -> Self {
        Self::from_parts("", "/")
    }

    pub fn workgroup<T: Into<String>>(name: T) -> Self {
        Self {
            workgroup: true,
            ..Self::from_parts(name, "/")
        }
    }

    pub fn server<T: Into<String>>(host: T) -> Self {
        Self::from_parts(host, "/")
    }

    pub fn share<T: Into<String>>(host: T, share: &str) -> Self {
        Self::from_parts(host, format!("/{}/", share))
    }

    fn from_parts<T: Into<String>, U: Into<String>>(host: T, path: U) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            workgroup: false,
            addresses: Vec::new(),
            address_index: 0,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self) -> String {
        format!("{}{}{}", SCHEME, self.host, self.path)
    }

    pub fn share_name(&self) -> Option<&str> {
        self.path.trim_start_matches('/').split('/').next().filter(|share| !share.is_empty())
    }

    /// Share-relative path with `\` separators: `\` for the share itself,
    /// `\dir\` for a directory.
    pub fn unc_path(&self) -> String {
        let share_len = self.share_name().map_or(0, |share| share.len() + 1);
        let below = &self.path[(share_len + 1).min(self.path.len())..];
        format!("\\{}", below.replace('/', "\\"))
    }

    /// Share-relative path as DFS matches it: no trailing separator, empty for
    /// the share root.
    pub fn dfs_path(&self) -> String {
        let unc = self.unc_path();
        let trimmed = unc.trim_end_matches('\\');
        trimmed.to_string()
    }

    pub fn resource_type(&self) -> ResourceType {
        if self.host.is_empty() || self.workgroup {
            return ResourceType::Workgroup;
        }
        match self.share_name() {
            None => ResourceType::Server,
            Some(share) if self.unc_path() == "\\" => {
                if share.eq_ignore_ascii_case("IPC$") { ResourceType::NamedPipe } else { ResourceType::Share }
            }
            Some(_) => ResourceType::Filesystem,
        }
    }

    /// Names a server rather than something on it.
    pub fn is_root(&self) -> bool {
        self.share_name().is_none()
    }

    pub fn is_container(&self) -> bool {
        self.path.is_empty() || self.path.ends_with('/')
    }

    pub fn is_workgroup(&self) -> bool {
        self.workgroup
    }

    /// Last component, with its trailing `/` for containers.
    pub fn name(&self) -> String {
        let trimmed = self.path.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) => self.path[idx + 1..].to_string(),
            None if self.host.is_empty() => SCHEME.to_string(),
            None => format!("{}/", self.host),
        }
    }

    /// A child of this container. `name` ends in `/` for containers.
    pub fn child(&self, name: &str) -> SMBResult<Self> {
        if !self.path.ends_with('/') {
            return Err(SMBError::request_error(format!("{} is not a directory", self.url())));
        }
        let trimmed = name.trim_end_matches('/');
        if trimmed.is_empty() || trimmed.contains('/') {
            return Err(SMBError::request_error(format!("invalid child name '{}'", name)));
        }
        Ok(Self {
            path: format!("{}{}", self.path, name),
            ..self.clone()
        })
    }

    pub fn with_addresses(self, addresses: Vec<IpAddr>) -> Self {
        Self {
            addresses,
            address_index: 0,
            ..self
        }
    }

    /// The locator addressing only `address`, for operations that must not
    /// re-resolve the host.
    pub fn pinned_to(&self, address: IpAddr) -> Self {
        self.clone().with_addresses(vec![address])
    }

    pub fn address(&self) -> Option<IpAddr> {
        self.addresses.get(self.address_index).copied()
    }

    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    /// The same resource at the host's next address, if there is one.
    pub fn next_address(&self) -> Option<Self> {
        let next = self.address_index + 1;
        (next < self.addresses.len()).then(|| Self {
            address_index: next,
            ..self.clone()
        })
    }

    /// Retargets through `referral`. The part of the share-relative path the
    /// referral did not consume is appended to the referral's target path.
    pub fn redirect(&self, referral: &ReferralData) -> Self {
        let remainder = self.dfs_path().chars().skip(referral.path_consumed()).collect::<String>();
        let components = referral.path().split('\\')
            .chain(remainder.split('\\'))
            .filter(|component| !component.is_empty())
            .collect::<Vec<_>>();
        let mut path = format!("/{}/", referral.share());
        if !components.is_empty() {
            path.push_str(&components.join("/"));
            if self.is_container() {
                path.push('/');
            }
        }
        Self::from_parts(referral.server(), path)
    }
}

impl Display for ResourceLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::dfs::referral::ReferralKind;

    use super::*;

    #[test]
    fn parses_each_resource_type() {
        assert_eq!(ResourceLocator::parse("smb://").unwrap().resource_type(), ResourceType::Workgroup);
        assert_eq!(ResourceLocator::parse("smb://server/").unwrap().resource_type(), ResourceType::Server);
        assert_eq!(ResourceLocator::parse("smb://server").unwrap().resource_type(), ResourceType::Server);
        assert_eq!(ResourceLocator::parse("smb://server/docs/").unwrap().resource_type(), ResourceType::Share);
        assert_eq!(ResourceLocator::parse("smb://server/IPC$/").unwrap().resource_type(), ResourceType::NamedPipe);
        assert_eq!(ResourceLocator::parse("SMB://server/docs/a/b.txt").unwrap().resource_type(), ResourceType::Filesystem);
        assert_eq!(ResourceLocator::workgroup("WORKGROUP").resource_type(), ResourceType::Workgroup);
    }

    #[test]
    fn rejects_malformed_urls() {
        assert!(ResourceLocator::parse("http://server/").unwrap_err().is_request());
        assert!(ResourceLocator::parse("smb:///share/").is_err());
        assert!(ResourceLocator::parse("smb://server//x").is_err());
    }

    #[test]
    fn unc_and_dfs_paths() {
        let locator = ResourceLocator::parse("smb://server/docs/reports/2024/").unwrap();
        assert_eq!(locator.share_name(), Some("docs"));
        assert_eq!(locator.unc_path(), "\\reports\\2024\\");
        assert_eq!(locator.dfs_path(), "\\reports\\2024");
        let share = ResourceLocator::share("server", "docs");
        assert_eq!(share.unc_path(), "\\");
        assert_eq!(share.dfs_path(), "");
    }

    #[test]
    fn names_keep_container_separator() {
        assert_eq!(ResourceLocator::parse("smb://server/docs/a/").unwrap().name(), "a/");
        assert_eq!(ResourceLocator::parse("smb://server/docs/a.txt").unwrap().name(), "a.txt");
        assert_eq!(ResourceLocator::server("server").name(), "server/");
    }

    #[test]
    fn child_requires_container() {
        let share = ResourceLocator::share("server", "docs");
        assert_eq!(share.child("dir/").unwrap().url(), "smb://server/docs/dir/");
        assert!(ResourceLocator::parse("smb://server/docs/file").unwrap().child("x").is_err());
        assert!(share.child("a/b").is_err());
    }

    #[test]
    fn advancing_the_address_cursor_leaves_the_original_untouched() {
        let first: IpAddr = "10.0.0.1".parse().unwrap();
        let second: IpAddr = "10.0.0.2".parse().unwrap();
        let locator = ResourceLocator::server("server").with_addresses(vec![first, second]);
        let advanced = locator.next_address().unwrap();
        assert_eq!(locator.address(), Some(first));
        assert_eq!(advanced.address(), Some(second));
        assert!(advanced.next_address().is_none());
        assert_eq!(locator.pinned_to(second).addresses(), &[second]);
    }

    #[test]
    fn redirect_keeps_unconsumed_path() {
        let locator = ResourceLocator::parse("smb://corp/dfs/projects/alpha/src/").unwrap();
        let referral = ReferralData::new(ReferralKind::Link, "fs1", "projects", "teams", "\\projects\\alpha".len(), Duration::from_secs(60));
        let redirected = locator.redirect(&referral);
        assert_eq!(redirected.url(), "smb://fs1/projects/teams/src/");
        assert_eq!(locator.url(), "smb://corp/dfs/projects/alpha/src/");

        let root = ReferralData::new(ReferralKind::Root, "fs2", "dfsroot", "", 0, Duration::from_secs(60));
        assert_eq!(ResourceLocator::share("corp", "dfs").redirect(&root).url(), "smb://fs2/dfsroot/");
    }
}
