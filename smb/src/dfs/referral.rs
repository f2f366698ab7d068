use std::time::{Duration, Instant};

use smb_core::SMBResult;

use crate::protocol::body::ioctl::dfs_referral::{split_network_address, DfsReferralResponse, DfsReferralTarget, DfsServerType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferralKind {
    Root,
    Link,
    Domain,
    DomainController,
}

/// Position of a hop in its chain. A terminal hop's `next` is itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferralLink {
    Intermediate(Box<ReferralData>),
    Terminal,
}

/// One target of a DFS referral, linked to the alternate targets that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralData {
    kind: ReferralKind,
    server: String,
    share: String,
    /// Path below the target share, `\`-separated, without a leading separator.
    path: String,
    /// Characters of the requested in-share path this referral covers.
    path_consumed: usize,
    ttl: Duration,
    expiration: Instant,
    link: ReferralLink,
}

impl ReferralData {
    pub fn new<S: Into<String>, T: Into<String>, U: Into<String>>(kind: ReferralKind, server: S, share: T, path: U, path_consumed: usize, ttl: Duration) -> Self {
        Self {
            kind,
            server: server.into(),
            share: share.into(),
            path: path.into(),
            path_consumed,
            ttl,
            expiration: Instant::now() + ttl,
            link: ReferralLink::Terminal,
        }
    }

    /// Links `hops` in order; the last one becomes terminal.
    pub fn chain(hops: Vec<ReferralData>) -> Option<ReferralData> {
        hops.into_iter().rev().fold(None, |next, mut hop| {
            hop.link = match next {
                Some(next) => ReferralLink::Intermediate(Box::new(next)),
                None => ReferralLink::Terminal,
            };
            Some(hop)
        })
    }

    pub fn kind(&self) -> ReferralKind {
        self.kind
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn share(&self) -> &str {
        &self.share
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn path_consumed(&self) -> usize {
        self.path_consumed
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn expiration(&self) -> Instant {
        self.expiration
    }

    pub fn link(&self) -> &ReferralLink {
        &self.link
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.link, ReferralLink::Terminal)
    }

    /// The next target in the chain; the terminal hop returns itself.
    pub fn next(&self) -> &ReferralData {
        match &self.link {
            ReferralLink::Intermediate(next) => &**next,
            ReferralLink::Terminal => self,
        }
    }

    /// Every hop from this one to the terminal, in order.
    pub fn hops(&self) -> ReferralHops<'_> {
        ReferralHops { current: Some(self) }
    }
}

pub struct ReferralHops<'a> {
    current: Option<&'a ReferralData>,
}

impl<'a> Iterator for ReferralHops<'a> {
    type Item = &'a ReferralData;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = match &current.link {
            ReferralLink::Intermediate(next) => Some(&**next),
            ReferralLink::Terminal => None,
        };
        Some(current)
    }
}

/// Storage targets of a root or link referral for `in_share_path`, which was
/// requested as `\{server}\{share}{in_share_path}`.
pub(crate) fn storage_chain(response: &DfsReferralResponse, request_prefix_chars: usize, in_share_path: &str) -> SMBResult<Option<ReferralData>> {
    let path_consumed = consumed_in_share(response.chars_consumed(), request_prefix_chars, in_share_path);
    let mut hops = Vec::with_capacity(response.entries.len());
    for entry in &response.entries {
        if let DfsReferralTarget::Storage { network_address, .. } = &entry.target {
            let (server, share, path) = split_network_address(network_address)?;
            let kind = match entry.server_type {
                DfsServerType::Root => ReferralKind::Root,
                DfsServerType::Link => ReferralKind::Link,
            };
            hops.push(ReferralData::new(kind, server, share, path, path_consumed, Duration::from_secs(entry.ttl as u64)));
        }
    }
    Ok(ReferralData::chain(hops))
}

/// Domain controllers listed by a DC referral, in preference order.
pub(crate) fn dc_chain(response: &DfsReferralResponse) -> Option<ReferralData> {
    let hops = response.entries.iter()
        .filter_map(|entry| match &entry.target {
            DfsReferralTarget::NameList { expanded_names, .. } => Some((entry.ttl, expanded_names)),
            _ => None,
        })
        .flat_map(|(ttl, names)| names.iter().map(move |name| {
            ReferralData::new(ReferralKind::DomainController, trim_name(name), "", "", 0, Duration::from_secs(ttl as u64))
        }))
        .collect();
    ReferralData::chain(hops)
}

/// Lowercased domain names from a domain referral.
pub(crate) fn domain_names(response: &DfsReferralResponse) -> Vec<String> {
    response.entries.iter()
        .filter_map(|entry| match &entry.target {
            DfsReferralTarget::NameList { special_name, .. } => Some(trim_name(special_name).to_lowercase()),
            _ => None,
        })
        .filter(|name| !name.is_empty())
        .collect()
}

fn trim_name(name: &str) -> &str {
    name.trim_start_matches('\\')
}

/// Server-reported consumption covers `\server\share` too; referrals keep
/// only the in-share part, without a trailing separator.
fn consumed_in_share(total: usize, prefix: usize, in_share_path: &str) -> usize {
    let chars = in_share_path.chars().collect::<Vec<_>>();
    let mut consumed = total.saturating_sub(prefix).min(chars.len());
    if consumed > 0 && chars[consumed - 1] == '\\' {
        consumed -= 1;
    }
    consumed
}
