use std::collections::HashSet;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use smb_core::error::SMBError;
use smb_core::logging::{debug, trace};
use smb_core::nt_status::NTStatus;
use smb_core::{SMBFromBytes, SMBResult, SMBToBytes};

use crate::client::config::SMBClientConfig;
use crate::client::connection::TreeHandle;
use crate::client::context::Context;
use crate::client::session::SessionExt;
use crate::dfs::cache::{normalize_path, ReferralCache};
use crate::dfs::referral::{dc_chain, domain_names, storage_chain, ReferralData, ReferralKind};
use crate::enumeration::locator::ResourceLocator;
use crate::protocol::body::ioctl::dfs_referral::{DfsReferralRequest, DfsReferralResponse};
use crate::protocol::body::ioctl::{SMBIoCtlCode, SMBIoCtlRequest};
use crate::protocol::legacy::trans2;

/// Trusted domains stay cached this many DFS TTLs.
const DOMAIN_TTL_FACTOR: u32 = 10;

const IPC_SHARE: &str = "IPC$";

#[derive(Debug)]
struct TrustedDomains {
    names: HashSet<String>,
    expires: Instant,
}

/// Resolves DFS namespaces to the servers that store them.
#[derive(Debug, Default)]
pub struct DfsResolver {
    referrals: ReferralCache,
    domain_controllers: ReferralCache,
    domains: Mutex<Option<TrustedDomains>>,
}

impl DfsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &ReferralCache {
        &self.referrals
    }

    /// Whether `name` is a domain the user's domain trusts (itself included).
    pub fn is_trusted_domain(&self, ctx: &dyn Context, name: &str) -> SMBResult<bool> {
        if ctx.config().is_dfs_disabled() || name.is_empty() {
            return Ok(false);
        }
        let domains = self.trusted_domains(ctx)?;
        Ok(domains.contains(&name.to_lowercase()))
    }

    fn trusted_domains(&self, ctx: &dyn Context) -> SMBResult<HashSet<String>> {
        if let Some(cached) = self.domains.lock().as_ref().filter(|cached| cached.expires > Instant::now()) {
            return Ok(cached.names.clone());
        }
        let auth_domain = ctx.credentials().domain();
        if auth_domain.is_empty() {
            return Ok(HashSet::new());
        }
        match fetch_trusted_domains(ctx, auth_domain) {
            Ok(names) => {
                trace!("trusted domains of {}: {:?}", auth_domain, names);
                *self.domains.lock() = Some(TrustedDomains {
                    names: names.clone(),
                    expires: Instant::now() + ctx.config().dfs_ttl() * DOMAIN_TTL_FACTOR,
                });
                Ok(names)
            }
            Err(error) if !ctx.config().is_dfs_strict_view() => {
                debug!("failed to fetch trusted domains of {}: {}", auth_domain, error);
                Ok(HashSet::new())
            }
            Err(error) => Err(error),
        }
    }

    /// An `IPC$` tree on the first reachable domain controller of `domain`.
    pub fn get_dc(&self, ctx: &dyn Context, domain: &str) -> SMBResult<Box<dyn TreeHandle>> {
        if ctx.config().is_dfs_disabled() {
            return Err(SMBError::request_error("DFS is disabled"));
        }
        let controllers = match self.domain_controllers.lookup(domain, "", "") {
            Some(controllers) => controllers,
            None => {
                let mut tree = ctx.connect_tree(&ResourceLocator::server(domain), IPC_SHARE)?;
                let response = fetch_referral(&mut *tree, ctx.config(), &format!("\\{}", domain))?;
                let controllers = dc_chain(&response)
                    .ok_or_else(|| SMBError::transport_error(format!("no domain controllers listed for {}", domain)))?;
                self.domain_controllers.store(domain, "", "", controllers.clone(), effective_ttl(ctx.config(), &controllers));
                controllers
            }
        };

        let mut last_error = None;
        for controller in controllers.hops() {
            match ctx.connect_tree(&ResourceLocator::server(controller.server()), IPC_SHARE) {
                Ok(tree) => return Ok(tree),
                Err(error) => {
                    debug!("domain controller {} of {} unreachable: {}", controller.server(), domain, error);
                    last_error = Some(error);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| SMBError::transport_error(format!("no domain controller reachable for {}", domain))))
    }

    /// The referral for `\domain_or_server\share\path`, or `None` when the
    /// namespace is not DFS.
    pub fn resolve(&self, ctx: &dyn Context, domain_or_server: &str, share: &str, path: &str) -> SMBResult<Option<ReferralData>> {
        if ctx.config().is_dfs_disabled() || share.is_empty() || share.eq_ignore_ascii_case(IPC_SHARE) {
            return Ok(None);
        }
        let path = request_path(path);
        let root = match self.referrals.lookup_entry(domain_or_server, share, &path) {
            Some(hit) if hit.referral.kind() != ReferralKind::Root || hit.prefix == normalize_path(&path) => {
                return Ok(Some(hit.referral));
            }
            Some(hit) => hit.referral,
            None => {
                let Some(referral) = self.fetch(ctx, domain_or_server, share, &path)? else {
                    return Ok(None);
                };
                let consumed = referral.path_consumed();
                let covered = path.chars().take(consumed).collect::<String>();
                self.referrals.store(domain_or_server, share, &covered, referral.clone(), effective_ttl(ctx.config(), &referral));
                if referral.kind() != ReferralKind::Root || consumed >= path.chars().count() {
                    return Ok(Some(referral));
                }
                referral
            }
        };
        self.resolve_link(ctx, domain_or_server, share, &path, root).map(Some)
    }

    fn fetch(&self, ctx: &dyn Context, domain_or_server: &str, share: &str, path: &str) -> SMBResult<Option<ReferralData>> {
        let mut tree = if self.is_trusted_domain(ctx, domain_or_server)? {
            self.get_dc(ctx, domain_or_server)?
        } else {
            ctx.connect_tree(&ResourceLocator::server(domain_or_server), IPC_SHARE)?
        };
        if !tree.is_dfs_capable() {
            debug!("{} is not DFS capable", domain_or_server);
            return Ok(None);
        }
        let request = format!("\\{}\\{}{}", domain_or_server, share, path);
        match fetch_referral(&mut *tree, ctx.config(), &request) {
            Ok(response) => storage_chain(&response, prefix_chars(domain_or_server, share), path),
            Err(error) if is_not_dfs(&error) => {
                debug!("no referral for {}: {}", request, error);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Asks `root`'s target whether `path` lies below a link. Paths that do
    /// not are served by the root itself.
    fn resolve_link(&self, ctx: &dyn Context, domain_or_server: &str, share: &str, path: &str, root: ReferralData) -> SMBResult<ReferralData> {
        let request = format!("\\{}\\{}{}", root.server(), root.share(), path);
        let outcome = ctx.connect_tree(&ResourceLocator::server(root.server()), IPC_SHARE)
            .and_then(|mut tree| fetch_referral(&mut *tree, ctx.config(), &request));
        let referral = match outcome {
            Ok(response) => storage_chain(&response, prefix_chars(root.server(), root.share()), path)?
                .unwrap_or(root),
            Err(error) if is_not_dfs(&error) => {
                trace!("{} is inside root {}: {}", request, root.share(), error);
                root
            }
            Err(error) => return Err(error),
        };
        self.referrals.store(domain_or_server, share, path, referral.clone(), effective_ttl(ctx.config(), &referral));
        Ok(referral)
    }

    /// Drops the referral cached for exactly this path.
    pub fn invalidate(&self, domain_or_server: &str, share: &str, path: &str) -> bool {
        self.referrals.invalidate(domain_or_server, share, &request_path(path))
    }
}

fn fetch_trusted_domains(ctx: &dyn Context, auth_domain: &str) -> SMBResult<HashSet<String>> {
    let mut tree = ctx.connect_tree(&ResourceLocator::server(auth_domain), IPC_SHARE)?;
    let response = fetch_referral(&mut *tree, ctx.config(), "")?;
    Ok(domain_names(&response).into_iter().collect())
}

/// Sends a referral request over `tree`: an FSCTL on SMB2, `TRANS2_GET_DFS_REFERRAL` on SMB1.
pub(crate) fn fetch_referral(tree: &mut dyn TreeHandle, config: &SMBClientConfig, path: &str) -> SMBResult<DfsReferralResponse> {
    let request = DfsReferralRequest::new(config.max_referral_level(), path);
    let output = if tree.is_smb2() {
        let ioctl = SMBIoCtlRequest::fsctl(SMBIoCtlCode::DfsGetReferrals, request.smb_to_bytes(), config.transaction_buffer_size() as u32);
        tree.call(ioctl)?.output().to_vec()
    } else {
        tree.transact(trans2::get_dfs_referral(&request, config.transaction_buffer_size()))?.data
    };
    let (_, response) = DfsReferralResponse::smb_from_bytes(&output)?;
    Ok(response)
}

fn is_not_dfs(error: &SMBError) -> bool {
    [
        NTStatus::NotFound,
        NTStatus::PathNotCovered,
        NTStatus::FsDriverRequired,
        NTStatus::ObjectNameNotFound,
        NTStatus::NoSuchFile,
        NTStatus::BadNetworkName,
    ].into_iter().any(|status| error.is_status(status))
}

fn effective_ttl(config: &SMBClientConfig, referral: &ReferralData) -> Duration {
    config.dfs_ttl().min(referral.ttl())
}

/// `\a\b` with original case, or empty for the share root.
fn request_path(path: &str) -> String {
    let path = path.replace('/', "\\");
    let trimmed = path.trim_matches('\\');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\\{}", trimmed)
    }
}

fn prefix_chars(server: &str, share: &str) -> usize {
    2 + server.chars().count() + share.chars().count()
}
