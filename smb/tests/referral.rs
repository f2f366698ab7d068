use std::sync::Arc;
use std::thread;
use std::time::Duration;

use smb_client::dfs::{ReferralCache, ReferralData, ReferralKind};
use smb_client::enumeration::ResourceLocator;

const TTL: Duration = Duration::from_secs(300);

fn target(server: &str) -> ReferralData {
    ReferralData::new(ReferralKind::Link, server, "docs", "", 5, TTL)
}

#[test]
fn chain_visits_every_target_then_stops() {
    let chain = ReferralData::chain(vec![target("filer1"), target("filer2")]).unwrap();

    let servers = chain.hops().map(ReferralData::server).collect::<Vec<_>>();
    assert_eq!(servers, vec!["filer1", "filer2"]);

    let last = chain.next();
    assert!(last.is_terminal());
    assert_eq!(last.next(), last);
    assert!(ReferralData::chain(Vec::new()).is_none());
}

#[test]
fn concurrent_stores_leave_one_entry_per_key() {
    let cache = Arc::new(ReferralCache::new());
    let workers = (0..8).map(|worker| {
        let cache = cache.clone();
        thread::spawn(move || {
            for round in 0..50 {
                let server = format!("filer{}", (worker + round) % 3);
                cache.store("CORP", "Dfs", "\\Docs", target(&server), TTL);
                assert!(cache.lookup("corp", "dfs", "\\docs\\q3").is_some());
            }
        })
    }).collect::<Vec<_>>();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(cache.len(), 1);
    assert!(cache.invalidate("corp", "DFS", "/docs"));
    assert!(cache.is_empty());
}

#[test]
fn cached_link_redirects_a_locator() {
    let cache = ReferralCache::new();
    cache.store("fs", "dfs", "\\docs", ReferralData::new(ReferralKind::Link, "filer2", "docs", "archive", 5, TTL), TTL);
    let locator = ResourceLocator::parse("smb://fs/dfs/docs/reports/").unwrap();

    let referral = cache.lookup(locator.host(), locator.share_name().unwrap(), &locator.dfs_path()).unwrap();
    let redirected = locator.redirect(&referral);

    assert_eq!(redirected.url(), "smb://filer2/docs/archive/reports/");
    assert_eq!(locator.url(), "smb://fs/dfs/docs/reports/");
}
