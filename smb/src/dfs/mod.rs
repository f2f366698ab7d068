//! DFS referral resolution: the referral chain model, the shared referral
//! cache and the resolver that fills it.

pub mod cache;
pub mod referral;
pub mod resolver;

pub use cache::ReferralCache;
pub use referral::{ReferralData, ReferralKind, ReferralLink};
pub use resolver::DfsResolver;
