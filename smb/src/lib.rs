//! # SMB Client
//!
//! The protocol core of an SMB2/3 client, with SMB1 fallbacks where older
//! servers still need them.
//!
//! This crate provides:
//! - **Protocol layer** ([`protocol`]): wire types for the SMB2 header and the
//!   Negotiate, Create, Close, IOCTL and Query Directory bodies, plus SMB1 RAP
//!   and Trans2 payloads.
//! - **Client layer** ([`client`]): configuration, the session and tree
//!   abstractions the rest of the crate talks through, and dialect negotiation.
//! - **DFS** ([`dfs`]): referral parsing, a shared referral cache and the
//!   resolver that maps namespace paths to storage servers.
//! - **Enumeration** ([`enumeration`]): resource locators and listings of
//!   workgroups, servers, shares and directories.
//! - **RPC** ([`rpc`]): NDR marshalling for the srvsvc and netdfs calls used
//!   when listing shares.
//! - **Socket layer** ([`socket`]): a blocking, framed SMB2 session over any
//!   `Read + Write` stream.
//!
//! ## Quick Start
//!
//! ```no_run
//! use smb_client::client::{NegotiationEngine, SMBClientConfig};
//! use smb_client::socket::SMBSocketConnection;
//!
//! fn main() -> smb_core::SMBResult<()> {
//!     let config = SMBClientConfig::builder().signing_required(true).build()
//!         .map_err(|e| smb_core::error::SMBError::request_error(e.to_string()))?;
//!     let mut connection = SMBSocketConnection::connect("fileserver:445")?;
//!     let negotiated = NegotiationEngine::new(&config).negotiate(&mut connection)?;
//!     println!("negotiated {:?}", negotiated.dialect);
//!     Ok(())
//! }
//! ```

/// SMB2/3 wire-format protocol types: headers, bodies, and message framing.
pub mod protocol;
/// Client configuration, sessions, trees and dialect negotiation.
pub mod client;
/// DFS referral resolution and caching.
pub mod dfs;
/// Resource locators and directory, share and server listings.
pub mod enumeration;
/// DCE/RPC messages for share and DFS root enumeration.
pub mod rpc;
/// Framed SMB2 transport over a byte stream.
pub mod socket;
mod byte_helper;
mod util;

#[cfg(test)]
pub(crate) mod test_support;
