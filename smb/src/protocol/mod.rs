//! SMB wire-format definitions used by the client.
//!
//! - `header`: SMB2 sync header, command codes and flags.
//! - `body`: SMB2 request/response bodies the client sends and parses.
//! - `legacy`: SMB1 transaction payloads (RAP and Trans2) for legacy-dialect servers.
//! - `message`: `SMBMessage` pairing a header with a body, encoding and framing.

pub mod body;
pub mod header;
pub mod legacy;
pub mod message;
