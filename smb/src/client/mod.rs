//! Client-side collaborators: settings, the session abstraction the protocol
//! core talks through, and capability negotiation.

pub mod config;
pub mod connection;
pub mod context;
pub mod negotiation;
pub mod session;

pub use config::{Credentials, SMBClientConfig, SMBClientConfigBuilder};
pub use connection::{Connection, TreeHandle};
pub use context::Context;
pub use negotiation::{NegotiatedState, NegotiationEngine};
pub use session::{SMBRequest, Session, SessionExt};
