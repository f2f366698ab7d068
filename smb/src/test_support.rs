//! Scripted trees, pipes and contexts for exercising client logic without a
//! server. Every connection, request and close is written to a shared event
//! log so tests can assert on the I/O that did (or did not) happen.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use parking_lot::Mutex;

use smb_core::error::SMBError;
use smb_core::nt_status::NTStatus;
use smb_core::{SMBFromBytes, SMBResult};

use crate::byte_helper::string_from_utf16_nul;
use crate::client::config::{Credentials, SMBClientConfig};
use crate::client::connection::{Connection, TreeHandle};
use crate::client::context::Context;
use crate::client::session::Session;
use crate::dfs::DfsResolver;
use crate::enumeration::locator::ResourceLocator;
use crate::protocol::body::close::SMBCloseResponse;
use crate::protocol::body::create::SMBCreateResponse;
use crate::protocol::body::error::SMBErrorResponse;
use crate::protocol::body::{Body, Capabilities, SMBDialect, SMBRequestBody, SMBResponseBody};
use crate::protocol::header::SMBSyncHeader;
use crate::protocol::legacy::trans2::TRANS2_GET_DFS_REFERRAL;
use crate::protocol::legacy::{SMBTransaction, SMBTransactionResponse};
use crate::protocol::message::{SMBMessage, SMBRequestMessage, SMBResponseMessage};
use crate::rpc::DcerpcHandle;

pub(crate) type Events = Arc<Mutex<Vec<String>>>;

type TransactFn = Box<dyn FnMut(&SMBTransaction) -> SMBResult<SMBTransactionResponse>>;
type CallFn = Box<dyn FnMut(&SMBRequestBody) -> Reply>;
type PipeFn = Box<dyn FnMut(u16, &[u8]) -> SMBResult<Vec<u8>>>;
type TreeFactory = Box<dyn Fn() -> SMBResult<MockTree>>;
type PipeFactory = Box<dyn Fn() -> SMBResult<MockPipe>>;

/// What a scripted SMB2 exchange answers with.
pub(crate) enum Reply {
    Body(SMBResponseBody),
    Status(NTStatus),
    Fail(SMBError),
}

pub(crate) struct MockTree {
    host: String,
    share: String,
    dialect: Option<SMBDialect>,
    capabilities: Capabilities,
    address: Option<IpAddr>,
    on_transact: Option<TransactFn>,
    on_call: Option<CallFn>,
    events: Events,
}

impl MockTree {
    pub(crate) fn smb1(host: &str, share: &str) -> Self {
        Self {
            host: host.into(),
            share: share.into(),
            dialect: None,
            capabilities: Capabilities::empty(),
            address: None,
            on_transact: None,
            on_call: None,
            events: Events::default(),
        }
    }

    pub(crate) fn smb2(host: &str, share: &str) -> Self {
        let mut tree = Self::smb1(host, share);
        tree.dialect = Some(SMBDialect::V3_1_1);
        tree
    }

    pub(crate) fn dfs(mut self) -> Self {
        self.capabilities = Capabilities::DFS;
        self
    }

    pub(crate) fn at(mut self, address: IpAddr) -> Self {
        self.address = Some(address);
        self
    }

    pub(crate) fn on_transact<F>(mut self, f: F) -> Self where F: FnMut(&SMBTransaction) -> SMBResult<SMBTransactionResponse> + 'static {
        self.on_transact = Some(Box::new(f));
        self
    }

    pub(crate) fn on_call<F>(mut self, f: F) -> Self where F: FnMut(&SMBRequestBody) -> Reply + 'static {
        self.on_call = Some(Box::new(f));
        self
    }

    fn record(&self, event: String) {
        self.events.lock().push(event);
    }
}

impl Session for MockTree {
    fn send_and_receive(&mut self, request: SMBRequestMessage) -> SMBResult<SMBResponseMessage> {
        let command = request.body.command_code();
        self.record(format!("{:?} {}/{}", command, self.host, self.share));
        let reply = match self.on_call.as_mut() {
            Some(on_call) => on_call(&request.body),
            None => Reply::Fail(SMBError::transport_error("unexpected SMB2 request")),
        };
        match reply {
            Reply::Body(body) => Ok(SMBMessage::new(SMBSyncHeader::response(&request.header, 0), body)),
            Reply::Status(status) => Ok(SMBMessage::new(
                SMBSyncHeader::response(&request.header, status as u32),
                SMBResponseBody::ErrorResponse(command, SMBErrorResponse::new()),
            )),
            Reply::Fail(error) => Err(error),
        }
    }
}

impl Connection for MockTree {
    fn remote_host(&self) -> &str {
        &self.host
    }

    fn remote_address(&self) -> Option<IpAddr> {
        self.address
    }

    fn dialect(&self) -> Option<SMBDialect> {
        self.dialect
    }

    fn server_capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

impl TreeHandle for MockTree {
    fn share(&self) -> &str {
        &self.share
    }

    fn tree_id(&self) -> u32 {
        1
    }

    fn transact(&mut self, transaction: SMBTransaction) -> SMBResult<SMBTransactionResponse> {
        self.record(format!("transact {}/{}", self.host, self.share));
        match self.on_transact.as_mut() {
            Some(on_transact) => on_transact(&transaction),
            None => Err(SMBError::transport_error("unexpected transaction")),
        }
    }

    fn find_close(&mut self, sid: u16) -> SMBResult<()> {
        self.record(format!("find_close {}", sid));
        Ok(())
    }
}

impl Drop for MockTree {
    fn drop(&mut self) {
        self.record(format!("disconnect {}/{}", self.host, self.share));
    }
}

pub(crate) struct MockPipe {
    on_call: PipeFn,
}

impl MockPipe {
    pub(crate) fn new<F>(f: F) -> Self where F: FnMut(u16, &[u8]) -> SMBResult<Vec<u8>> + 'static {
        Self { on_call: Box::new(f) }
    }

    pub(crate) fn replying(stub: Vec<u8>) -> Self {
        Self::new(move |_, _| Ok(stub.clone()))
    }
}

impl DcerpcHandle for MockPipe {
    fn send_and_receive(&mut self, opnum: u16, stub: &[u8]) -> SMBResult<Vec<u8>> {
        (self.on_call)(opnum, stub)
    }
}

pub(crate) struct MockContext {
    config: SMBClientConfig,
    credentials: Credentials,
    dfs: DfsResolver,
    trees: HashMap<(String, String), TreeFactory>,
    pipes: HashMap<(String, String), PipeFactory>,
    pub(crate) events: Events,
}

impl MockContext {
    pub(crate) fn new(config: SMBClientConfig) -> Self {
        Self {
            config,
            credentials: Credentials::anonymous(),
            dfs: DfsResolver::new(),
            trees: HashMap::new(),
            pipes: HashMap::new(),
            events: Events::default(),
        }
    }

    pub(crate) fn with_credentials(self, credentials: Credentials) -> Self {
        Self { credentials, ..self }
    }

    pub(crate) fn tree<F>(mut self, host: &str, share: &str, factory: F) -> Self where F: Fn() -> SMBResult<MockTree> + 'static {
        self.trees.insert((host.to_lowercase(), share.to_uppercase()), Box::new(factory));
        self
    }

    pub(crate) fn pipe<F>(mut self, host: &str, pipe: &str, factory: F) -> Self where F: Fn() -> SMBResult<MockPipe> + 'static {
        self.pipes.insert((host.to_lowercase(), pipe.to_string()), Box::new(factory));
        self
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.events.lock().iter().filter(|event| event.starts_with(prefix)).count()
    }
}

impl Context for MockContext {
    fn config(&self) -> &SMBClientConfig {
        &self.config
    }

    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn dfs(&self) -> &DfsResolver {
        &self.dfs
    }

    fn connect_tree(&self, locator: &ResourceLocator, share: &str) -> SMBResult<Box<dyn TreeHandle>> {
        self.events.lock().push(format!("connect {}/{}", locator.host(), share));
        let factory = self.trees.get(&(locator.host().to_lowercase(), share.to_uppercase()))
            .ok_or_else(|| SMBError::transport_error(format!("{} unreachable", locator.host())))?;
        let mut tree = factory()?;
        tree.events = self.events.clone();
        Ok(Box::new(tree))
    }

    fn rpc_handle(&self, locator: &ResourceLocator, pipe: &str) -> SMBResult<Box<dyn DcerpcHandle>> {
        let address = locator.address().map(|address| format!(" @{}", address)).unwrap_or_default();
        self.events.lock().push(format!("rpc {} {}{}", locator.host(), pipe, address));
        let factory = self.pipes.get(&(locator.host().to_lowercase(), pipe.to_string()))
            .ok_or_else(|| SMBError::transport_error(format!("no pipe {} on {}", pipe, locator.host())))?;
        Ok(Box::new(factory()?))
    }
}

/// The path a `TRANS2_GET_DFS_REFERRAL` asks about.
pub(crate) fn referral_path(transaction: &SMBTransaction) -> Option<String> {
    if transaction.setup.first() != Some(&TRANS2_GET_DFS_REFERRAL) {
        return None;
    }
    string_from_utf16_nul(&transaction.parameters, 2).ok()
}

pub(crate) fn referral_reply(data: Vec<u8>) -> SMBResult<SMBTransactionResponse> {
    Ok(SMBTransactionResponse::new(Vec::new(), data))
}

pub(crate) fn create_response() -> SMBCreateResponse {
    let mut body = vec![0u8; 96];
    body[0] = 89;
    body[64..80].copy_from_slice(&[7; 16]);
    SMBCreateResponse::smb_from_bytes(&body).unwrap().1
}

pub(crate) fn close_response() -> SMBCloseResponse {
    let mut body = vec![0u8; 60];
    body[0] = 60;
    SMBCloseResponse::smb_from_bytes(&body).unwrap().1
}
