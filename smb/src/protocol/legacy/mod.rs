//! SMB1 transaction payloads used when a server only speaks the legacy dialect.
//!
//! The SMB1 envelope itself (word counts, parameter/data offsets, secondary
//! requests) belongs to the tree handle; these types only carry the setup
//! words, parameter block and data block it frames.

use serde::{Deserialize, Serialize};

use crate::protocol::header::LegacySMBCommandCode;

pub mod rap;
pub mod trans2;

/// Named pipe that carries RAP calls.
pub const LANMAN_PIPE: &str = "\\PIPE\\LANMAN";

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SMBTransaction {
    pub command: LegacySMBCommandCode,
    /// Transaction name; only SMB_COM_TRANSACTION carries one.
    pub name: Option<String>,
    pub setup: Vec<u16>,
    pub parameters: Vec<u8>,
    pub data: Vec<u8>,
    pub max_parameter_count: u16,
    pub max_data_count: u16,
}

impl SMBTransaction {
    pub fn transaction<T: Into<String>>(name: T, parameters: Vec<u8>, max_data_count: u16) -> Self {
        Self {
            command: LegacySMBCommandCode::Transaction,
            name: Some(name.into()),
            setup: Vec::new(),
            parameters,
            data: Vec::new(),
            max_parameter_count: 8,
            max_data_count,
        }
    }

    pub fn transaction2(subcommand: u16, parameters: Vec<u8>, max_data_count: u16) -> Self {
        Self {
            command: LegacySMBCommandCode::Transaction2,
            name: None,
            setup: vec![subcommand],
            parameters,
            data: Vec::new(),
            max_parameter_count: 10,
            max_data_count,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct SMBTransactionResponse {
    pub parameters: Vec<u8>,
    pub data: Vec<u8>,
}

impl SMBTransactionResponse {
    pub fn new(parameters: Vec<u8>, data: Vec<u8>) -> Self {
        Self { parameters, data }
    }
}
