// Error - Privilege subsystem error taxonomy
use crate::host::{HostError, VmError};
use crate::storage::StoreError;
use crate::types::Address;

/// Errors returned to the immediate caller.
///
/// Fatal host-invariant violations (unknown evidence kind, position
/// counter overflow) panic instead of showing up here.
#[derive(Debug, thiserror::Error)]
pub enum PrivilegeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate registration for {privilege}: {reason}")]
    DuplicateRegistration { privilege: &'static str, reason: String },

    #[error("contract {contract} does not hold privilege {privilege}")]
    Unauthorized { contract: Address, privilege: &'static str },

    #[error("unknown message: {0}")]
    UnknownMessage(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no handler for governance route {0:?}")]
    NoHandler(String),

    #[error("invalid genesis: {0}")]
    InvalidGenesis(String),

    #[error("encoding failed: {0}")]
    Codec(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Vm(#[from] VmError),

    #[error(transparent)]
    Host(#[from] HostError),
}

impl PrivilegeError {
    /// True when the execution budget ran out somewhere below this error
    pub fn is_out_of_gas(&self) -> bool {
        match self {
            PrivilegeError::Vm(vm) => vm.is_out_of_gas(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for PrivilegeError {
    fn from(e: serde_json::Error) -> Self {
        PrivilegeError::Codec(e.to_string())
    }
}
