// Host - Narrow interfaces of the node subsystems this module drives
// Principle: The VM, governance and bank are collaborators, not dependencies

use crate::privileged::{ContractMessageHandler, Keeper, PrivilegeError};
use crate::storage::{StateContext, StoreError};
use crate::types::{Address, CodeId, Coin, ContractPrivilegeDetails, GovAction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contract metadata kept by the VM host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub code_id: CodeId,
    pub creator: Address,
    pub admin: Option<Address>,
    pub label: String,
    /// Privileges held, maintained exclusively by the privilege keeper
    #[serde(default)]
    pub extension: ContractPrivilegeDetails,
}

/// Embedded contract VM
///
/// Every call runs against the supplied context, so branching the context
/// isolates the call's writes. `sudo` dispatches the messages the contract
/// emits through `handler` before returning; a failing message fails the
/// whole call.
pub trait ContractVm {
    fn contract_info(&self, ctx: &StateContext<'_>, contract: &Address) -> Result<Option<ContractInfo>, VmError>;

    fn set_privilege_details(
        &self,
        ctx: &mut StateContext<'_>,
        contract: &Address,
        details: &ContractPrivilegeDetails,
    ) -> Result<(), VmError>;

    /// Keep the compiled code in the VM cache
    fn pin_code(&self, ctx: &mut StateContext<'_>, code_id: CodeId) -> Result<(), VmError>;

    fn unpin_code(&self, ctx: &mut StateContext<'_>, code_id: CodeId) -> Result<(), VmError>;

    fn pinned_code_ids(&self, ctx: &StateContext<'_>) -> Result<Vec<CodeId>, VmError>;

    /// Invoke the system-only entry point; returns the response data
    fn sudo(
        &self,
        ctx: &mut StateContext<'_>,
        contract: &Address,
        msg: &[u8],
        handler: &dyn ContractMessageHandler,
    ) -> Result<Option<Vec<u8>>, VmError>;
}

/// Panic payload a VM uses when a contract exhausts its execution budget.
///
/// Block-boundary dispatch never swallows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfGas {
    pub limit: u64,
    pub used: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum VmError {
    #[error("contract execution failed: {0}")]
    Execution(String),

    #[error("out of gas: limit {limit}, used {used}")]
    OutOfGas { limit: u64, used: u64 },

    #[error("code {0} not found")]
    CodeNotFound(CodeId),

    #[error("contract message failed: {0}")]
    Submessage(Box<PrivilegeError>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl VmError {
    pub fn is_out_of_gas(&self) -> bool {
        match self {
            VmError::OutOfGas { .. } => true,
            VmError::Submessage(inner) => inner.is_out_of_gas(),
            _ => false,
        }
    }
}

impl From<OutOfGas> for VmError {
    fn from(oog: OutOfGas) -> Self {
        VmError::OutOfGas {
            limit: oog.limit,
            used: oog.used,
        }
    }
}

/// Failure reported by governance handlers or the bank
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("{0}")]
    Rejected(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("route already registered: {0}")]
    DuplicateRoute(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Executes one kind of governance action
pub trait GovernanceHandler {
    fn handle(&self, keeper: &Keeper, ctx: &mut StateContext<'_>, action: &GovAction) -> Result<(), PrivilegeError>;
}

/// Route-keyed table of governance handlers
pub trait GovernanceRouter {
    fn has_route(&self, route: &str) -> bool;

    fn handler(&self, route: &str) -> Option<&dyn GovernanceHandler>;
}

/// Plain route table
#[derive(Default)]
pub struct GovRouter {
    routes: BTreeMap<String, Box<dyn GovernanceHandler>>,
}

impl GovRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(&mut self, route: &str, handler: Box<dyn GovernanceHandler>) -> Result<(), HostError> {
        if self.routes.contains_key(route) {
            return Err(HostError::DuplicateRoute(route.to_string()));
        }
        self.routes.insert(route.to_string(), handler);
        Ok(())
    }

    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

impl GovernanceRouter for GovRouter {
    fn has_route(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }

    fn handler(&self, route: &str) -> Option<&dyn GovernanceHandler> {
        self.routes.get(route).map(|h| h.as_ref())
    }
}

/// Native token subsystem
pub trait TokenBank {
    fn mint_coins(&self, ctx: &mut StateContext<'_>, module: &str, amount: &Coin) -> Result<(), HostError>;

    fn send_coins_from_module_to_account(
        &self,
        ctx: &mut StateContext<'_>,
        module: &str,
        recipient: &Address,
        amount: &Coin,
    ) -> Result<(), HostError>;
}
