// Keeper - Entry point of the privileged contract subsystem
// Principle: One handle owns the registry and the collaborators it drives

use super::error::PrivilegeError;
use super::registry::PrivilegeRegistry;
use crate::cli::config::{ConfigError, PrivilegedConfig};
use crate::host::{ContractInfo, ContractVm, GovernanceRouter, TokenBank};
use crate::privileged::ContractMessageHandler;
use crate::storage::StateContext;
use crate::types::{Address, PrivilegeType, PrivilegeTypeTable, SudoMsg};
use std::sync::Arc;

/// Privileged contract keeper
///
/// Owns the privilege registry and the VM, governance and bank handles.
/// The lifecycle, block-boundary and message-bridge operations are
/// implemented on this type in their own modules.
pub struct Keeper {
    pub(crate) registry: PrivilegeRegistry,
    pub(crate) types: Arc<PrivilegeTypeTable>,
    pub(crate) vm: Box<dyn ContractVm>,
    pub(crate) gov: Box<dyn GovernanceRouter>,
    pub(crate) bank: Box<dyn TokenBank>,
    pub(crate) config: PrivilegedConfig,
    pub(crate) fallback: Option<Box<dyn ContractMessageHandler>>,
}

impl Keeper {
    pub fn new(
        types: Arc<PrivilegeTypeTable>,
        config: PrivilegedConfig,
        vm: Box<dyn ContractVm>,
        gov: Box<dyn GovernanceRouter>,
        bank: Box<dyn TokenBank>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            registry: PrivilegeRegistry::new(types.clone()),
            types,
            vm,
            gov,
            bank,
            config,
            fallback: None,
        })
    }

    /// Handler for contract messages this keeper does not own
    pub fn with_message_fallback(mut self, handler: Box<dyn ContractMessageHandler>) -> Self {
        self.fallback = Some(handler);
        self
    }

    pub fn registry(&self) -> &PrivilegeRegistry {
        &self.registry
    }

    pub fn types(&self) -> &PrivilegeTypeTable {
        &self.types
    }

    pub fn config(&self) -> &PrivilegedConfig {
        &self.config
    }

    /// Send a sudo message; contract-emitted messages come back through this keeper
    pub(crate) fn sudo(
        &self,
        ctx: &mut StateContext<'_>,
        contract: &Address,
        msg: &SudoMsg,
    ) -> Result<Option<Vec<u8>>, PrivilegeError> {
        let bytes = msg.to_bytes()?;
        Ok(self.vm.sudo(ctx, contract, &bytes, self)?)
    }

    pub(crate) fn require_contract(&self, ctx: &StateContext<'_>, contract: &Address) -> Result<ContractInfo, PrivilegeError> {
        self.vm
            .contract_info(ctx, contract)?
            .ok_or_else(|| PrivilegeError::NotFound(format!("contract {}", contract)))
    }

    pub(crate) fn resolve_privilege(&self, name: &str) -> Result<PrivilegeType, PrivilegeError> {
        self.types
            .by_name(name)
            .ok_or_else(|| PrivilegeError::InvalidRequest(format!("unknown privilege type {:?}", name)))
    }

    // ===== Queries =====

    pub fn is_privileged(&self, ctx: &StateContext<'_>, contract: &Address) -> Result<bool, PrivilegeError> {
        self.registry.has_flag(ctx, contract)
    }

    /// Flagged contracts in key order
    pub fn privileged_contracts(&self, ctx: &StateContext<'_>) -> Result<Vec<Address>, PrivilegeError> {
        self.registry.privileged_contracts(ctx)
    }

    /// Registrations of one privilege type in ascending position
    pub fn contracts_by_privilege(&self, ctx: &StateContext<'_>, name: &str) -> Result<Vec<(u8, Address)>, PrivilegeError> {
        let privilege = self.resolve_privilege(name)?;
        self.registry.registrations(ctx, privilege)
    }

    /// Whether `contract` currently holds `privilege`, read from its metadata
    pub fn has_privilege(&self, ctx: &StateContext<'_>, contract: &Address, privilege: PrivilegeType) -> Result<bool, PrivilegeError> {
        Ok(self
            .vm
            .contract_info(ctx, contract)?
            .map(|info| info.extension.has_privilege(privilege))
            .unwrap_or(false))
    }
}
