// Lifecycle - Promotion and demotion of privileged contracts
// Principle: Each transition is all-or-nothing

use super::error::PrivilegeError;
use super::keeper::Keeper;
use crate::storage::StateContext;
use crate::types::{Address, ContractPrivilegeDetails, Event, PrivilegeSlot, SudoMsg, ATTR_CONTRACT, EVENT_DEMOTE, EVENT_PROMOTE};
use tracing::{info, warn};

impl Keeper {
    /// Grant privileged status to `contract`.
    ///
    /// Pins the code, sets the flag and sends `Promoted` so the contract can
    /// register for privilege types in the same execution. Nothing is kept
    /// if any step fails.
    pub fn promote(&self, ctx: &mut StateContext<'_>, contract: &Address) -> Result<(), PrivilegeError> {
        let mut branch = ctx.branch();
        self.promote_in(&mut branch, contract)?;
        branch.commit()?;
        Ok(())
    }

    fn promote_in(&self, ctx: &mut StateContext<'_>, contract: &Address) -> Result<(), PrivilegeError> {
        let info = self.require_contract(ctx, contract)?;
        if self.registry.has_flag(ctx, contract)? {
            return Err(PrivilegeError::InvalidRequest(format!("contract {} is already privileged", contract)));
        }

        self.vm.pin_code(ctx, info.code_id)?;
        self.registry.set_flag(ctx, contract)?;
        self.sudo(ctx, contract, &SudoMsg::promoted())?;

        ctx.emit(Event::new(EVENT_PROMOTE).attr(ATTR_CONTRACT, contract));
        info!("Contract {} promoted to privileged (code {})", contract.short(), info.code_id);
        Ok(())
    }

    /// Revoke privileged status from `contract`.
    ///
    /// `Demoted` is delivered first, while the contract still holds its
    /// privileges. Then the code is unpinned, the flag cleared and every
    /// remaining registration removed.
    pub fn demote(&self, ctx: &mut StateContext<'_>, contract: &Address) -> Result<(), PrivilegeError> {
        let mut branch = ctx.branch();
        self.demote_in(&mut branch, contract)?;
        branch.commit()?;
        Ok(())
    }

    fn demote_in(&self, ctx: &mut StateContext<'_>, contract: &Address) -> Result<(), PrivilegeError> {
        self.require_contract(ctx, contract)?;
        if !self.registry.has_flag(ctx, contract)? {
            return Err(PrivilegeError::InvalidRequest(format!("contract {} is not privileged", contract)));
        }

        self.sudo(ctx, contract, &SudoMsg::demoted())?;

        // The callback may have released privileges itself
        let info = self.require_contract(ctx, contract)?;
        self.vm.unpin_code(ctx, info.code_id)?;
        self.registry.clear_flag(ctx, contract)?;

        for slot in &info.extension.privileges {
            match self.types.by_name(&slot.privilege_type) {
                Some(privilege) => {
                    self.registry.remove(ctx, privilege, slot.position, contract)?;
                }
                None => warn!(
                    "Contract {} lists unknown privilege type {:?}, skipping",
                    contract.short(),
                    slot.privilege_type
                ),
            }
        }
        self.vm
            .set_privilege_details(ctx, contract, &ContractPrivilegeDetails::default())?;

        ctx.emit(Event::new(EVENT_DEMOTE).attr(ATTR_CONTRACT, contract));
        info!("Contract {} demoted from privileged", contract.short());
        Ok(())
    }

    /// Restore a privileged contract from a state dump.
    ///
    /// Same pin and flag steps as `promote`, but the registrations come from
    /// the dump instead of a `Promoted` callback.
    pub(crate) fn import_privileged(
        &self,
        ctx: &mut StateContext<'_>,
        contract: &Address,
        slots: &[PrivilegeSlot],
    ) -> Result<(), PrivilegeError> {
        let info = self.vm.contract_info(ctx, contract)?.ok_or_else(|| {
            PrivilegeError::InvalidGenesis(format!("privileged contract {} not found among imported contracts", contract))
        })?;

        self.vm.pin_code(ctx, info.code_id)?;
        self.registry.set_flag(ctx, contract)?;

        let mut details = ContractPrivilegeDetails::default();
        for slot in slots {
            let privilege = self.types.by_name(&slot.privilege_type).ok_or_else(|| {
                PrivilegeError::InvalidGenesis(format!("unknown privilege type {:?}", slot.privilege_type))
            })?;
            if self.registry.slot_taken(ctx, privilege, slot.position)? {
                return Err(PrivilegeError::InvalidGenesis(format!(
                    "{} position {} already registered",
                    privilege, slot.position
                )));
            }
            self.registry.put_slot(ctx, privilege, slot.position, contract)?;
            details.add_privilege(privilege, slot.position);
        }
        self.vm.set_privilege_details(ctx, contract, &details)?;

        info!(
            "Imported privileged contract {} with {} registration(s)",
            contract.short(),
            details.privileges.len()
        );
        Ok(())
    }
}
