// Proposal - Governance handler for privilege promotion and demotion
use super::error::PrivilegeError;
use super::keeper::Keeper;
use crate::host::GovernanceHandler;
use crate::storage::StateContext;
use crate::types::{GovAction, GovContent};

/// Handler for the `privileged` governance route
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivilegeProposalHandler;

impl GovernanceHandler for PrivilegeProposalHandler {
    fn handle(&self, keeper: &Keeper, ctx: &mut StateContext<'_>, action: &GovAction) -> Result<(), PrivilegeError> {
        match &action.content {
            GovContent::PromoteToPrivileged(contract) => keeper.promote(ctx, contract),
            GovContent::DemotePrivileged(contract) => keeper.demote(ctx, contract),
            other => Err(PrivilegeError::NoHandler(other.route().to_string())),
        }
    }
}
