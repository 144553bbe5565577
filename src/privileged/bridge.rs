// Bridge - Messages from privileged contracts to the host
// Principle: Non-privileged callers cannot tell this handler exists

use super::error::PrivilegeError;
use super::keeper::Keeper;
use crate::storage::StateContext;
use crate::types::{
    Address, Balance, Coin, ContractMsg, Event, GovAction, GovProposalMsg, PrivilegeMsg, PrivilegedMsg,
    ATTR_AMOUNT, ATTR_CONTRACT, ATTR_RECIPIENT, EVENT_MINT, GOV_PROPOSAL_EXECUTOR, TOKEN_MINTER,
};
use tracing::{debug, info};

/// Receives messages emitted by executing contracts
pub trait ContractMessageHandler {
    fn dispatch(&self, ctx: &mut StateContext<'_>, caller: &Address, msg: &ContractMsg) -> Result<(), PrivilegeError>;
}

/// Tries each handler in order, moving on only when one answers
/// `UnknownMessage`
#[derive(Default)]
pub struct MessageHandlerChain {
    handlers: Vec<Box<dyn ContractMessageHandler>>,
}

impl MessageHandlerChain {
    pub fn new(handlers: Vec<Box<dyn ContractMessageHandler>>) -> Self {
        Self { handlers }
    }

    pub fn push(&mut self, handler: Box<dyn ContractMessageHandler>) {
        self.handlers.push(handler);
    }
}

impl ContractMessageHandler for MessageHandlerChain {
    fn dispatch(&self, ctx: &mut StateContext<'_>, caller: &Address, msg: &ContractMsg) -> Result<(), PrivilegeError> {
        for handler in &self.handlers {
            match handler.dispatch(ctx, caller, msg) {
                Err(PrivilegeError::UnknownMessage(_)) => continue,
                other => return other,
            }
        }
        Err(PrivilegeError::UnknownMessage("no handler accepted the message".into()))
    }
}

impl ContractMessageHandler for Keeper {
    fn dispatch(&self, ctx: &mut StateContext<'_>, caller: &Address, msg: &ContractMsg) -> Result<(), PrivilegeError> {
        match self.dispatch_privileged(ctx, caller, msg) {
            Err(PrivilegeError::UnknownMessage(reason)) => match &self.fallback {
                Some(fallback) => fallback.dispatch(ctx, caller, msg),
                None => Err(PrivilegeError::UnknownMessage(reason)),
            },
            other => other,
        }
    }
}

impl Keeper {
    fn dispatch_privileged(&self, ctx: &mut StateContext<'_>, caller: &Address, msg: &ContractMsg) -> Result<(), PrivilegeError> {
        let payload = match msg {
            ContractMsg::Privileged(payload) => payload,
            ContractMsg::Other { type_url, .. } => {
                return Err(PrivilegeError::UnknownMessage(format!("unsupported message type {}", type_url)));
            }
        };

        if !self.registry.has_flag(ctx, caller)? {
            return Err(PrivilegeError::UnknownMessage("unsupported message".into()));
        }

        let msg: PrivilegedMsg = serde_json::from_slice(payload)
            .map_err(|e| PrivilegeError::UnknownMessage(format!("undecodable privileged message: {}", e)))?;

        debug!("Privileged message from {}: {:?}", caller.short(), msg);
        match msg {
            PrivilegedMsg::Privilege(PrivilegeMsg::Request(name)) => self.register_privilege(ctx, caller, &name),
            PrivilegedMsg::Privilege(PrivilegeMsg::Release(name)) => self.unregister_privilege(ctx, caller, &name),
            PrivilegedMsg::ExecuteGovProposal {
                title,
                description,
                proposal,
            } => self.execute_gov_proposal(ctx, caller, title, description, proposal),
            PrivilegedMsg::MintTokens {
                denom,
                amount,
                recipient,
            } => self.mint_tokens(ctx, caller, &denom, &amount, &recipient),
        }
    }

    /// Register `caller` for a privilege type; holding it already is a no-op
    pub fn register_privilege(&self, ctx: &mut StateContext<'_>, caller: &Address, name: &str) -> Result<(), PrivilegeError> {
        let privilege = self.resolve_privilege(name)?;
        let mut info = self.require_contract(ctx, caller)?;
        if info.extension.has_privilege(privilege) {
            return Ok(());
        }

        let position = self.registry.append(ctx, privilege, caller)?;
        info.extension.add_privilege(privilege, position);
        self.vm.set_privilege_details(ctx, caller, &info.extension)?;
        Ok(())
    }

    /// Release every slot `caller` holds for a privilege type
    pub fn unregister_privilege(&self, ctx: &mut StateContext<'_>, caller: &Address, name: &str) -> Result<(), PrivilegeError> {
        let privilege = self.resolve_privilege(name)?;
        let mut info = self.require_contract(ctx, caller)?;

        let positions = info.extension.remove_privilege(privilege);
        if positions.is_empty() {
            return Ok(());
        }
        for position in positions {
            self.registry.remove(ctx, privilege, position, caller)?;
        }
        self.vm.set_privilege_details(ctx, caller, &info.extension)?;
        Ok(())
    }

    fn execute_gov_proposal(
        &self,
        ctx: &mut StateContext<'_>,
        caller: &Address,
        title: String,
        description: String,
        proposal: GovProposalMsg,
    ) -> Result<(), PrivilegeError> {
        if !self.has_privilege(ctx, caller, GOV_PROPOSAL_EXECUTOR)? {
            return Err(PrivilegeError::Unauthorized {
                contract: *caller,
                privilege: GOV_PROPOSAL_EXECUTOR.name,
            });
        }

        let action = GovAction::from_msg(title, description, proposal)
            .map_err(|e| PrivilegeError::InvalidRequest(e.to_string()))?;

        let route = action.route();
        if !self.gov.has_route(route) {
            return Err(PrivilegeError::NoHandler(route.to_string()));
        }
        let handler = self
            .gov
            .handler(route)
            .ok_or_else(|| PrivilegeError::NoHandler(route.to_string()))?;

        handler.handle(self, ctx, &action)?;
        info!("Governance action {:?} executed for {} via route {}", action.title, caller.short(), route);
        Ok(())
    }

    fn mint_tokens(
        &self,
        ctx: &mut StateContext<'_>,
        caller: &Address,
        denom: &str,
        amount: &str,
        recipient: &str,
    ) -> Result<(), PrivilegeError> {
        if !self.has_privilege(ctx, caller, TOKEN_MINTER)? {
            return Err(PrivilegeError::Unauthorized {
                contract: *caller,
                privilege: TOKEN_MINTER.name,
            });
        }

        let amount: Balance = amount
            .parse()
            .map_err(|_| PrivilegeError::InvalidRequest(format!("invalid amount {:?}", amount)))?;
        let coin = Coin::new(amount, denom);
        coin.validate()
            .map_err(|e| PrivilegeError::InvalidRequest(e.to_string()))?;
        if !self.config.allows_denom(denom) {
            return Err(PrivilegeError::InvalidRequest(format!("denomination {} may not be minted", denom)));
        }
        let recipient: Address = recipient
            .parse()
            .map_err(|e| PrivilegeError::InvalidRequest(format!("invalid recipient: {}", e)))?;

        let module = self.config.module_account.as_str();
        self.bank.mint_coins(ctx, module, &coin)?;
        self.bank.send_coins_from_module_to_account(ctx, module, &recipient, &coin)?;

        ctx.emit(
            Event::new(EVENT_MINT)
                .attr(ATTR_CONTRACT, caller)
                .attr(ATTR_AMOUNT, &coin)
                .attr(ATTR_RECIPIENT, recipient),
        );
        info!("Minted {} to {} for {}", coin, recipient.short(), caller.short());
        Ok(())
    }
}
