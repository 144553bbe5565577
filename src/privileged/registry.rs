// Registry - Secondary index privilege type -> ordered contracts
// Principle: Positions only grow; removal never renumbers survivors

use super::error::PrivilegeError;
use crate::storage::{KvStore, Order, PrivilegedKey, RegistrationKey, StateContext, FLAG_SET, PREFIX_PRIVILEGED};
use crate::types::{
    Address, Event, PrivilegeType, PrivilegeTypeTable, ATTR_CONTRACT, ATTR_POSITION, ATTR_PRIVILEGE,
    EVENT_REGISTER, EVENT_UNREGISTER,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One registration slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub privilege: PrivilegeType,
    pub position: u8,
    pub contract: Address,
}

/// Durable privilege index over the block state
#[derive(Debug, Clone)]
pub struct PrivilegeRegistry {
    types: Arc<PrivilegeTypeTable>,
}

impl PrivilegeRegistry {
    pub fn new(types: Arc<PrivilegeTypeTable>) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &PrivilegeTypeTable {
        &self.types
    }

    /// Register `contract` at the next free position of `privilege`
    ///
    /// # Panics
    /// When the 8-bit position counter of `privilege` is exhausted.
    pub fn append(
        &self,
        ctx: &mut StateContext<'_>,
        privilege: PrivilegeType,
        contract: &Address,
    ) -> Result<u8, PrivilegeError> {
        let last = ctx.first(&RegistrationKey::type_prefix(privilege.tag), Order::Descending)?;
        let last_position = match &last {
            Some((key, _)) => RegistrationKey::decode(key)?.position,
            None => 0,
        };

        if privilege.singleton && last.is_some() {
            return Err(PrivilegeError::DuplicateRegistration {
                privilege: privilege.name,
                reason: "singleton privilege already taken".to_string(),
            });
        }

        let position = match last_position.checked_add(1) {
            Some(p) => p,
            None => panic!(
                "privilege {} position counter overflow: more than {} registrations",
                privilege,
                u8::MAX
            ),
        };

        let key = RegistrationKey::new(privilege.tag, position);
        ctx.set(&key.encode(), contract.as_bytes())?;
        ctx.emit(
            Event::new(EVENT_REGISTER)
                .attr(ATTR_CONTRACT, contract)
                .attr(ATTR_PRIVILEGE, privilege)
                .attr(ATTR_POSITION, position),
        );

        info!("Privilege {} registered for {} at position {}", privilege, contract.short(), position);
        Ok(position)
    }

    /// Remove the registration at `position` if it belongs to `contract`
    pub fn remove(
        &self,
        ctx: &mut StateContext<'_>,
        privilege: PrivilegeType,
        position: u8,
        contract: &Address,
    ) -> Result<bool, PrivilegeError> {
        let key = RegistrationKey::new(privilege.tag, position).encode();
        let stored = match ctx.get(&key)? {
            Some(bytes) => bytes,
            None => return Ok(false),
        };

        if stored.as_slice() != contract.as_bytes() {
            warn!(
                "Privilege {} position {} is held by another contract, not removing for {}",
                privilege,
                position,
                contract.short()
            );
            return Ok(false);
        }

        ctx.delete(&key)?;
        ctx.emit(
            Event::new(EVENT_UNREGISTER)
                .attr(ATTR_CONTRACT, contract)
                .attr(ATTR_PRIVILEGE, privilege)
                .attr(ATTR_POSITION, position),
        );

        info!("Privilege {} removed for {} (position {})", privilege, contract.short(), position);
        Ok(true)
    }

    /// Walk registrations of `privilege` in ascending position order.
    ///
    /// The callback returns `true` to stop.
    pub fn iterate_by_type<F>(&self, ctx: &StateContext<'_>, privilege: PrivilegeType, mut f: F) -> Result<(), PrivilegeError>
    where
        F: FnMut(u8, Address) -> bool,
    {
        for (key, value) in ctx.scan(&RegistrationKey::type_prefix(privilege.tag), Order::Ascending)? {
            let position = RegistrationKey::decode(&key)?.position;
            let contract = Address::from_slice(&value).map_err(|e| PrivilegeError::Codec(e.to_string()))?;
            if f(position, contract) {
                break;
            }
        }
        Ok(())
    }

    /// Snapshot of `(position, contract)` for `privilege`
    pub fn registrations(&self, ctx: &StateContext<'_>, privilege: PrivilegeType) -> Result<Vec<(u8, Address)>, PrivilegeError> {
        let mut out = Vec::new();
        self.iterate_by_type(ctx, privilege, |position, contract| {
            out.push((position, contract));
            false
        })?;
        Ok(out)
    }

    /// Every registration of every known type, in key order
    pub fn all_registrations(&self, ctx: &StateContext<'_>) -> Result<Vec<Registration>, PrivilegeError> {
        let mut out = Vec::new();
        for privilege in self.types.iter() {
            for (position, contract) in self.registrations(ctx, privilege)? {
                out.push(Registration {
                    privilege,
                    position,
                    contract,
                });
            }
        }
        Ok(out)
    }

    /// Walk flagged contracts in key order; the callback returns `true` to stop
    pub fn iterate_privileged<F>(&self, ctx: &StateContext<'_>, mut f: F) -> Result<(), PrivilegeError>
    where
        F: FnMut(Address) -> bool,
    {
        for (key, _) in ctx.scan(PREFIX_PRIVILEGED, Order::Ascending)? {
            let PrivilegedKey(contract) = PrivilegedKey::decode(&key)?;
            if f(contract) {
                break;
            }
        }
        Ok(())
    }

    pub fn privileged_contracts(&self, ctx: &StateContext<'_>) -> Result<Vec<Address>, PrivilegeError> {
        let mut out = Vec::new();
        self.iterate_privileged(ctx, |contract| {
            out.push(contract);
            false
        })?;
        Ok(out)
    }

    pub fn set_flag(&self, ctx: &mut StateContext<'_>, contract: &Address) -> Result<(), PrivilegeError> {
        ctx.set(&PrivilegedKey(*contract).encode(), FLAG_SET)?;
        debug!("Privileged flag set for {}", contract.short());
        Ok(())
    }

    pub fn clear_flag(&self, ctx: &mut StateContext<'_>, contract: &Address) -> Result<(), PrivilegeError> {
        ctx.delete(&PrivilegedKey(*contract).encode())?;
        debug!("Privileged flag cleared for {}", contract.short());
        Ok(())
    }

    pub fn has_flag(&self, ctx: &StateContext<'_>, contract: &Address) -> Result<bool, PrivilegeError> {
        Ok(ctx.has(&PrivilegedKey(*contract).encode())?)
    }

    /// Cheap probe used to skip empty dispatch rounds
    pub fn exists_any(&self, ctx: &StateContext<'_>, privilege: PrivilegeType) -> Result<bool, PrivilegeError> {
        Ok(ctx
            .first(&RegistrationKey::type_prefix(privilege.tag), Order::Ascending)?
            .is_some())
    }

    pub fn slot_taken(&self, ctx: &StateContext<'_>, privilege: PrivilegeType, position: u8) -> Result<bool, PrivilegeError> {
        Ok(ctx.has(&RegistrationKey::new(privilege.tag, position).encode())?)
    }

    /// Write a slot verbatim; genesis import only
    pub(crate) fn put_slot(
        &self,
        ctx: &mut StateContext<'_>,
        privilege: PrivilegeType,
        position: u8,
        contract: &Address,
    ) -> Result<(), PrivilegeError> {
        ctx.set(&RegistrationKey::new(privilege.tag, position).encode(), contract.as_bytes())?;
        Ok(())
    }
}
