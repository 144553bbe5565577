// Genesis - Import/export of the privilege registry
// Principle: Export of an import reproduces the dump byte for byte

use crate::privileged::{Keeper, PrivilegeError};
use crate::storage::StateContext;
use crate::types::{
    Address, CodeId, PrivilegeSlot, PrivilegeTypeTable, SudoMsg, ValidatorDiffResponse, ValidatorUpdate,
    VALIDATOR_SET_UPDATER,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

/// Registry snapshot carried in the chain genesis file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub privileged_contracts: Vec<PrivilegedContractGenesis>,

    #[serde(default)]
    pub pinned_code_ids: Vec<CodeId>,
}

/// Un contrat privilégié et ses enregistrements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegedContractGenesis {
    pub address: Address,

    #[serde(default)]
    pub privileges: Vec<PrivilegeSlot>,
}

impl GenesisState {
    /// Structural checks that need no chain state
    pub fn validate(&self, types: &PrivilegeTypeTable) -> Result<(), PrivilegeError> {
        let mut addresses = HashSet::new();
        let mut slots = HashSet::new();
        let mut singleton_holders: HashMap<&str, Address> = HashMap::new();

        for contract in &self.privileged_contracts {
            if !addresses.insert(contract.address) {
                return Err(invalid(format!("duplicate privileged contract {}", contract.address)));
            }

            for slot in &contract.privileges {
                let privilege = types
                    .by_name(&slot.privilege_type)
                    .ok_or_else(|| invalid(format!("unknown privilege type {:?}", slot.privilege_type)))?;

                if slot.position == 0 {
                    return Err(invalid(format!("{} position must start at 1", privilege)));
                }
                if !slots.insert((privilege.tag, slot.position)) {
                    return Err(invalid(format!("{} position {} listed twice", privilege, slot.position)));
                }
                if privilege.singleton {
                    if let Some(holder) = singleton_holders.insert(privilege.name, contract.address) {
                        return Err(invalid(format!(
                            "singleton privilege {} held by both {} and {}",
                            privilege, holder, contract.address
                        )));
                    }
                }
            }
        }

        let mut pinned = HashSet::new();
        for code_id in &self.pinned_code_ids {
            if !pinned.insert(*code_id) {
                return Err(invalid(format!("code {} pinned twice", code_id)));
            }
        }
        Ok(())
    }

    /// Charge depuis un fichier JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PrivilegeError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| invalid(format!("{}: {}", path.as_ref().display(), e)))?;
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
    }

    /// Sauvegarde vers un fichier JSON
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PrivilegeError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content).map_err(|e| invalid(format!("{}: {}", path.as_ref().display(), e)))
    }
}

fn invalid(reason: String) -> PrivilegeError {
    PrivilegeError::InvalidGenesis(reason)
}

impl Keeper {
    /// Load the registry from a dump.
    ///
    /// The referenced contracts must already be imported into the VM, and
    /// each one's code must be listed in `pinned_code_ids`. If a
    /// validator-set updater ends up registered it is asked once for the
    /// initial validator set; any failure there fails the import.
    pub fn init_genesis(&self, ctx: &mut StateContext<'_>, state: &GenesisState) -> Result<Vec<ValidatorUpdate>, PrivilegeError> {
        state.validate(&self.types)?;

        let pinned: HashSet<CodeId> = state.pinned_code_ids.iter().copied().collect();
        for contract in &state.privileged_contracts {
            // Unknown contracts are reported by the import itself
            if let Some(info) = self.vm.contract_info(ctx, &contract.address)? {
                if !pinned.contains(&info.code_id) {
                    return Err(invalid(format!(
                        "code {} of privileged contract {} missing from pinned code ids",
                        info.code_id, contract.address
                    )));
                }
            }
        }

        for contract in &state.privileged_contracts {
            self.import_privileged(ctx, &contract.address, &contract.privileges)?;
        }
        for code_id in &state.pinned_code_ids {
            self.vm.pin_code(ctx, *code_id)?;
        }

        let updater = self.registry.registrations(ctx, VALIDATOR_SET_UPDATER)?.into_iter().next();
        let diffs = match updater {
            Some((_, contract)) => {
                let data = self.sudo(ctx, &contract, &SudoMsg::EndWithValidatorUpdate {})?;
                ValidatorDiffResponse::parse(data.as_deref())
                    .map_err(|e| invalid(format!("validator set from {}: {}", contract, e)))?
            }
            None => Vec::new(),
        };

        info!(
            "Genesis imported: {} privileged contract(s), {} pinned code(s), {} validator update(s)",
            state.privileged_contracts.len(),
            state.pinned_code_ids.len(),
            diffs.len()
        );
        Ok(diffs)
    }

    /// Dump the registry in canonical order
    pub fn export_genesis(&self, ctx: &StateContext<'_>) -> Result<GenesisState, PrivilegeError> {
        let mut privileged_contracts = Vec::new();
        for address in self.registry.privileged_contracts(ctx)? {
            let info = self.require_contract(ctx, &address)?;
            let mut privileges = info.extension.privileges;
            privileges.sort_by_key(|slot| {
                let tag = self.types.by_name(&slot.privilege_type).map(|t| t.tag).unwrap_or(u8::MAX);
                (tag, slot.position)
            });
            privileged_contracts.push(PrivilegedContractGenesis { address, privileges });
        }

        let mut pinned_code_ids = self.vm.pinned_code_ids(ctx)?;
        pinned_code_ids.sort_unstable();
        pinned_code_ids.dedup();

        Ok(GenesisState {
            privileged_contracts,
            pinned_code_ids,
        })
    }
}
