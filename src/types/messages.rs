// Messages - Wire protocol between privileged contracts and the host
// Principle: Tagged unions keyed by field presence; add tags, never rename them

use super::primitives::{Address, AddressError, BlockHeight, CodeId, Coin};
use super::validator::Evidence;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ===== Host -> contract (sudo entry point) =====

/// Messages delivered through the system-only sudo entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SudoMsg {
    /// The contract gained or lost privileged status
    PrivilegeChange(PrivilegeChange),

    /// Start of block, with the misbehavior evidence seen for this block
    BeginBlock { evidence: Vec<Evidence> },

    /// End of block
    EndBlock {},

    /// End of block for the validator-set updater; the response data carries
    /// the validator diffs
    EndWithValidatorUpdate {},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeChange {
    Promoted {},
    Demoted {},
}

impl SudoMsg {
    pub fn promoted() -> Self {
        SudoMsg::PrivilegeChange(PrivilegeChange::Promoted {})
    }

    pub fn demoted() -> Self {
        SudoMsg::PrivilegeChange(PrivilegeChange::Demoted {})
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

// ===== Contract -> host =====

/// Envelope of a message emitted by an executing contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractMsg {
    /// Privileged host operations; payload is a JSON `PrivilegedMsg`
    Privileged(Vec<u8>),

    /// Anything routed elsewhere in the host
    Other { type_url: String, value: Vec<u8> },
}

impl ContractMsg {
    pub fn privileged(msg: &PrivilegedMsg) -> Result<Self, serde_json::Error> {
        Ok(ContractMsg::Privileged(serde_json::to_vec(msg)?))
    }
}

/// Payload of a `ContractMsg::Privileged` envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegedMsg {
    /// Register for or release a privilege type
    Privilege(PrivilegeMsg),

    /// Execute an approved governance action
    ExecuteGovProposal {
        title: String,
        description: String,
        proposal: GovProposalMsg,
    },

    /// Mint native tokens to a recipient
    MintTokens {
        denom: String,
        amount: String,
        recipient: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeMsg {
    Request(String),
    Release(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamChange {
    pub subspace: String,
    pub key: String,
    pub value: String,
}

/// Governance action shapes a contract may submit, as sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovProposalMsg {
    /// Signaling only
    Text {},
    RegisterUpgrade {
        name: String,
        height: BlockHeight,
        #[serde(default)]
        info: String,
    },
    CancelUpgrade {},
    ChangeParams(Vec<ParamChange>),
    IbcClientUpdate {
        subject_client_id: String,
        substitute_client_id: String,
    },
    PromoteToPrivilegedContract {
        contract: String,
    },
    DemotePrivilegedContract {
        contract: String,
    },
    InstantiateContract {
        #[serde(default)]
        admin: Option<String>,
        code_id: CodeId,
        label: String,
        msg: serde_json::Value,
        #[serde(default)]
        funds: Vec<Coin>,
    },
    MigrateContract {
        contract: String,
        code_id: CodeId,
        migrate_msg: serde_json::Value,
    },
    SetContractAdmin {
        contract: String,
        new_admin: String,
    },
    ClearContractAdmin {
        contract: String,
    },
    PinCodes {
        code_ids: Vec<CodeId>,
    },
    UnpinCodes {
        code_ids: Vec<CodeId>,
    },
}

pub const ROUTE_GOV: &str = "gov";
pub const ROUTE_UPGRADE: &str = "upgrade";
pub const ROUTE_PARAMS: &str = "params";
pub const ROUTE_IBC_CLIENT: &str = "ibc";
pub const ROUTE_WASM: &str = "wasm";
pub const ROUTE_PRIVILEGED: &str = "privileged";

pub const MAX_TITLE_LEN: usize = 140;
pub const MAX_DESCRIPTION_LEN: usize = 10_000;

/// Decoded, structurally valid governance action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovContent {
    Text,
    RegisterUpgrade { name: String, height: BlockHeight, info: String },
    CancelUpgrade,
    ChangeParams(Vec<ParamChange>),
    IbcClientUpdate { subject_client_id: String, substitute_client_id: String },
    PromoteToPrivileged(Address),
    DemotePrivileged(Address),
    InstantiateContract {
        admin: Option<Address>,
        code_id: CodeId,
        label: String,
        msg: Vec<u8>,
        funds: Vec<Coin>,
    },
    MigrateContract { contract: Address, code_id: CodeId, msg: Vec<u8> },
    SetContractAdmin { contract: Address, new_admin: Address },
    ClearContractAdmin(Address),
    PinCodes(Vec<CodeId>),
    UnpinCodes(Vec<CodeId>),
}

impl GovContent {
    /// Router key of the governance handler responsible for this action
    pub fn route(&self) -> &'static str {
        match self {
            GovContent::Text => ROUTE_GOV,
            GovContent::RegisterUpgrade { .. } | GovContent::CancelUpgrade => ROUTE_UPGRADE,
            GovContent::ChangeParams(_) => ROUTE_PARAMS,
            GovContent::IbcClientUpdate { .. } => ROUTE_IBC_CLIENT,
            GovContent::PromoteToPrivileged(_) | GovContent::DemotePrivileged(_) => ROUTE_PRIVILEGED,
            GovContent::InstantiateContract { .. }
            | GovContent::MigrateContract { .. }
            | GovContent::SetContractAdmin { .. }
            | GovContent::ClearContractAdmin(_)
            | GovContent::PinCodes(_)
            | GovContent::UnpinCodes(_) => ROUTE_WASM,
        }
    }
}

/// A governance action ready to hand to the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovAction {
    pub title: String,
    pub description: String,
    pub content: GovContent,
}

impl GovAction {
    pub fn route(&self) -> &'static str {
        self.content.route()
    }

    /// Decode the wire form, applying each shape's own structural checks
    pub fn from_msg(title: String, description: String, proposal: GovProposalMsg) -> Result<Self, ProposalError> {
        if title.trim().is_empty() {
            return Err(ProposalError::EmptyField("title"));
        }
        if title.len() > MAX_TITLE_LEN {
            return Err(ProposalError::TooLong("title", MAX_TITLE_LEN));
        }
        if description.trim().is_empty() {
            return Err(ProposalError::EmptyField("description"));
        }
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(ProposalError::TooLong("description", MAX_DESCRIPTION_LEN));
        }

        let content = match proposal {
            GovProposalMsg::Text {} => GovContent::Text,
            GovProposalMsg::RegisterUpgrade { name, height, info } => {
                if name.trim().is_empty() {
                    return Err(ProposalError::EmptyField("name"));
                }
                if height == 0 {
                    return Err(ProposalError::Invalid("upgrade height must be positive".into()));
                }
                GovContent::RegisterUpgrade { name, height, info }
            }
            GovProposalMsg::CancelUpgrade {} => GovContent::CancelUpgrade,
            GovProposalMsg::ChangeParams(changes) => {
                if changes.is_empty() {
                    return Err(ProposalError::EmptyField("changes"));
                }
                for change in &changes {
                    if change.subspace.trim().is_empty() {
                        return Err(ProposalError::EmptyField("subspace"));
                    }
                    if change.key.trim().is_empty() {
                        return Err(ProposalError::EmptyField("key"));
                    }
                }
                GovContent::ChangeParams(changes)
            }
            GovProposalMsg::IbcClientUpdate {
                subject_client_id,
                substitute_client_id,
            } => {
                if subject_client_id.is_empty() {
                    return Err(ProposalError::EmptyField("subject_client_id"));
                }
                if substitute_client_id.is_empty() {
                    return Err(ProposalError::EmptyField("substitute_client_id"));
                }
                if subject_client_id == substitute_client_id {
                    return Err(ProposalError::Invalid("subject and substitute client are identical".into()));
                }
                GovContent::IbcClientUpdate {
                    subject_client_id,
                    substitute_client_id,
                }
            }
            GovProposalMsg::PromoteToPrivilegedContract { contract } => {
                GovContent::PromoteToPrivileged(parse_address("contract", &contract)?)
            }
            GovProposalMsg::DemotePrivilegedContract { contract } => {
                GovContent::DemotePrivileged(parse_address("contract", &contract)?)
            }
            GovProposalMsg::InstantiateContract {
                admin,
                code_id,
                label,
                msg,
                funds,
            } => {
                let admin = admin
                    .filter(|a| !a.is_empty())
                    .map(|a| parse_address("admin", &a))
                    .transpose()?;
                if code_id == 0 {
                    return Err(ProposalError::Invalid("code id must be positive".into()));
                }
                if label.trim().is_empty() {
                    return Err(ProposalError::EmptyField("label"));
                }
                for coin in &funds {
                    coin.validate().map_err(|e| ProposalError::Invalid(e.to_string()))?;
                }
                GovContent::InstantiateContract {
                    admin,
                    code_id,
                    label,
                    msg: encode_json(&msg)?,
                    funds,
                }
            }
            GovProposalMsg::MigrateContract {
                contract,
                code_id,
                migrate_msg,
            } => {
                let contract = parse_address("contract", &contract)?;
                if code_id == 0 {
                    return Err(ProposalError::Invalid("code id must be positive".into()));
                }
                GovContent::MigrateContract {
                    contract,
                    code_id,
                    msg: encode_json(&migrate_msg)?,
                }
            }
            GovProposalMsg::SetContractAdmin { contract, new_admin } => GovContent::SetContractAdmin {
                contract: parse_address("contract", &contract)?,
                new_admin: parse_address("new_admin", &new_admin)?,
            },
            GovProposalMsg::ClearContractAdmin { contract } => {
                GovContent::ClearContractAdmin(parse_address("contract", &contract)?)
            }
            GovProposalMsg::PinCodes { code_ids } => GovContent::PinCodes(validate_code_ids(code_ids)?),
            GovProposalMsg::UnpinCodes { code_ids } => GovContent::UnpinCodes(validate_code_ids(code_ids)?),
        };

        Ok(Self {
            title,
            description,
            content,
        })
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ProposalError> {
    value
        .parse()
        .map_err(|e: AddressError| ProposalError::InvalidAddress(field, e.to_string()))
}

fn encode_json(value: &serde_json::Value) -> Result<Vec<u8>, ProposalError> {
    if value.is_null() {
        return Err(ProposalError::EmptyField("msg"));
    }
    serde_json::to_vec(value).map_err(|e| ProposalError::Invalid(e.to_string()))
}

fn validate_code_ids(code_ids: Vec<CodeId>) -> Result<Vec<CodeId>, ProposalError> {
    if code_ids.is_empty() {
        return Err(ProposalError::EmptyField("code_ids"));
    }
    let mut seen = HashSet::new();
    for id in &code_ids {
        if *id == 0 {
            return Err(ProposalError::Invalid("code id must be positive".into()));
        }
        if !seen.insert(*id) {
            return Err(ProposalError::Invalid(format!("duplicate code id {}", id)));
        }
    }
    Ok(code_ids)
}

/// Structural validation failures of a governance action
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProposalError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{0} exceeds {1} bytes")]
    TooLong(&'static str, usize),

    #[error("invalid {0}: {1}")]
    InvalidAddress(&'static str, String),

    #[error("{0}")]
    Invalid(String),
}
