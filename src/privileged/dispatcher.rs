// Dispatcher - Begin/end-of-block callbacks into privileged contracts
// Principle: A failing contract loses its own effects, never the block

use super::error::PrivilegeError;
use super::keeper::Keeper;
use crate::host::OutOfGas;
use crate::storage::StateContext;
use crate::types::{
    Evidence, EvidenceKind, EvidenceValidator, Misbehavior, PrivilegeType, SudoMsg, ValidatorDiffResponse,
    ValidatorUpdate, BEGIN_BLOCKER, END_BLOCKER, VALIDATOR_SET_UPDATER,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

impl Keeper {
    /// Start-of-block hook.
    ///
    /// Calls every begin-blocker in position order, each in its own branch.
    /// Only an exhausted execution budget or a store failure comes back as
    /// `Err`; contract errors and panics are logged and skipped.
    ///
    /// # Panics
    /// On evidence of a misbehavior kind this node does not know.
    pub fn on_block_start(&self, ctx: &mut StateContext<'_>, misbehavior: &[Misbehavior]) -> Result<(), PrivilegeError> {
        let evidence: Vec<Evidence> = misbehavior.iter().map(to_evidence).collect();
        self.call_blockers(ctx, BEGIN_BLOCKER, &SudoMsg::BeginBlock { evidence })
    }

    /// End-of-block hook.
    ///
    /// Runs the end-blockers like `on_block_start`, then asks the
    /// validator-set updater for this block's diffs. A panic in the updater
    /// is not caught.
    pub fn on_block_end(&self, ctx: &mut StateContext<'_>) -> Result<Vec<ValidatorUpdate>, PrivilegeError> {
        self.call_blockers(ctx, END_BLOCKER, &SudoMsg::EndBlock {})?;
        self.call_validator_set_updater(ctx)
    }

    fn call_blockers(&self, ctx: &mut StateContext<'_>, privilege: PrivilegeType, msg: &SudoMsg) -> Result<(), PrivilegeError> {
        if !self.registry.exists_any(ctx, privilege)? {
            return Ok(());
        }
        let msg = msg.to_bytes()?;

        // Registrations made during this round take effect next block
        let targets = self.registry.registrations(ctx, privilege)?;
        for (position, contract) in targets {
            let mut branch = ctx.branch();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.vm.sudo(&mut branch, &contract, &msg, self)));

            match outcome {
                Ok(Ok(_)) => {
                    branch.commit()?;
                    debug!("{} callback of {} (position {}) committed", privilege, contract.short(), position);
                }
                Ok(Err(err)) => {
                    if err.is_out_of_gas() {
                        return Err(err.into());
                    }
                    error!(
                        contract = %contract,
                        privilege = %privilege,
                        position,
                        cause = %err,
                        "privileged contract callback failed"
                    );
                }
                Err(payload) => {
                    if payload.is::<OutOfGas>() {
                        panic::resume_unwind(payload);
                    }
                    error!(
                        contract = %contract,
                        privilege = %privilege,
                        position,
                        cause = %panic_cause(payload.as_ref()),
                        "privileged contract panicked"
                    );
                }
            }
        }
        Ok(())
    }

    fn call_validator_set_updater(&self, ctx: &mut StateContext<'_>) -> Result<Vec<ValidatorUpdate>, PrivilegeError> {
        let updater = match self.registry.registrations(ctx, VALIDATOR_SET_UPDATER)?.into_iter().next() {
            Some((_, contract)) => contract,
            None => return Ok(Vec::new()),
        };

        let mut branch = ctx.branch();
        let data = match self.sudo(&mut branch, &updater, &SudoMsg::EndWithValidatorUpdate {}) {
            Ok(data) => data,
            Err(err) if err.is_out_of_gas() => return Err(err),
            Err(err) => {
                error!(contract = %updater, cause = %err, "validator set update failed");
                return Ok(Vec::new());
            }
        };

        match ValidatorDiffResponse::parse(data.as_deref()) {
            Ok(diffs) => {
                for diff in &diffs {
                    if let Err(err) = diff.verifying_key() {
                        warn!(
                            contract = %updater,
                            pubkey = %diff.pubkey,
                            cause = %err,
                            "validator diff key is not an Ed25519 point"
                        );
                    }
                }
                branch.commit()?;
                if !diffs.is_empty() {
                    info!("Validator set updater {} returned {} diff(s)", updater.short(), diffs.len());
                }
                Ok(diffs)
            }
            Err(err) => {
                error!(contract = %updater, cause = %err, "validator set update returned an invalid payload");
                Ok(Vec::new())
            }
        }
    }
}

fn to_evidence(m: &Misbehavior) -> Evidence {
    let evidence_type = match EvidenceKind::from_code(m.kind_code) {
        Some(kind) => kind,
        None => panic!("unknown misbehavior kind {} at height {}", m.kind_code, m.height),
    };
    Evidence {
        evidence_type,
        validator: EvidenceValidator {
            address: hex::encode(&m.validator_address),
            power: m.validator_power,
        },
        height: m.height,
        time: m.time,
        total_voting_power: m.total_voting_power,
    }
}

/// Panic payload as a single log-friendly string
fn panic_cause(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
