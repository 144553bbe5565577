// Genesis Tests - Import/export of the privilege registry

#[cfg(test)]
mod genesis_tests {
    use crate::genesis::{GenesisState, PrivilegedContractGenesis};
    use crate::host::VmError;
    use crate::privileged::PrivilegeError;
    use crate::storage::{BlockInfo, MemoryStore, StateContext};
    use crate::tests::mocks::*;
    use crate::types::{
        PrivilegeSlot, PrivilegeTypeTable, SudoMsg, ValidatorDiffResponse, ValidatorUpdate, BEGIN_BLOCKER, END_BLOCKER,
        GOV_PROPOSAL_EXECUTOR, VALIDATOR_SET_UPDATER,
    };
    use ed25519_dalek::SigningKey;

    fn slot(name: &str, position: u8) -> PrivilegeSlot {
        PrivilegeSlot {
            privilege_type: name.to_string(),
            position,
        }
    }

    fn validator(seed: u8, power: u64) -> ValidatorUpdate {
        ValidatorUpdate::new(&SigningKey::from_bytes(&[seed; 32]).verifying_key(), power)
    }

    /// Contracts 1..=3 with code ids 1..=3; contract 3 answers with one validator
    fn load_contracts(vm: &MockVm, ctx: &mut StateContext<'_>) {
        for b in 1..=3u8 {
            vm.instantiate(ctx, addr(b), b as u64);
        }
        vm.script(addr(3), |_, _, msg, _| {
            if *msg == (SudoMsg::EndWithValidatorUpdate {}) {
                let response = ValidatorDiffResponse { diffs: vec![validator(9, 10)] };
                return Ok(Some(serde_json::to_vec(&response).unwrap()));
            }
            Ok(None)
        });
    }

    fn sample_state() -> GenesisState {
        GenesisState {
            privileged_contracts: vec![
                PrivilegedContractGenesis {
                    address: addr(1),
                    privileges: vec![slot(BEGIN_BLOCKER.name, 1), slot(END_BLOCKER.name, 1)],
                },
                PrivilegedContractGenesis {
                    address: addr(2),
                    privileges: vec![slot(BEGIN_BLOCKER.name, 2), slot(GOV_PROPOSAL_EXECUTOR.name, 1)],
                },
                PrivilegedContractGenesis {
                    address: addr(3),
                    privileges: vec![slot(VALIDATOR_SET_UPDATER.name, 1)],
                },
            ],
            pinned_code_ids: vec![1, 2, 3, 9],
        }
    }

    #[test]
    fn test_import_restores_registry_and_validators() {
        let vm = MockVm::new();
        let keeper = keeper(&vm);
        let mut store = MemoryStore::new();
        let mut ctx = StateContext::new(&mut store, BlockInfo::default());
        load_contracts(&vm, &mut ctx);

        let diffs = keeper.init_genesis(&mut ctx, &sample_state()).unwrap();
        assert_eq!(diffs, vec![validator(9, 10)]);

        assert_eq!(keeper.privileged_contracts(&ctx).unwrap(), vec![addr(1), addr(2), addr(3)]);
        assert_eq!(
            keeper.contracts_by_privilege(&ctx, BEGIN_BLOCKER.name).unwrap(),
            vec![(1, addr(1)), (2, addr(2))]
        );
        assert!(keeper.has_privilege(&ctx, &addr(2), GOV_PROPOSAL_EXECUTOR).unwrap());
        assert!(vm.is_pinned(&ctx, 9));
        // No lifecycle callbacks at import, only the validator-set query
        assert_eq!(vm.calls(), vec![(addr(3), SudoMsg::EndWithValidatorUpdate {})]);
        // Positions continue after the imported ones
        assert_eq!(keeper.registry().append(&mut ctx, BEGIN_BLOCKER, &addr(1)).unwrap(), 3);
    }

    #[test]
    fn test_export_of_import_is_byte_identical() {
        let original = serde_json::to_vec(&sample_state()).unwrap();

        let vm = MockVm::new();
        let keeper = keeper(&vm);
        let mut store = MemoryStore::new();
        let mut ctx = StateContext::new(&mut store, BlockInfo::default());
        load_contracts(&vm, &mut ctx);
        keeper.init_genesis(&mut ctx, &sample_state()).unwrap();
        let exported = keeper.export_genesis(&ctx).unwrap();
        assert_eq!(serde_json::to_vec(&exported).unwrap(), original);

        // And once more from the exported dump
        let vm2 = MockVm::new();
        let keeper2 = crate::tests::mocks::keeper(&vm2);
        let mut store2 = MemoryStore::new();
        let mut ctx2 = StateContext::new(&mut store2, BlockInfo::default());
        load_contracts(&vm2, &mut ctx2);
        keeper2.init_genesis(&mut ctx2, &exported).unwrap();
        let again = keeper2.export_genesis(&ctx2).unwrap();
        assert_eq!(serde_json::to_vec(&again).unwrap(), original);
    }

    #[test]
    fn test_export_after_runtime_changes_is_canonical() {
        let vm = MockVm::new();
        let keeper = keeper(&vm);
        let mut store = MemoryStore::new();
        let mut ctx = StateContext::new(&mut store, BlockInfo::default());

        let a = addr(4);
        vm.instantiate(&mut ctx, a, 4);
        // Registers in reverse tag order
        registers_on_promotion(&vm, a, &["token_minter", "end_blocker", "begin_blocker"]);
        keeper.promote(&mut ctx, &a).unwrap();

        let exported = keeper.export_genesis(&ctx).unwrap();
        let names: Vec<&str> = exported.privileged_contracts[0]
            .privileges
            .iter()
            .map(|s| s.privilege_type.as_str())
            .collect();
        assert_eq!(names, vec!["begin_blocker", "end_blocker", "token_minter"]);
        assert_eq!(exported.pinned_code_ids, vec![4]);
    }

    #[test]
    fn test_import_rejects_unknown_contract() {
        let vm = MockVm::new();
        let keeper = keeper(&vm);
        let mut store = MemoryStore::new();
        let mut ctx = StateContext::new(&mut store, BlockInfo::default());

        let state = GenesisState {
            privileged_contracts: vec![PrivilegedContractGenesis {
                address: addr(8),
                privileges: vec![slot(END_BLOCKER.name, 1)],
            }],
            pinned_code_ids: vec![],
        };
        let err = keeper.init_genesis(&mut ctx, &state).unwrap_err();
        assert!(matches!(err, PrivilegeError::InvalidGenesis(reason) if reason.contains("not found")));
    }

    #[test]
    fn test_import_rejects_index_collision() {
        let vm = MockVm::new();
        let keeper = keeper(&vm);
        let mut store = MemoryStore::new();
        let mut ctx = StateContext::new(&mut store, BlockInfo::default());
        load_contracts(&vm, &mut ctx);

        keeper.registry().append(&mut ctx, END_BLOCKER, &addr(2)).unwrap();
        let state = GenesisState {
            privileged_contracts: vec![PrivilegedContractGenesis {
                address: addr(1),
                privileges: vec![slot(END_BLOCKER.name, 1)],
            }],
            pinned_code_ids: vec![1],
        };
        let err = keeper.init_genesis(&mut ctx, &state).unwrap_err();
        assert!(matches!(err, PrivilegeError::InvalidGenesis(reason) if reason.contains("already registered")));
    }

    #[test]
    fn test_import_rejects_unpinned_privileged_code() {
        let vm = MockVm::new();
        let keeper = keeper(&vm);
        let mut store = MemoryStore::new();
        let mut ctx = StateContext::new(&mut store, BlockInfo::default());
        vm.instantiate(&mut ctx, addr(5), 5);

        let state = GenesisState {
            privileged_contracts: vec![PrivilegedContractGenesis {
                address: addr(5),
                privileges: vec![slot(END_BLOCKER.name, 1)],
            }],
            pinned_code_ids: vec![],
        };
        assert!(state.validate(&PrivilegeTypeTable::standard()).is_ok());

        let err = keeper.init_genesis(&mut ctx, &state).unwrap_err();
        assert!(matches!(err, PrivilegeError::InvalidGenesis(reason) if reason.contains("missing from pinned")));
        // Nothing was imported
        assert!(!keeper.is_privileged(&ctx, &addr(5)).unwrap());
        assert!(!vm.is_pinned(&ctx, 5));
        assert_eq!(keeper.export_genesis(&ctx).unwrap(), GenesisState::default());

        // Listing the code makes the dump round-trip byte for byte
        let state = GenesisState {
            pinned_code_ids: vec![5],
            ..state
        };
        keeper.init_genesis(&mut ctx, &state).unwrap();
        let exported = keeper.export_genesis(&ctx).unwrap();
        assert_eq!(serde_json::to_vec(&exported).unwrap(), serde_json::to_vec(&state).unwrap());
    }

    #[test]
    fn test_import_rejects_unknown_privilege_type() {
        let vm = MockVm::new();
        let keeper = keeper(&vm);
        let mut store = MemoryStore::new();
        let mut ctx = StateContext::new(&mut store, BlockInfo::default());
        load_contracts(&vm, &mut ctx);

        let state = GenesisState {
            privileged_contracts: vec![PrivilegedContractGenesis {
                address: addr(1),
                privileges: vec![slot("time_traveller", 1)],
            }],
            pinned_code_ids: vec![],
        };
        assert!(matches!(keeper.init_genesis(&mut ctx, &state), Err(PrivilegeError::InvalidGenesis(_))));
    }

    #[test]
    fn test_import_fails_when_validator_updater_fails() {
        let vm = MockVm::new();
        let keeper = keeper(&vm);
        let mut store = MemoryStore::new();
        let mut ctx = StateContext::new(&mut store, BlockInfo::default());
        load_contracts(&vm, &mut ctx);
        vm.script(addr(3), |_, _, _, _| Err(VmError::Execution("no validators".into())));

        let err = keeper.init_genesis(&mut ctx, &sample_state()).unwrap_err();
        assert!(matches!(err, PrivilegeError::Vm(VmError::Execution(_))));
    }

    #[test]
    fn test_import_fails_on_malformed_validator_set() {
        let vm = MockVm::new();
        let keeper = keeper(&vm);
        let mut store = MemoryStore::new();
        let mut ctx = StateContext::new(&mut store, BlockInfo::default());
        load_contracts(&vm, &mut ctx);
        vm.script(addr(3), |_, _, _, _| Ok(Some(b"[not a response]".to_vec())));

        let err = keeper.init_genesis(&mut ctx, &sample_state()).unwrap_err();
        assert!(matches!(err, PrivilegeError::InvalidGenesis(_)));
    }

    #[test]
    fn test_export_of_empty_state() {
        let vm = MockVm::new();
        let keeper = keeper(&vm);
        let mut store = MemoryStore::new();
        let ctx = StateContext::new(&mut store, BlockInfo::default());

        let exported = keeper.export_genesis(&ctx).unwrap();
        assert_eq!(exported, GenesisState::default());
    }
}
