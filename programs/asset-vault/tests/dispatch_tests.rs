/// Dispatch table and routing tests
///
/// Security coverage:
///  Atomic Add/Replace/Remove batches
///  Built-in instruction selectors never routable
///  Unbound selectors fail closed
///  Reentrancy lock held during a routed call, released on every outcome

mod common;

use anchor_lang::prelude::*;
use asset_vault::{
    constants::*,
    errors::VaultError,
    handlers::{self, Caller, DepositToYieldArgs, YieldPositionsArgs},
    instructions::{push_handler, UpdateDispatch},
    state::{DispatchTable, HandlerAction, Vault, YieldEntry},
};
use common::*;

/// Every binding sits in its handler's group and every grouped selector is
/// bound to that handler; no empty groups, no duplicates
fn assert_mirrored(table: &DispatchTable) {
    for binding in &table.bindings {
        assert_eq!(
            table.bindings.iter().filter(|b| b.selector == binding.selector).count(),
            1,
            "Selector bound twice"
        );
        assert!(
            table.selectors_of(&binding.handler).contains(&binding.selector),
            "Binding missing from its handler group"
        );
    }
    for group in &table.handlers {
        assert!(!group.selectors.is_empty(), "Empty handler group left behind");
        assert_eq!(
            table.handlers.iter().filter(|g| g.handler == group.handler).count(),
            1,
            "Handler grouped twice"
        );
        for selector in &group.selectors {
            assert_eq!(table.handler_for(selector), Some(group.handler));
        }
    }
    let grouped: usize = table.handlers.iter().map(|g| g.selectors.len()).sum();
    assert_eq!(grouped, table.bindings.len());
}

// =============================================================================
// SECURITY TESTS - Batch Validation (Section 1)
// =============================================================================

#[test]
fn test_bootstrap_binds_every_handler_selector() {
    let mut table = DispatchTable::default();
    handlers::bootstrap_dispatch(&mut table, YIELD_HANDLER_ID).unwrap();

    assert_eq!(
        table.selectors_of(&YIELD_HANDLER_ID),
        &[SEL_DEPOSIT_TO_YIELD, SEL_WITHDRAW_FROM_YIELD, SEL_YIELD_POSITIONS]
    );
    assert_eq!(table.route(&SEL_YIELD_POSITIONS).unwrap(), YIELD_HANDLER_ID);

    // Default handler means an empty table
    let mut empty = DispatchTable::default();
    handlers::bootstrap_dispatch(&mut empty, Pubkey::default()).unwrap();
    assert!(empty.bindings.is_empty());
}

#[test]
fn test_add_rejects_bound_selector_and_leaves_table_untouched() {
    // Security: a failed batch must not half-apply
    let h = Harness::new();
    let mut table = h.vault.dispatch.clone();
    let before = table.clone();
    let fresh = selector_of("fresh_operation");

    let result = handlers::update_dispatch(
        &mut table,
        POSITION_HANDLER_ID,
        HandlerAction::Add,
        &[fresh, SEL_DEPOSIT_TO_YIELD],
    );

    assert_vault_error(result, VaultError::InvalidBatch);
    assert_eq!(table, before, "Table must be unchanged after a rejected batch");
    assert!(table.handler_for(&fresh).is_none());
}

#[test]
fn test_duplicate_and_empty_batches_rejected() {
    let mut table = DispatchTable::default();
    let sel = selector_of("some_operation");

    assert_vault_error(
        table.update(YIELD_HANDLER_ID, HandlerAction::Add, &[sel, sel]),
        VaultError::InvalidBatch,
    );
    assert_vault_error(
        table.update(YIELD_HANDLER_ID, HandlerAction::Add, &[]),
        VaultError::InvalidBatch,
    );
}

#[test]
fn test_builtin_selectors_cannot_be_bound() {
    // Security: vault instructions are never shadowed by a handler
    let mut table = DispatchTable::default();
    for builtin in BUILTIN_SELECTORS {
        assert_vault_error(
            table.update(POSITION_HANDLER_ID, HandlerAction::Add, &[builtin]),
            VaultError::InvalidBatch,
        );
    }
}

#[test]
fn test_unknown_handler_rejected_for_add_and_replace() {
    let h = Harness::new();
    let mut table = h.vault.dispatch.clone();
    let stranger = Pubkey::new_unique();

    assert_vault_error(
        handlers::update_dispatch(&mut table, stranger, HandlerAction::Add, &[selector_of("x")]),
        VaultError::InvalidBatch,
    );
    assert_vault_error(
        handlers::update_dispatch(&mut table, stranger, HandlerAction::Replace, &[SEL_YIELD_POSITIONS]),
        VaultError::InvalidBatch,
    );
}

#[test]
fn test_replace_requires_a_different_bound_handler() {
    let h = Harness::new();
    let mut table = h.vault.dispatch.clone();

    // Same handler: nothing to replace
    assert_vault_error(
        table.update(YIELD_HANDLER_ID, HandlerAction::Replace, &[SEL_YIELD_POSITIONS]),
        VaultError::InvalidBatch,
    );
    // Unbound selector
    assert_vault_error(
        table.update(YIELD_HANDLER_ID, HandlerAction::Replace, &[selector_of("unbound")]),
        VaultError::InvalidBatch,
    );

    table
        .update(POSITION_HANDLER_ID, HandlerAction::Replace, &[SEL_YIELD_POSITIONS])
        .unwrap();
    assert_eq!(table.route(&SEL_YIELD_POSITIONS).unwrap(), POSITION_HANDLER_ID);
    assert!(!table.selectors_of(&YIELD_HANDLER_ID).contains(&SEL_YIELD_POSITIONS));
    assert!(table.selectors_of(&POSITION_HANDLER_ID).contains(&SEL_YIELD_POSITIONS));
}

#[test]
fn test_remove_requires_default_handler_and_bound_selectors() {
    let h = Harness::new();
    let mut table = h.vault.dispatch.clone();

    assert_vault_error(
        table.update(YIELD_HANDLER_ID, HandlerAction::Remove, &[SEL_YIELD_POSITIONS]),
        VaultError::InvalidBatch,
    );
    assert_vault_error(
        table.update(Pubkey::default(), HandlerAction::Remove, &[selector_of("unbound")]),
        VaultError::InvalidBatch,
    );

    table
        .update(
            Pubkey::default(),
            HandlerAction::Remove,
            &[SEL_DEPOSIT_TO_YIELD, SEL_WITHDRAW_FROM_YIELD, SEL_YIELD_POSITIONS],
        )
        .unwrap();

    assert!(table.handler_for(&SEL_DEPOSIT_TO_YIELD).is_none());
    // No empty handler groups are left behind
    assert!(table.selectors_of(&YIELD_HANDLER_ID).is_empty());
    assert!(table.handlers.iter().all(|group| !group.selectors.is_empty()));
}

#[test]
fn test_mixed_batches_keep_bindings_and_groups_mirrored() {
    let mut table = DispatchTable::default();
    let a = selector_of("op_a");
    let b = selector_of("op_b");
    let c = selector_of("op_c");
    let d = selector_of("op_d");

    let script: &[(Pubkey, HandlerAction, Vec<Selector>, bool)] = &[
        (YIELD_HANDLER_ID, HandlerAction::Add, vec![a, b, c], true),
        (POSITION_HANDLER_ID, HandlerAction::Add, vec![d], true),
        (POSITION_HANDLER_ID, HandlerAction::Replace, vec![a, b], true),
        // Half-valid batch: d is already on the position handler
        (POSITION_HANDLER_ID, HandlerAction::Replace, vec![c, d], false),
        (Pubkey::default(), HandlerAction::Remove, vec![c], true),
        (YIELD_HANDLER_ID, HandlerAction::Add, vec![c, d], false),
        (YIELD_HANDLER_ID, HandlerAction::Replace, vec![a, b, d], true),
        (Pubkey::default(), HandlerAction::Remove, vec![a, b, d, c], false),
        (Pubkey::default(), HandlerAction::Remove, vec![a, b, d], true),
    ];

    for (step, (handler, action, selectors, accepted)) in script.iter().enumerate() {
        let before = table.clone();
        let result = handlers::update_dispatch(&mut table, *handler, *action, selectors);
        assert_eq!(result.is_ok(), *accepted, "step {}", step);
        if !accepted {
            assert_eq!(table, before, "step {} must not half-apply", step);
        }
        assert_mirrored(&table);
    }

    assert!(table.bindings.is_empty());
    assert!(table.handlers.is_empty());
}

#[test]
fn test_push_handler_instruction_is_add_only() {
    let mut vault = Vault::new(Pubkey::new_unique(), Pubkey::new_unique(), 255);
    handlers::bootstrap_dispatch(&mut vault.dispatch, YIELD_HANDLER_ID).unwrap();

    let program_id = asset_vault::ID;
    let system = Pubkey::default();
    let owner_key = vault.owner;
    let vault_key = Pubkey::new_unique();

    let mut owner_lamports = 0u64;
    let mut owner_data: Vec<u8> = Vec::new();
    let owner_info = AccountInfo::new(
        &owner_key,
        true,
        false,
        &mut owner_lamports,
        &mut owner_data,
        &system,
        false,
        0,
    );

    let mut vault_lamports = 1u64;
    let mut vault_data = Vec::new();
    vault.try_serialize(&mut vault_data).unwrap();
    let vault_info = AccountInfo::new(
        &vault_key,
        false,
        true,
        &mut vault_lamports,
        &mut vault_data,
        &program_id,
        false,
        0,
    );

    let mut accounts = UpdateDispatch {
        owner: Signer::try_from(&owner_info).unwrap(),
        vault: Account::try_from(&vault_info).unwrap(),
    };

    // Fresh selector binds like Add
    let fresh = selector_of("fresh_operation");
    let ctx = Context::new(&program_id, &mut accounts, &[], Default::default());
    push_handler(ctx, POSITION_HANDLER_ID, vec![fresh]).unwrap();
    assert_eq!(accounts.vault.dispatch.handler_for(&fresh), Some(POSITION_HANDLER_ID));
    assert_mirrored(&accounts.vault.dispatch);

    // Security: never overwrites an existing binding
    let before = accounts.vault.dispatch.clone();
    let ctx = Context::new(&program_id, &mut accounts, &[], Default::default());
    assert_vault_error(
        push_handler(ctx, POSITION_HANDLER_ID, vec![SEL_DEPOSIT_TO_YIELD]),
        VaultError::InvalidBatch,
    );
    assert_eq!(accounts.vault.dispatch, before);
}

// =============================================================================
// SECURITY TESTS - Routing (Section 2)
// =============================================================================

#[test]
fn test_route_unbound_selector_fails_with_no_handler() {
    let mut h = Harness::new();
    let result: Result<()> = h.invoke(selector_of("not_bound"), &());
    assert_vault_error(result, VaultError::NoHandler);
}

#[test]
fn test_route_after_remove_fails_with_no_handler() {
    let mut h = Harness::new();
    h.vault
        .dispatch
        .update(Pubkey::default(), HandlerAction::Remove, &[SEL_YIELD_POSITIONS])
        .unwrap();

    let result: Result<Vec<YieldEntry>> =
        h.invoke(SEL_YIELD_POSITIONS, &YieldPositionsArgs { asset: h.token0 });
    assert_vault_error(result, VaultError::NoHandler);
}

#[test]
fn test_replaced_selector_routes_to_new_handler() {
    // The position handler has no yield_positions operation, so the call
    // reaching it proves the binding moved
    let mut h = Harness::new();
    h.vault
        .dispatch
        .update(POSITION_HANDLER_ID, HandlerAction::Replace, &[SEL_YIELD_POSITIONS])
        .unwrap();

    let result: Result<Vec<YieldEntry>> =
        h.invoke(SEL_YIELD_POSITIONS, &YieldPositionsArgs { asset: h.token0 });
    assert_vault_error(result, VaultError::NoHandler);
}

#[test]
fn test_malformed_calldata_rejected() {
    let mut h = Harness::new();
    let mut call = h.call(Caller::Owner);
    let result = handlers::route(&mut call, SEL_DEPOSIT_TO_YIELD, &[1, 2, 3]);
    assert_vault_error(result, VaultError::InvalidCalldata);
}

// =============================================================================
// SECURITY TESTS - Reentrancy (Section 8)
// =============================================================================

#[test]
fn test_locked_vault_rejects_routed_calls() {
    let mut h = Harness::new();
    h.vault.lock().unwrap();

    let result: Result<Vec<YieldEntry>> =
        h.invoke(SEL_YIELD_POSITIONS, &YieldPositionsArgs { asset: h.token0 });
    assert_vault_error(result, VaultError::Reentrancy);
}

#[test]
fn test_lock_released_after_failed_call() {
    let mut h = Harness::new();
    let asset = h.token0;
    h.fund(1_000, 0);

    // Zero amount fails inside the handler
    let failed: Result<u64> = h.invoke(SEL_DEPOSIT_TO_YIELD, &DepositToYieldArgs { asset, amount: 0 });
    assert_vault_error(failed, VaultError::ZeroAmount);
    assert!(!h.vault.locked, "Lock must be released on error");

    let entry_id: u64 = h
        .invoke(SEL_DEPOSIT_TO_YIELD, &DepositToYieldArgs { asset, amount: 500 })
        .unwrap();
    assert_eq!(entry_id, 0);
    assert!(!h.vault.locked, "Lock must be released on success");
}
