//! Migration engine tests: step semantics, idempotency, ordering,
//! partial failure, and the availability gate.

mod common;

use common::*;

use braintree_bridge::migration::{self, gate, MigrationSelection, StepId};
use std::collections::HashMap;

fn selection(
    configuration: bool,
    customer_data: bool,
    disable_legacy: bool,
    remove_legacy: bool,
    order_transaction_info: bool,
) -> MigrationSelection {
    MigrationSelection {
        configuration,
        customer_data,
        disable_legacy,
        remove_legacy,
        order_transaction_info,
    }
}

// ============ Selection decoding ============

#[test]
fn form_map_accepts_on_one_and_true() {
    for flag in ["on", "1", "true"] {
        let mut map = HashMap::new();
        map.insert("configuration-settings".to_string(), flag.to_string());
        let sel = MigrationSelection::from_form_map(&map);
        assert!(sel.configuration, "flag value {flag:?} should select");
    }

    let mut map = HashMap::new();
    map.insert("configuration-settings".to_string(), "off".to_string());
    map.insert("customer-data".to_string(), "0".to_string());
    let sel = MigrationSelection::from_form_map(&map);
    assert!(!sel.configuration);
    assert!(!sel.customer_data);
    assert!(!sel.any());
}

#[test]
fn remove_without_disable_is_dropped() {
    let mut map = HashMap::new();
    map.insert("remove-legacy".to_string(), "on".to_string());
    let sel = MigrationSelection::from_form_map(&map);
    assert!(!sel.remove_legacy);
    assert!(!sel.any());

    map.insert("disable-legacy".to_string(), "on".to_string());
    let sel = MigrationSelection::from_form_map(&map);
    assert!(sel.disable_legacy);
    assert!(sel.remove_legacy);
}

// ============ Configuration transfer ============

#[test]
fn config_transfer_copies_production_credentials() {
    let state = test_state();
    seed_legacy_config(&state);

    let conn = state.db.get().unwrap();
    let result = migration::run(&conn, &selection(true, false, false, false, false));
    assert!(result.all_succeeded());

    let merchant = queries::get_config_at(&conn, ConfigScope::Default, paths::NEW_MERCHANT_ID_PATH)
        .unwrap();
    assert_eq!(merchant.as_deref(), Some("legacy_merchant"));
    let public = queries::get_config_at(
        &conn,
        ConfigScope::Default,
        "payment/braintree/public_key",
    )
    .unwrap();
    assert_eq!(public.as_deref(), Some("legacy_public"));

    // Production credentials never land in the sandbox slots.
    let sandbox = queries::get_config_at(
        &conn,
        ConfigScope::Default,
        paths::NEW_SANDBOX_MERCHANT_ID_PATH,
    )
    .unwrap();
    assert_eq!(sandbox, None);
}

#[test]
fn config_transfer_is_idempotent() {
    let state = test_state();
    seed_legacy_config(&state);

    let conn = state.db.get().unwrap();
    let first = migration::run(&conn, &selection(true, false, false, false, false));
    let first_count = first.debug()["configuration-settings"]["paths_transferred"]
        .as_u64()
        .unwrap();
    assert!(first_count > 0);

    let second = migration::run(&conn, &selection(true, false, false, false, false));
    let second_count = second.debug()["configuration-settings"]["paths_transferred"]
        .as_u64()
        .unwrap();
    assert_eq!(second_count, 0, "re-run must transfer nothing");
}

#[test]
fn sandbox_environment_routes_to_sandbox_paths() {
    let state = test_state();
    let conn = state.db.get().unwrap();
    queries::set_config(&conn, ConfigScope::Default, paths::LEGACY_ENVIRONMENT_PATH, "sandbox")
        .unwrap();
    queries::set_config(&conn, ConfigScope::Default, paths::LEGACY_MERCHANT_ID_PATH, "abc")
        .unwrap();

    let result = migration::run(&conn, &selection(true, false, false, false, false));
    assert!(result.all_succeeded());

    let debug = result.debug();
    assert_eq!(debug["configuration-settings"]["environment"], "sandbox");
    assert_eq!(debug["configuration-settings"]["paths_transferred"], 1);

    let sandbox = queries::get_config_at(
        &conn,
        ConfigScope::Default,
        paths::NEW_SANDBOX_MERCHANT_ID_PATH,
    )
    .unwrap();
    assert_eq!(sandbox.as_deref(), Some("abc"));
    let production =
        queries::get_config_at(&conn, ConfigScope::Default, paths::NEW_MERCHANT_ID_PATH).unwrap();
    assert_eq!(production, None);
}

#[test]
fn config_transfer_respects_store_inheritance() {
    let state = test_state();
    seed_legacy_config(&state);
    let override_store = create_test_store(&state, "override");
    let inheriting_store = create_test_store(&state, "inherit");

    let conn = state.db.get().unwrap();
    queries::set_config(
        &conn,
        ConfigScope::Store(override_store),
        paths::LEGACY_MERCHANT_ID_PATH,
        "store_merchant",
    )
    .unwrap();

    let result = migration::run(&conn, &selection(true, false, false, false, false));
    assert!(result.all_succeeded());

    // Explicit legacy override becomes an explicit new override.
    let explicit = queries::get_config_at(
        &conn,
        ConfigScope::Store(override_store),
        paths::NEW_MERCHANT_ID_PATH,
    )
    .unwrap();
    assert_eq!(explicit.as_deref(), Some("store_merchant"));

    // A store that only inherited the default gets no spurious row.
    let spurious = queries::get_config_at(
        &conn,
        ConfigScope::Store(inheriting_store),
        paths::NEW_MERCHANT_ID_PATH,
    )
    .unwrap();
    assert_eq!(spurious, None);
    let resolved = queries::resolve_config(
        &conn,
        ConfigScope::Store(inheriting_store),
        paths::NEW_MERCHANT_ID_PATH,
    )
    .unwrap();
    assert_eq!(resolved.as_deref(), Some("legacy_merchant"));
}

// ============ Customer data ============

#[test]
fn customer_transfer_fills_only_empty_references() {
    let state = test_state();
    let pending = create_test_customer(&state, "pending@example.com", Some("legacy-1"));
    let populated = create_test_customer(&state, "done@example.com", Some("legacy-2"));
    {
        let conn = state.db.get().unwrap();
        // Already migrated with a reference that differs from the legacy one.
        assert!(queries::set_customer_payment_ref_if_absent(&conn, populated, "existing-ref")
            .unwrap());
    }

    let conn = state.db.get().unwrap();
    let result = migration::run(&conn, &selection(false, true, false, false, false));
    let debug = result.debug();
    assert_eq!(debug["customer-data"]["customers_examined"], 1);
    assert_eq!(debug["customer-data"]["customers_migrated"], 1);

    let migrated = queries::get_customer_by_id(&conn, pending).unwrap().unwrap();
    assert_eq!(migrated.braintree_customer_id.as_deref(), Some("legacy-1"));
    let untouched = queries::get_customer_by_id(&conn, populated).unwrap().unwrap();
    assert_eq!(untouched.braintree_customer_id.as_deref(), Some("existing-ref"));

    // Re-run finds nothing left to do.
    let rerun = migration::run(&conn, &selection(false, true, false, false, false));
    assert_eq!(rerun.debug()["customer-data"]["customers_migrated"], 0);
}

// ============ Ordering and partial failure ============

#[test]
fn steps_execute_in_fixed_order() {
    let state = test_state();
    seed_legacy_config(&state);

    let conn = state.db.get().unwrap();
    let result = migration::run(&conn, &selection(true, true, true, true, true));

    let ids: Vec<StepId> = result.steps().iter().map(|report| report.step).collect();
    assert_eq!(
        ids,
        vec![
            StepId::ConfigurationSettings,
            StepId::CustomerData,
            StepId::LegacyMethods,
            StepId::OrderTransactionInfo,
        ]
    );
}

#[test]
fn failed_step_does_not_abort_later_steps() {
    let state = test_state();
    let store_id = create_test_store(&state, "main");
    create_test_order(&state, "100000001", store_id, "processing", "legacy_braintree", Some("tx1"));

    let conn = state.db.get().unwrap();
    // Break the customer step only.
    conn.execute_batch("DROP TABLE legacy_customer_refs").unwrap();

    let result = migration::run(&conn, &selection(false, true, false, false, true));
    assert!(!result.all_succeeded());
    assert!(!result.step_succeeded(StepId::CustomerData));
    assert!(result.step_succeeded(StepId::OrderTransactionInfo));

    let debug = result.debug();
    assert_eq!(debug["customer-data"]["success"], false);
    assert!(debug["customer-data"]["error"].is_string());
    assert_eq!(debug["order-transaction-info"]["payments_backfilled"], 1);
}

// ============ Legacy disable/remove ============

#[test]
fn disable_clears_store_overrides_and_remove_deregisters() {
    let state = test_state();
    seed_legacy_config(&state);
    let store_id = create_test_store(&state, "main");

    let conn = state.db.get().unwrap();
    queries::set_config(
        &conn,
        ConfigScope::Store(store_id),
        "payment/legacy_braintree/active",
        "1",
    )
    .unwrap();

    let result = migration::run(&conn, &selection(false, false, true, true, false));
    assert!(result.all_succeeded());

    let default_active = queries::get_config_at(
        &conn,
        ConfigScope::Default,
        "payment/legacy_braintree/active",
    )
    .unwrap();
    assert_eq!(default_active.as_deref(), Some("0"));

    let store_override = queries::get_config_at(
        &conn,
        ConfigScope::Store(store_id),
        "payment/legacy_braintree/active",
    )
    .unwrap();
    assert_eq!(store_override, None, "store override must be dropped, not set");

    assert!(!queries::module_registered(&conn, "legacy_braintree").unwrap());

    let debug = result.debug();
    assert_eq!(debug["legacy-methods"]["modules_removed"][0], "legacy_braintree");
}

#[test]
fn disable_without_remove_keeps_module_registered() {
    let state = test_state();
    seed_legacy_config(&state);

    let conn = state.db.get().unwrap();
    let result = migration::run(&conn, &selection(false, false, true, false, false));
    assert!(result.all_succeeded());
    assert!(queries::module_registered(&conn, "legacy_braintree").unwrap());
}

// ============ Order transaction-info backfill ============

#[test]
fn backfill_writes_info_and_skips_populated_rows() {
    let state = test_state();
    let store_id = create_test_store(&state, "main");
    let fresh = create_test_order(&state, "1001", store_id, "complete", "legacy_braintree", Some("tx-a"));
    let no_txn = create_test_order(&state, "1002", store_id, "complete", "legacy_braintree", None);
    let other = create_test_order(&state, "1003", store_id, "complete", "braintree", Some("tx-c"));
    {
        let conn = state.db.get().unwrap();
        let already = queries::create_order(&conn, "1004", store_id, "complete").unwrap();
        queries::create_order_payment(
            &conn,
            already,
            "legacy_braintree_paypal",
            Some("tx-d"),
            None,
            None,
            Some(r#"{"transaction_id":"tx-d","note":"hand written"}"#),
        )
        .unwrap();
    }

    let conn = state.db.get().unwrap();
    let result = migration::run(&conn, &selection(false, false, false, false, true));
    let debug = result.debug();
    assert_eq!(debug["order-transaction-info"]["payments_backfilled"], 1);
    assert_eq!(debug["order-transaction-info"]["payments_skipped"], 2);

    let payment = queries::get_order_payment(&conn, fresh).unwrap().unwrap();
    let info = payment.info();
    assert_eq!(info["transaction_id"], "tx-a");
    assert_eq!(info["cc_last4"], "1111");
    assert_eq!(info["cc_type"], "VI");
    assert_eq!(info["migrated_from"], "legacy_braintree");

    // Row without a transaction id stays empty.
    let untouched = queries::get_order_payment(&conn, no_txn).unwrap().unwrap();
    assert!(untouched.info().is_empty());

    // Non-legacy methods are out of scope entirely.
    let foreign = queries::get_order_payment(&conn, other).unwrap().unwrap();
    assert!(foreign.info().is_empty());
}

#[test]
fn backfill_is_idempotent() {
    let state = test_state();
    let store_id = create_test_store(&state, "main");
    create_test_order(&state, "2001", store_id, "complete", "legacy_braintree", Some("tx-z"));

    let conn = state.db.get().unwrap();
    migration::run(&conn, &selection(false, false, false, false, true));
    let rerun = migration::run(&conn, &selection(false, false, false, false, true));
    let debug = rerun.debug();
    assert_eq!(debug["order-transaction-info"]["payments_backfilled"], 0);
    assert_eq!(debug["order-transaction-info"]["payments_skipped"], 1);
}

// ============ Availability gate ============

#[test]
fn gate_closed_without_legacy_traces() {
    let state = test_state();
    let conn = state.db.get().unwrap();
    assert!(!gate::can_run(&conn, &state.config_cache).unwrap());
}

#[test]
fn gate_opens_on_legacy_config_or_module() {
    let state = test_state();
    {
        let conn = state.db.get().unwrap();
        queries::set_config(&conn, ConfigScope::Default, paths::LEGACY_MERCHANT_ID_PATH, "m")
            .unwrap();
        assert!(gate::can_run(&conn, &state.config_cache).unwrap());
    }

    // Module registration alone is also a legacy trace.
    let state = test_state();
    let conn = state.db.get().unwrap();
    queries::register_module(&conn, "legacy_braintree", true).unwrap();
    assert!(gate::can_run(&conn, &state.config_cache).unwrap());
}

#[test]
fn gate_closed_once_new_extension_configured() {
    let state = test_state();
    seed_legacy_config(&state);
    let conn = state.db.get().unwrap();
    queries::set_config(&conn, ConfigScope::Default, paths::NEW_SANDBOX_MERCHANT_ID_PATH, "sb")
        .unwrap();
    state.config_cache.invalidate();
    assert!(!gate::can_run(&conn, &state.config_cache).unwrap());
}

#[test]
fn completion_flag_latches_permanently() {
    let state = test_state();
    seed_legacy_config(&state);
    let conn = state.db.get().unwrap();
    assert!(gate::can_run(&conn, &state.config_cache).unwrap());

    gate::mark_complete(&conn, &state.config_cache).unwrap();
    assert!(gate::is_complete(&conn, &state.config_cache).unwrap());
    assert!(!gate::can_run(&conn, &state.config_cache).unwrap());
}
