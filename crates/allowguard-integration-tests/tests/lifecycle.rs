//! Lifecycle tests: signatures, limits, expiry, timeouts and diagnostics.

mod common;

use std::time::Duration;

use serde_json::json;

use allowguard_bridge::{BridgeOptions, ConfirmResponse, DEFAULT_CONFIRMATION_PHRASE, PromptChoice};
use allowguard_core::message::{BridgeToBackground, GuardEventType};
use allowguard_core::{Decision, RequestKind, RiskCategory};
use allowguard_interceptor::InterceptorOptions;
use allowguard_ledger::LedgerOptions;
use allowguard_test::{
    GuardHarness, HarnessOptions, MockProvider, SAFE_CONTRACT, SPENDER, login_message,
    seaport_order, send_transaction_args, sign_typed_data_args, unlimited_approve_tx,
    unlimited_permit,
};

use common::{spawn_request, within};

#[tokio::test]
async fn test_unlimited_permit_signature_needs_typed_phrase() {
    let harness = GuardHarness::new(MockProvider::new().with_reply(json!("0xsig")));
    let provider = harness.provider();
    let call = spawn_request(
        &provider,
        sign_typed_data_args(&unlimited_permit(SAFE_CONTRACT, SPENDER)),
    );

    let warning = within(harness.prompt().next_shown()).await.unwrap();
    assert_eq!(warning.kind, RequestKind::Signature);
    assert_eq!(warning.analysis.category, RiskCategory::PermitSignature);
    assert!(warning.analysis.is_unlimited_amount);

    harness
        .prompt()
        .proceed_with(ConfirmResponse::Typed(DEFAULT_CONFIRMATION_PHRASE.to_owned()));
    assert_eq!(within(call).await.unwrap().unwrap(), json!("0xsig"));
    assert_eq!(harness.wallet().methods(), vec!["eth_signTypedData_v4"]);
}

#[tokio::test]
async fn test_marketplace_order_is_flagged_and_blocked() {
    let harness = GuardHarness::new(MockProvider::new());
    let provider = harness.provider();
    let call = spawn_request(&provider, sign_typed_data_args(&seaport_order()));

    let warning = within(harness.prompt().next_shown()).await.unwrap();
    assert_eq!(warning.analysis.category, RiskCategory::SeaportOrder);
    assert_eq!(
        warning
            .analysis
            .signature
            .as_ref()
            .and_then(|s| s.scheme.as_deref()),
        Some("Seaport")
    );

    harness.prompt().choose(PromptChoice::Block);
    let err = within(call).await.unwrap().unwrap_err();
    assert_eq!(err.message, "Signature blocked by Approval Guard");
}

#[tokio::test]
async fn test_harmless_typed_data_is_not_interrupted() {
    let harness = GuardHarness::new(MockProvider::new());
    let provider = harness.provider();

    within(provider.request(sign_typed_data_args(&login_message())))
        .await
        .unwrap();
    assert_eq!(harness.wallet().call_count(), 1);
    assert!(harness.service().ledger().is_empty());
}

#[tokio::test]
async fn test_full_correlation_map_blocks_the_oldest() {
    let harness = GuardHarness::with_options(
        MockProvider::new(),
        HarnessOptions {
            bridge: BridgeOptions::default().with_max_pending(1),
            ..HarnessOptions::default()
        },
    );
    let provider = harness.provider();

    let oldest = spawn_request(
        &provider,
        send_transaction_args(&unlimited_approve_tx(SAFE_CONTRACT)),
    );
    within(harness.prompt().next_shown()).await.unwrap();

    let newest = spawn_request(
        &provider,
        send_transaction_args(&unlimited_approve_tx(SAFE_CONTRACT)),
    );
    assert!(within(oldest).await.unwrap().is_err());

    within(harness.prompt().next_shown()).await.unwrap();
    assert_eq!(harness.bridge().pending_count(), 1);
    assert_eq!(harness.service().ledger().len(), 1);
    harness.prompt().proceed_with(ConfirmResponse::Accepted);
    within(newest).await.unwrap().unwrap();
    assert_eq!(harness.wallet().call_count(), 1);
    assert!(harness.service().ledger().is_empty());
}

#[tokio::test]
async fn test_expired_ledger_entry_blocks_the_page() {
    let harness = GuardHarness::with_options(
        MockProvider::new(),
        HarnessOptions {
            ledger: LedgerOptions {
                ttl: Some(Duration::from_millis(10)),
            },
            ..HarnessOptions::default()
        },
    );
    let provider = harness.provider();
    let call = spawn_request(
        &provider,
        send_transaction_args(&unlimited_approve_tx(SAFE_CONTRACT)),
    );
    let warning = within(harness.prompt().next_shown()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    // Any background message triggers the sweep.
    harness.service().handle(BridgeToBackground::Ping, None);

    let err = within(call).await.unwrap().unwrap_err();
    assert!(err.is_user_rejection());
    assert!(harness.service().ledger().get(&warning.tx_id).is_none());
    assert_eq!(harness.wallet().call_count(), 0);
}

#[tokio::test]
async fn test_decision_timeout_applies_fallback() {
    let harness = GuardHarness::with_options(
        MockProvider::new(),
        HarnessOptions {
            interceptor: InterceptorOptions {
                decision_timeout: Some(Duration::from_millis(30)),
                timeout_fallback: Decision::Block,
                ..InterceptorOptions::default()
            },
            ..HarnessOptions::default()
        },
    );
    let provider = harness.provider();

    let err = within(provider.request(send_transaction_args(&unlimited_approve_tx(
        SAFE_CONTRACT,
    ))))
    .await
    .unwrap_err();
    assert!(err.is_user_rejection());
    assert_eq!(harness.gate().pending_count(), 0);
    assert_eq!(harness.wallet().call_count(), 0);
}

#[tokio::test]
async fn test_bridge_events_reach_the_background() {
    let harness = GuardHarness::new(MockProvider::new());
    let mut intercepted = harness
        .service()
        .events()
        .subscribe_kind(GuardEventType::TransactionIntercepted);
    let mut decisions = harness
        .service()
        .events()
        .subscribe_kind(GuardEventType::UserDecision);
    let _forwarder = harness.forward_events();

    let provider = harness.provider();
    let call = spawn_request(
        &provider,
        send_transaction_args(&unlimited_approve_tx(SAFE_CONTRACT)),
    );
    within(harness.prompt().next_shown()).await.unwrap();
    harness.prompt().choose(PromptChoice::Block);
    assert!(within(call).await.unwrap().is_err());

    let event = within(intercepted.recv()).await.unwrap();
    assert_eq!(event.metadata.source, "background");

    let decision = within(decisions.recv()).await.unwrap();
    assert_eq!(decision.details["decision"], json!("BLOCK"));
    assert_eq!(decision.details["type"], json!("transaction"));
}
