//! Bridge from `allowguard_config::GuardConfig` to runtime types.

use std::sync::Arc;

use anyhow::{Result, anyhow};

use allowguard_bridge::BridgeOptions;
use allowguard_classifier::{BlacklistSet, KnownContracts, PayloadClassifier};
use allowguard_config::GuardConfig;
use allowguard_interceptor::InterceptorOptions;
use allowguard_ledger::LedgerOptions;

/// Build the classifier from the configured address lists.
pub(crate) fn classifier(config: &GuardConfig) -> Result<PayloadClassifier> {
    let blacklist = BlacklistSet::from_hex(&config.blacklist.addresses)
        .map_err(|bad| anyhow!("invalid blacklist address: {bad}"))?;
    let contracts = KnownContracts::from_hex(
        &config.contracts.marketplaces,
        &config.contracts.permits,
    )
    .map_err(|bad| anyhow!("invalid known contract address: {bad}"))?;
    Ok(PayloadClassifier::new(Arc::new(blacklist), Arc::new(contracts)))
}

/// Settings each execution context would run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RuntimeSettings {
    pub(crate) interceptor: InterceptorOptions,
    pub(crate) bridge: BridgeOptions,
    pub(crate) ledger: LedgerOptions,
}

/// Derive the per-context settings from `config`.
pub(crate) fn runtime_settings(config: &GuardConfig) -> RuntimeSettings {
    RuntimeSettings {
        interceptor: InterceptorOptions::from(&config.interceptor),
        bridge: BridgeOptions::from(&config.bridge),
        ledger: LedgerOptions::from(&config.ledger),
    }
}
