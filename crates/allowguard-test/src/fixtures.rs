//! Test fixtures: addresses, call data and typed-data payloads.

use std::sync::Arc;

use alloy_primitives::U256;
use serde_json::{Value, json};

use allowguard_classifier::{BlacklistSet, KnownContracts, PayloadClassifier};
use allowguard_core::{RequestArguments, TransactionParams};

/// A contract on the sample blacklist.
pub const BLACKLISTED_CONTRACT: &str = "0xdead000000000000000000000000000000000000";

/// A contract not on any list.
pub const SAFE_CONTRACT: &str = "0x1111111111111111111111111111111111111111";

/// An ordinary spender / operator address.
pub const SPENDER: &str = "0x2222222222222222222222222222222222222222";

/// The connected account.
pub const ACCOUNT: &str = "0x3333333333333333333333333333333333333333";

/// Seaport 1.5.
pub const SEAPORT: &str = "0x00000000000000adc04c56bf30ac9d3c0aaf14dc";

/// The universal Permit2 contract.
pub const PERMIT2: &str = "0x000000000022d473030f116ddee9f6b43ac78ba3";

/// A classifier over the sample blacklist and the default contract tables.
#[must_use]
pub fn test_classifier() -> PayloadClassifier {
    PayloadClassifier::new(
        Arc::new(BlacklistSet::sample()),
        Arc::new(KnownContracts::default()),
    )
}

fn address_word(address: &str) -> String {
    let digits = address.trim_start_matches("0x").to_ascii_lowercase();
    format!("{digits:0>64}")
}

fn uint_word(value: U256) -> String {
    format!("{value:064x}")
}

/// `approve(spender, amount)` call data.
#[must_use]
pub fn approve_calldata(spender: &str, amount: U256) -> String {
    format!("0x095ea7b3{}{}", address_word(spender), uint_word(amount))
}

/// `increaseAllowance(spender, amount)` call data.
#[must_use]
pub fn increase_allowance_calldata(spender: &str, amount: U256) -> String {
    format!("0x39509351{}{}", address_word(spender), uint_word(amount))
}

/// `setApprovalForAll(operator, approved)` call data.
#[must_use]
pub fn set_approval_for_all_calldata(operator: &str, approved: bool) -> String {
    format!(
        "0xa22cb465{}{}",
        address_word(operator),
        uint_word(U256::from(u8::from(approved)))
    )
}

/// `transfer(to, amount)` call data (not an approval).
#[must_use]
pub fn transfer_calldata(to: &str, amount: U256) -> String {
    format!("0xa9059cbb{}{}", address_word(to), uint_word(amount))
}

/// A transaction to `to` carrying `data`, sent from [`ACCOUNT`].
#[must_use]
pub fn transaction(to: &str, data: impl Into<String>) -> TransactionParams {
    TransactionParams::to(to).with_from(ACCOUNT).with_data(data)
}

/// An `approve(SPENDER, 2^256 - 1)` transaction to `to`.
#[must_use]
pub fn unlimited_approve_tx(to: &str) -> TransactionParams {
    transaction(to, approve_calldata(SPENDER, U256::MAX))
}

/// `eth_sendTransaction` arguments for `tx`.
#[must_use]
pub fn send_transaction_args(tx: &TransactionParams) -> RequestArguments {
    RequestArguments::new("eth_sendTransaction", Some(json!([tx])))
}

/// An EIP-712 typed-data document.
#[must_use]
pub fn typed_data(verifying_contract: &str, primary_type: &str, message: Value) -> Value {
    json!({
        "types": {
            "EIP712Domain": [
                { "name": "name", "type": "string" },
                { "name": "chainId", "type": "uint256" },
                { "name": "verifyingContract", "type": "address" },
            ],
        },
        "primaryType": primary_type,
        "domain": {
            "name": "Test",
            "chainId": 1,
            "verifyingContract": verifying_contract,
        },
        "message": message,
    })
}

/// An ERC-2612 permit granting `spender` an unlimited allowance.
#[must_use]
pub fn unlimited_permit(token: &str, spender: &str) -> Value {
    typed_data(
        token,
        "Permit",
        json!({
            "owner": ACCOUNT,
            "spender": spender,
            "value": U256::MAX.to_string(),
            "nonce": 0,
            "deadline": 4_102_444_800_u64,
        }),
    )
}

/// A Seaport listing order.
#[must_use]
pub fn seaport_order() -> Value {
    typed_data(
        SEAPORT,
        "OrderComponents",
        json!({
            "offerer": ACCOUNT,
            "offer": [{ "itemType": 2, "token": SAFE_CONTRACT, "identifierOrCriteria": "1" }],
            "consideration": [{ "itemType": 0, "startAmount": "1", "recipient": SPENDER }],
        }),
    )
}

/// A harmless login message.
#[must_use]
pub fn login_message() -> Value {
    typed_data(SAFE_CONTRACT, "Login", json!({ "contents": "Hello" }))
}

/// `eth_signTypedData_v4` arguments as wallets receive them:
/// `[account, JSON string]`.
#[must_use]
pub fn sign_typed_data_args(typed: &Value) -> RequestArguments {
    RequestArguments::new(
        "eth_signTypedData_v4",
        Some(json!([ACCOUNT, typed.to_string()])),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_calldata_layout() {
        let data = approve_calldata(SPENDER, U256::from(1));
        assert_eq!(data.len(), 2 + 8 + 128);
        assert!(data.ends_with(&format!("{}1", "0".repeat(63))));
    }

    #[test]
    fn test_fixtures_classify_as_expected() {
        let classifier = test_classifier();
        assert!(classifier.classify_transaction(&unlimited_approve_tx(SAFE_CONTRACT)).is_risky);
        assert!(
            !classifier
                .classify_transaction(&transaction(SAFE_CONTRACT, transfer_calldata(SPENDER, U256::MAX)))
                .is_risky
        );
        let login = sign_typed_data_args(&login_message());
        let verdict = classifier.classify_signature_method(&login.method, login.params.as_ref().unwrap());
        assert!(!verdict.is_risky);
    }
}
