//! EIP-712 typed-data extraction and field helpers.

use serde_json::{Map, Value};

use allowguard_core::RiskCategory;

/// Type names that mark a typed-data payload as approval-granting.
///
/// Matched case-insensitively as substrings, in this order; the first hit
/// names the finding.
pub const SENSITIVE_TYPES: [&str; 10] = [
    "Permit",
    "PermitSingle",
    "PermitBatch",
    "OrderComponents",
    "Order",
    "BulkOrder",
    "SetApprovalForAll",
    "Approval",
    "increaseAllowance",
    "TokenPermissions",
];

/// Low-confidence keywords scanned over the whole payload when nothing
/// structured matched.
pub const SUSPICIOUS_KEYWORDS: [&str; 8] = [
    "spender",
    "operator",
    "approved",
    "allowance",
    "permit",
    "seaport",
    "offer",
    "consideration",
];

/// Decimal strings longer than this are treated as unlimited amounts.
const UNLIMITED_DIGITS: usize = 50;

/// Locate and parse the typed-data object in a signing call's params.
///
/// Params may be `[address, typedData]`, `[typedData, address]`, or the bare
/// typed data. The lookup is `params[1]`, falling back to `params[0]` when
/// index 1 is missing or does not hold typed data; this is the same
/// `params[1] || params[0]` order wallets use for `eth_signTypedData_v3/v4`.
/// A candidate is accepted when it is an object or a string that parses to
/// one.
#[must_use]
pub fn extract(params: &Value) -> Option<Map<String, Value>> {
    match params {
        Value::Array(items) => [1usize, 0]
            .into_iter()
            .filter_map(|i| items.get(i))
            .find_map(as_object),
        other => as_object(other),
    }
}

fn as_object(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "typed data is not valid JSON");
                None
            },
        },
        _ => None,
    }
}

/// JavaScript-style truthiness of a message field.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A field rendered as text: strings verbatim, everything else as JSON.
#[must_use]
pub fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether an amount field looks like an unlimited approval: a long run of
/// `f` digits, or more than 50 characters.
#[must_use]
pub fn looks_unlimited(value: &Value) -> bool {
    let text = field_text(value).to_ascii_lowercase();
    text.contains("ffffffff") || text.len() > UNLIMITED_DIGITS
}

/// First sensitive type name contained in `haystack`, case-insensitively.
#[must_use]
pub fn find_sensitive_type(haystack: &str) -> Option<&'static str> {
    let lower = haystack.to_ascii_lowercase();
    SENSITIVE_TYPES
        .into_iter()
        .find(|t| lower.contains(&t.to_ascii_lowercase()))
}

/// First suspicious keyword in `haystack`, which must already be lowercase.
#[must_use]
pub fn find_keyword(haystack: &str) -> Option<&'static str> {
    SUSPICIOUS_KEYWORDS
        .into_iter()
        .find(|k| haystack.contains(k))
}

/// Category implied by a sensitive type name.
#[must_use]
pub fn type_category(name: &str) -> RiskCategory {
    match name {
        "OrderComponents" | "Order" | "BulkOrder" => RiskCategory::SeaportOrder,
        "SetApprovalForAll" => RiskCategory::Erc721SetApprovalForAll,
        _ => RiskCategory::PermitSignature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_prefers_second_param() {
        let params = json!(["0xabc", { "primaryType": "Permit" }]);
        let data = extract(&params).unwrap();
        assert_eq!(data["primaryType"], "Permit");
    }

    #[test]
    fn test_extract_second_param_wins_when_both_are_typed_data() {
        let params = json!([{ "primaryType": "Order" }, { "primaryType": "Permit" }]);
        assert_eq!(extract(&params).unwrap()["primaryType"], "Permit");
    }

    #[test]
    fn test_extract_falls_back_to_first_param() {
        let params = json!([{ "primaryType": "Order" }, "0xabc"]);
        assert_eq!(extract(&params).unwrap()["primaryType"], "Order");

        let params = json!([r#"{"primaryType":"Permit"}"#]);
        assert_eq!(extract(&params).unwrap()["primaryType"], "Permit");
    }

    #[test]
    fn test_extract_rejects_unparseable() {
        assert!(extract(&json!(["0xabc", "{not json"])).is_none());
        assert!(extract(&json!([])).is_none());
        assert!(extract(&json!(42)).is_none());
        assert!(extract(&json!("[1, 2]")).is_none());
    }

    #[test]
    fn test_sensitive_type_order() {
        assert_eq!(find_sensitive_type("PermitSingle"), Some("Permit"));
        assert_eq!(find_sensitive_type("orderComponents"), Some("OrderComponents"));
        assert_eq!(find_sensitive_type("Mail"), None);
    }

    #[test]
    fn test_unlimited_amount_heuristic() {
        assert!(looks_unlimited(&json!("0xffffffffffffffffffff")));
        assert!(looks_unlimited(&json!("1".repeat(51))));
        assert!(!looks_unlimited(&json!("1000000")));
        assert!(!looks_unlimited(&json!(1_000_000)));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!("0x1")));
        assert!(is_truthy(&json!([])));
    }
}
