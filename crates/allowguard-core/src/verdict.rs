//! Classifier output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The approval pattern a payload was recognised as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCategory {
    /// Nothing recognised.
    #[default]
    None,
    /// ERC-20 `approve(address,uint256)`.
    Erc20Approve,
    /// ERC-20 `increaseAllowance(address,uint256)`.
    Erc20IncreaseAllowance,
    /// ERC-721/1155 `setApprovalForAll(address,bool)`.
    Erc721SetApprovalForAll,
    /// EIP-2612 / Permit2 style off-chain approval.
    PermitSignature,
    /// Marketplace (Seaport) order signature.
    SeaportOrder,
    /// `eth_sign` of an opaque hash.
    EthSign,
    /// Suspicious, but no specific scheme recognised.
    GenericSuspicious,
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::Erc20Approve => "ERC-20 approve",
            Self::Erc20IncreaseAllowance => "ERC-20 increaseAllowance",
            Self::Erc721SetApprovalForAll => "setApprovalForAll",
            Self::PermitSignature => "permit signature",
            Self::SeaportOrder => "Seaport order",
            Self::EthSign => "eth_sign",
            Self::GenericSuspicious => "suspicious signature",
        };
        f.write_str(label)
    }
}

/// Domain and scheme details extracted from a typed-data signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureDetails {
    /// `domain.verifyingContract`, lowercased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<String>,
    /// `domain.name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    /// `domain.chainId`, rendered as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    /// Declared `primaryType`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_type: Option<String>,
    /// Recognised scheme (`"Seaport"`, `"Permit2"`, a matched type name, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

/// Result of classifying one payload.
///
/// Built once by the classifier and then only read; it crosses context
/// boundaries by value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskVerdict {
    /// Whether the request needs a human decision.
    pub is_risky: bool,
    /// Findings, in detection order.
    pub risk_reasons: Vec<String>,
    /// Recognised approval pattern.
    pub category: RiskCategory,
    /// The contract being called (or the verifying contract of a signature).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    /// Spender or operator receiving the approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spender_or_operator: Option<String>,
    /// Approved amount, as hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// The approval is effectively unlimited.
    pub is_unlimited_amount: bool,
    /// A blacklisted address is involved.
    pub is_blacklisted: bool,
    /// Human-readable method label for the warning view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
    /// Typed-data details, for signature verdicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureDetails>,
}

impl RiskVerdict {
    /// A verdict with no findings.
    #[must_use]
    pub fn safe() -> Self {
        Self::default()
    }

    /// The first finding, used as the warning headline.
    #[must_use]
    pub fn headline(&self) -> Option<&str> {
        self.risk_reasons.first().map(String::as_str)
    }
}

impl fmt::Display for RiskVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_risky {
            return write!(f, "[safe] {}", self.category);
        }
        write!(f, "[risky] {}: {}", self.category, self.risk_reasons.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        let cases = [
            (RiskCategory::None, "NONE"),
            (RiskCategory::Erc20Approve, "ERC20_APPROVE"),
            (RiskCategory::Erc20IncreaseAllowance, "ERC20_INCREASE_ALLOWANCE"),
            (RiskCategory::Erc721SetApprovalForAll, "ERC721_SET_APPROVAL_FOR_ALL"),
            (RiskCategory::PermitSignature, "PERMIT_SIGNATURE"),
            (RiskCategory::SeaportOrder, "SEAPORT_ORDER"),
            (RiskCategory::EthSign, "ETH_SIGN"),
            (RiskCategory::GenericSuspicious, "GENERIC_SUSPICIOUS"),
        ];
        for (category, wire) in cases {
            assert_eq!(serde_json::to_value(category).unwrap(), wire);
        }
    }

    #[test]
    fn test_verdict_field_names() {
        let verdict = RiskVerdict {
            is_risky: true,
            risk_reasons: vec!["unlimited approval".to_owned()],
            category: RiskCategory::Erc20Approve,
            is_unlimited_amount: true,
            ..RiskVerdict::default()
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["isRisky"], true);
        assert_eq!(json["riskReasons"][0], "unlimited approval");
        assert_eq!(json["isUnlimitedAmount"], true);
        assert!(json.get("spenderOrOperator").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(RiskVerdict::safe().to_string(), "[safe] none");
        let verdict = RiskVerdict {
            is_risky: true,
            risk_reasons: vec!["a".to_owned(), "b".to_owned()],
            category: RiskCategory::EthSign,
            ..RiskVerdict::default()
        };
        assert_eq!(verdict.to_string(), "[risky] eth_sign: a; b");
        assert_eq!(verdict.headline(), Some("a"));
    }
}
