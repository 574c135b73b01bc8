//! ABI calldata decoding for the approval selectors.
//!
//! Decoding works on fixed hex offsets of the call-data string: the 4-byte
//! selector, then 32-byte words. Each word decodes independently, so a
//! truncated or malformed argument only loses that one finding.

use alloy_primitives::{Address, U256};
use allowguard_core::RiskCategory;

/// Hex digits in the 4-byte selector.
const SELECTOR_DIGITS: usize = 8;
/// Hex digits in one ABI word.
const WORD_DIGITS: usize = 64;

/// Amounts at or above 2^255 count as unlimited.
pub const UNLIMITED_THRESHOLD: U256 = U256::from_limbs([0, 0, 0, 0x8000_0000_0000_0000]);

/// The approval functions the classifier recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApprovalSelector {
    /// `approve(address,uint256)`.
    Approve,
    /// `increaseAllowance(address,uint256)`.
    IncreaseAllowance,
    /// `setApprovalForAll(address,bool)`.
    SetApprovalForAll,
}

impl ApprovalSelector {
    /// Every recognised selector.
    pub const ALL: [Self; 3] = [Self::Approve, Self::IncreaseAllowance, Self::SetApprovalForAll];

    /// The 4-byte selector.
    #[must_use]
    pub const fn bytes(self) -> [u8; 4] {
        match self {
            Self::Approve => [0x09, 0x5e, 0xa7, 0xb3],
            Self::IncreaseAllowance => [0x39, 0x50, 0x93, 0x51],
            Self::SetApprovalForAll => [0xa2, 0x2c, 0xb4, 0x65],
        }
    }

    /// Look up a selector.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.bytes() == bytes)
    }

    /// Label shown in the warning view.
    #[must_use]
    pub fn method_name(self) -> &'static str {
        match self {
            Self::Approve => "approve (ERC-20)",
            Self::IncreaseAllowance => "increaseAllowance (ERC-20)",
            Self::SetApprovalForAll => "setApprovalForAll (ERC-721/ERC-1155)",
        }
    }

    /// Verdict category for this selector.
    #[must_use]
    pub fn category(self) -> RiskCategory {
        match self {
            Self::Approve => RiskCategory::Erc20Approve,
            Self::IncreaseAllowance => RiskCategory::Erc20IncreaseAllowance,
            Self::SetApprovalForAll => RiskCategory::Erc721SetApprovalForAll,
        }
    }
}

/// Lowercased call data, without the `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calldata {
    hex: String,
}

impl Calldata {
    /// Normalise a call-data string. Missing data is empty data.
    #[must_use]
    pub fn new(data: Option<&str>) -> Self {
        let lower = data.unwrap_or_default().trim().to_ascii_lowercase();
        let hex = match lower.strip_prefix("0x") {
            Some(rest) => rest.to_owned(),
            None => lower,
        };
        Self { hex }
    }

    /// The leading 4-byte selector, if present and well-formed.
    #[must_use]
    pub fn selector(&self) -> Option<[u8; 4]> {
        let digits = self.hex.get(..SELECTOR_DIGITS)?;
        let mut out = [0u8; 4];
        hex::decode_to_slice(digits, &mut out).ok()?;
        Some(out)
    }

    /// The recognised approval selector, if any.
    #[must_use]
    pub fn approval_selector(&self) -> Option<ApprovalSelector> {
        self.selector().and_then(ApprovalSelector::from_bytes)
    }

    /// The `index`-th 32-byte argument word.
    #[must_use]
    pub fn word(&self, index: usize) -> Option<[u8; 32]> {
        let start = index
            .checked_mul(WORD_DIGITS)?
            .checked_add(SELECTOR_DIGITS)?;
        let end = start.checked_add(WORD_DIGITS)?;
        let digits = self.hex.get(start..end)?;
        let mut out = [0u8; 32];
        hex::decode_to_slice(digits, &mut out).ok()?;
        Some(out)
    }

    /// The `index`-th argument as a left-padded address.
    ///
    /// The padding bytes are not checked.
    #[must_use]
    pub fn address_arg(&self, index: usize) -> Option<Address> {
        self.word(index).map(|w| Address::from_slice(&w[12..]))
    }

    /// The `index`-th argument as a big-endian `uint256`.
    #[must_use]
    pub fn uint_arg(&self, index: usize) -> Option<U256> {
        self.word(index).map(U256::from_be_bytes)
    }

    /// The `index`-th argument as a `bool`: any non-zero final byte is true.
    #[must_use]
    pub fn bool_arg(&self, index: usize) -> Option<bool> {
        self.word(index).map(|w| w[31] != 0)
    }
}

/// Whether an approval amount counts as unlimited.
#[must_use]
pub fn is_unlimited(amount: U256) -> bool {
    amount >= UNLIMITED_THRESHOLD
}

/// Render a 32-byte word as `0x` plus 64 lowercase hex digits.
#[must_use]
pub fn word_hex(word: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPENDER: &str = "0000000000000000000000001111111111111111111111111111111111111111";

    fn approve(amount_word: &str) -> Calldata {
        Calldata::new(Some(&format!("0x095ea7b3{SPENDER}{amount_word}")))
    }

    #[test]
    fn test_selector_lookup() {
        let data = Calldata::new(Some("0x095EA7B3"));
        assert_eq!(data.approval_selector(), Some(ApprovalSelector::Approve));
        let data = Calldata::new(Some("0xa22cb465"));
        assert_eq!(data.approval_selector(), Some(ApprovalSelector::SetApprovalForAll));
        let data = Calldata::new(Some("0x39509351"));
        assert_eq!(data.approval_selector(), Some(ApprovalSelector::IncreaseAllowance));
        let data = Calldata::new(Some("0xa9059cbb"));
        assert_eq!(data.approval_selector(), None);
        assert_eq!(Calldata::new(None).selector(), None);
        assert_eq!(Calldata::new(Some("0x095e")).selector(), None);
    }

    #[test]
    fn test_decodes_spender_and_amount() {
        let data = approve(&"f".repeat(64));
        assert_eq!(
            data.address_arg(0).unwrap(),
            Address::from_slice(&[0x11; 20])
        );
        assert_eq!(data.uint_arg(1).unwrap(), U256::MAX);
        assert!(is_unlimited(data.uint_arg(1).unwrap()));
    }

    #[test]
    fn test_unlimited_threshold_boundary() {
        let at = approve(&format!("8{}", "0".repeat(63)));
        assert!(is_unlimited(at.uint_arg(1).unwrap()));

        let below = approve(&format!("7{}", "f".repeat(63)));
        assert!(!is_unlimited(below.uint_arg(1).unwrap()));

        let one = approve(&format!("{}1", "0".repeat(63)));
        assert_eq!(one.uint_arg(1).unwrap(), U256::from(1));
    }

    #[test]
    fn test_truncated_argument_is_absent() {
        let data = Calldata::new(Some(&format!("0x095ea7b3{SPENDER}ffff")));
        assert!(data.address_arg(0).is_some());
        assert!(data.uint_arg(1).is_none());

        let data = Calldata::new(Some(&format!("0x095ea7b3{}", "zz".repeat(32))));
        assert!(data.address_arg(0).is_none());
    }

    #[test]
    fn test_bool_uses_final_byte() {
        let on = Calldata::new(Some(&format!("0xa22cb465{SPENDER}{}02", "0".repeat(62))));
        assert_eq!(on.bool_arg(1), Some(true));
        let off = Calldata::new(Some(&format!("0xa22cb465{SPENDER}{}", "0".repeat(64))));
        assert_eq!(off.bool_arg(1), Some(false));
    }

    #[test]
    fn test_word_hex_is_full_width() {
        let rendered = word_hex(&[0xab; 32]);
        assert_eq!(rendered.len(), 66);
        assert!(rendered.starts_with("0xabab"));
    }
}
