//! Address parsing and the two address tables the classifier consults.

use alloy_primitives::Address;
use std::collections::HashSet;

/// Seaport 1.5.
pub const SEAPORT_1_5: &str = "0x00000000000000adc04c56bf30ac9d3c0aaf14dc";
/// Seaport 1.6.
pub const SEAPORT_1_6: &str = "0x00000000000001ad428e4906ae43d8f9852d0dd6";
/// Seaport 1.4.
pub const SEAPORT_1_4: &str = "0x0000000000000068f116a894984e2db1123eb395";
/// Permit2, deployed at the same address on every chain.
pub const PERMIT2: &str = "0x000000000022d473030f116ddee9f6b43ac78ba3";

/// Sample blacklist shipped with the default configuration.
pub const SAMPLE_BLACKLIST: [&str; 3] = [
    "0x0000000000000000000000000000000000000001",
    "0xdead000000000000000000000000000000000000",
    "0xbad0000000000000000000000000000000000000",
];

/// Parse a 20-byte hex address, with or without `0x`, in any letter case.
///
/// Returns `None` for anything that is not exactly 40 hex digits. Checksums
/// are not verified: the page hands over whatever casing the dapp used.
#[must_use]
pub fn parse_address(s: &str) -> Option<Address> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.len() != 40 {
        return None;
    }
    let bytes = hex::decode(digits).ok()?;
    Some(Address::from_slice(&bytes))
}

/// Render an address as `0x`-prefixed lowercase hex.
#[must_use]
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

fn collect<I, S>(addresses: I) -> Result<HashSet<Address>, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    addresses
        .into_iter()
        .map(|s| parse_address(s.as_ref()).ok_or_else(|| s.as_ref().to_owned()))
        .collect()
}

/// Addresses known to be malicious.
///
/// Built once at startup and only read afterwards, so it can be shared by
/// `Arc` without locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlacklistSet {
    addresses: HashSet<Address>,
}

impl BlacklistSet {
    /// Build a set from already-parsed addresses.
    #[must_use]
    pub fn new(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self {
            addresses: addresses.into_iter().collect(),
        }
    }

    /// Parse a list of hex addresses.
    ///
    /// # Errors
    ///
    /// Returns the first entry that is not a valid address.
    pub fn from_hex<I, S>(addresses: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        collect(addresses).map(|addresses| Self { addresses })
    }

    /// The sample set from the default configuration.
    #[must_use]
    pub fn sample() -> Self {
        Self::new(SAMPLE_BLACKLIST.iter().filter_map(|s| parse_address(s)))
    }

    /// Whether `address` (any casing) is blacklisted.
    ///
    /// Unparseable input is never blacklisted.
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        parse_address(address).is_some_and(|a| self.addresses.contains(&a))
    }

    /// Whether a parsed address is blacklisted.
    #[must_use]
    pub fn contains_address(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Verifying contracts whose typed-data signatures always need a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownContracts {
    marketplaces: HashSet<Address>,
    permits: HashSet<Address>,
}

impl KnownContracts {
    /// Build the tables from hex address lists.
    ///
    /// # Errors
    ///
    /// Returns the first entry that is not a valid address.
    pub fn from_hex<M, P, S>(marketplaces: M, permits: P) -> Result<Self, String>
    where
        M: IntoIterator<Item = S>,
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            marketplaces: collect(marketplaces)?,
            permits: collect(permits)?,
        })
    }

    /// Tables with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            marketplaces: HashSet::new(),
            permits: HashSet::new(),
        }
    }

    /// Whether `address` is a marketplace (Seaport) contract.
    #[must_use]
    pub fn is_marketplace(&self, address: &str) -> bool {
        parse_address(address).is_some_and(|a| self.marketplaces.contains(&a))
    }

    /// Whether `address` is a universal permit (Permit2) contract.
    #[must_use]
    pub fn is_permit(&self, address: &str) -> bool {
        parse_address(address).is_some_and(|a| self.permits.contains(&a))
    }
}

impl Default for KnownContracts {
    /// Seaport 1.4 through 1.6 and Permit2.
    fn default() -> Self {
        let parse = |list: &[&str]| -> HashSet<Address> {
            list.iter().filter_map(|s| parse_address(s)).collect()
        };
        Self {
            marketplaces: parse(&[SEAPORT_1_5, SEAPORT_1_6, SEAPORT_1_4]),
            permits: parse(&[PERMIT2]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_accepts_any_case() {
        let lower = parse_address("0xdead000000000000000000000000000000000000").unwrap();
        let upper = parse_address("0XDEAD000000000000000000000000000000000000").unwrap();
        let bare = parse_address("DEAD000000000000000000000000000000000000").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower, bare);
        assert_eq!(format_address(&upper), "0xdead000000000000000000000000000000000000");
    }

    #[test]
    fn test_parse_address_rejects_malformed() {
        assert!(parse_address("").is_none());
        assert!(parse_address("0x1234").is_none());
        assert!(parse_address("0xzz00000000000000000000000000000000000000").is_none());
        assert!(parse_address("0xdead0000000000000000000000000000000000000000").is_none());
    }

    #[test]
    fn test_blacklist_is_case_insensitive() {
        let set = BlacklistSet::sample();
        assert_eq!(set.len(), 3);
        assert!(set.contains("0xDEAD000000000000000000000000000000000000"));
        assert!(set.contains("0xBad0000000000000000000000000000000000000"));
        assert!(!set.contains("0x1111111111111111111111111111111111111111"));
        assert!(!set.contains("not an address"));
    }

    #[test]
    fn test_blacklist_from_hex_reports_bad_entry() {
        let err = BlacklistSet::from_hex(["0xdead000000000000000000000000000000000000", "0x12"])
            .unwrap_err();
        assert_eq!(err, "0x12");
    }

    #[test]
    fn test_default_known_contracts() {
        let known = KnownContracts::default();
        assert!(known.is_marketplace(SEAPORT_1_4));
        assert!(known.is_marketplace("0x00000000000000ADc04C56Bf30aC9d3c0aAF14dC"));
        assert!(known.is_permit(PERMIT2));
        assert!(!known.is_permit(SEAPORT_1_5));
        assert!(!KnownContracts::empty().is_marketplace(SEAPORT_1_5));
    }
}
