//! The two classification entry points.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use allowguard_core::{
    RawCallPayload, RiskCategory, RiskVerdict, SignMethod, SignatureDetails, TransactionParams,
};

use crate::address::{BlacklistSet, KnownContracts, format_address, parse_address};
use crate::builder::VerdictBuilder;
use crate::calldata::{ApprovalSelector, Calldata, is_unlimited, word_hex};
use crate::typed_data::{
    self, field_text, find_keyword, find_sensitive_type, is_truthy, looks_unlimited,
    type_category,
};

const REASON_BLACKLISTED_CONTRACT: &str = "Interaction with blacklisted contract";
const REASON_UNLIMITED_APPROVAL: &str = "Grants unlimited approval to spender";
const REASON_APPROVAL_FOR_ALL: &str =
    "Grants unlimited approval over all assets in the collection to operator";
const REASON_ETH_SIGN: &str = "eth_sign can sign arbitrary data, including transactions";
const REASON_SEAPORT_CONTRACT: &str = "Seaport order signature: could list your NFTs for sale";
const REASON_PERMIT2_CONTRACT: &str = "Permit2 signature: grants token spending approval";
const REASON_SPENDER: &str = "Permit signature with spender: grants token spending approval";
const REASON_OPERATOR: &str = "Operator approval signature";
const REASON_UNLIMITED_VALUE: &str = "Unlimited token approval signature";
const REASON_UNLIMITED_PERMIT2: &str = "Unlimited Permit2 approval";
const REASON_MARKETPLACE_ORDER: &str = "Seaport order: could transfer your NFTs or tokens";

/// Pure, synchronous payload classifier.
///
/// Holds only read-only tables, so one instance can be shared by every
/// context through an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct PayloadClassifier {
    blacklist: Arc<BlacklistSet>,
    contracts: Arc<KnownContracts>,
}

impl PayloadClassifier {
    /// Create a classifier over the given tables.
    #[must_use]
    pub fn new(blacklist: Arc<BlacklistSet>, contracts: Arc<KnownContracts>) -> Self {
        Self {
            blacklist,
            contracts,
        }
    }

    /// The blacklist in use.
    #[must_use]
    pub fn blacklist(&self) -> &BlacklistSet {
        &self.blacklist
    }

    /// Classify any captured payload.
    #[must_use]
    pub fn classify(&self, payload: &RawCallPayload) -> RiskVerdict {
        match payload {
            RawCallPayload::Transaction(tx) => self.classify_transaction(tx),
            RawCallPayload::Signature { method, params } => self.classify_signature(*method, params),
        }
    }

    /// Classify an `eth_sendTransaction` object.
    ///
    /// A transaction without a recipient yields a safe, empty verdict.
    #[must_use]
    pub fn classify_transaction(&self, tx: &TransactionParams) -> RiskVerdict {
        let Some(to) = tx.to.as_deref() else {
            return RiskVerdict::safe();
        };

        let mut b = VerdictBuilder::new();
        b.contract(to.trim().to_ascii_lowercase());

        if self.blacklist.contains(to) {
            b.flag(REASON_BLACKLISTED_CONTRACT);
            b.blacklisted();
        }

        let data = Calldata::new(tx.data.as_deref());
        if let Some(selector) = data.approval_selector() {
            b.suggest_category(selector.category());
            b.method_name(selector.method_name());
            self.inspect_approval(&mut b, selector, &data);
        }

        let verdict = b.build();
        debug!(
            to = %to,
            risky = verdict.is_risky,
            category = %verdict.category,
            "classified transaction"
        );
        verdict
    }

    fn inspect_approval(&self, b: &mut VerdictBuilder, selector: ApprovalSelector, data: &Calldata) {
        let (role, counterparty) = match selector {
            ApprovalSelector::Approve | ApprovalSelector::IncreaseAllowance => {
                ("Spender", data.address_arg(0))
            },
            ApprovalSelector::SetApprovalForAll => ("Operator", data.address_arg(0)),
        };

        if let Some(address) = counterparty {
            b.spender(format_address(&address));
            if self.blacklist.contains_address(&address) {
                b.flag(format!("{role} is a blacklisted address"));
                b.blacklisted();
            }
        }

        match selector {
            ApprovalSelector::Approve | ApprovalSelector::IncreaseAllowance => {
                if let Some(word) = data.word(1) {
                    b.amount(word_hex(&word));
                }
                if data.uint_arg(1).is_some_and(is_unlimited) {
                    b.unlimited();
                    b.flag(REASON_UNLIMITED_APPROVAL);
                }
            },
            ApprovalSelector::SetApprovalForAll => {
                if data.bool_arg(1) == Some(true) {
                    b.unlimited();
                    b.flag(REASON_APPROVAL_FOR_ALL);
                }
            },
        }
    }

    /// Classify a signing call.
    ///
    /// `eth_sign` is always risky. Typed data that cannot be located or
    /// parsed yields a safe, empty verdict.
    #[must_use]
    pub fn classify_signature(&self, method: SignMethod, params: &Value) -> RiskVerdict {
        let verdict = match method {
            SignMethod::EthSign => {
                let mut b = VerdictBuilder::new();
                b.flag(REASON_ETH_SIGN);
                b.force_category(RiskCategory::EthSign);
                b.method_name(method.as_str());
                b.build()
            },
            SignMethod::SignTypedData | SignMethod::SignTypedDataV3 | SignMethod::SignTypedDataV4 => {
                match typed_data::extract(params) {
                    Some(data) => self.classify_typed_data(method, &data),
                    None => RiskVerdict::safe(),
                }
            },
        };
        debug!(
            method = %method,
            risky = verdict.is_risky,
            category = %verdict.category,
            "classified signature"
        );
        verdict
    }

    /// Classify a signing call by JSON-RPC method name.
    ///
    /// Methods the guard does not inspect are safe.
    #[must_use]
    pub fn classify_signature_method(&self, method: &str, params: &Value) -> RiskVerdict {
        SignMethod::from_method(method)
            .map_or_else(RiskVerdict::safe, |m| self.classify_signature(m, params))
    }

    fn classify_typed_data(&self, method: SignMethod, data: &Map<String, Value>) -> RiskVerdict {
        let mut b = VerdictBuilder::new();
        b.method_name(method.as_str());
        let mut details = SignatureDetails::default();

        if let Some(domain) = data.get("domain").and_then(Value::as_object) {
            self.inspect_domain(&mut b, &mut details, domain);
        }

        let primary = data.get("primaryType").and_then(Value::as_str);
        details.primary_type = primary.map(str::to_owned);
        let type_hits = [
            primary.and_then(find_sensitive_type),
            data.get("types")
                .filter(|t| !t.is_null())
                .and_then(|t| find_sensitive_type(&t.to_string())),
        ];
        for name in type_hits.into_iter().flatten() {
            b.flag(format!("{name} signature detected: may grant token or NFT approval"));
            b.suggest_category(type_category(name));
            details.scheme.get_or_insert_with(|| name.to_owned());
        }

        if let Some(message) = data.get("message").and_then(Value::as_object) {
            self.inspect_message(&mut b, &mut details, message);
        }

        // Low-confidence catch-all, only when nothing structured fired.
        if !b.is_risky() {
            let text = Value::Object(data.clone()).to_string().to_ascii_lowercase();
            if let Some(keyword) = find_keyword(&text) {
                b.flag(format!(
                    "Suspicious signature containing \"{keyword}\": verify carefully"
                ));
                b.suggest_category(RiskCategory::GenericSuspicious);
            }
        }

        b.signature(details);
        b.build()
    }

    fn inspect_domain(
        &self,
        b: &mut VerdictBuilder,
        details: &mut SignatureDetails,
        domain: &Map<String, Value>,
    ) {
        details.domain_name = domain.get("name").and_then(Value::as_str).map(str::to_owned);
        details.chain_id = domain
            .get("chainId")
            .filter(|v| !v.is_null())
            .map(field_text);

        let Some(contract) = domain
            .get("verifyingContract")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
        else {
            return;
        };
        details.verifying_contract = Some(contract.clone());
        b.contract(contract.clone());

        if self.contracts.is_marketplace(&contract) {
            b.flag(REASON_SEAPORT_CONTRACT);
            b.suggest_category(RiskCategory::SeaportOrder);
            details.scheme = Some("Seaport".to_owned());
        }
        if self.contracts.is_permit(&contract) {
            b.flag(REASON_PERMIT2_CONTRACT);
            b.suggest_category(RiskCategory::PermitSignature);
            details.scheme = Some("Permit2".to_owned());
        }
        if self.blacklist.contains(&contract) {
            b.flag(REASON_BLACKLISTED_CONTRACT);
            b.blacklisted();
        }
    }

    fn inspect_message(
        &self,
        b: &mut VerdictBuilder,
        details: &mut SignatureDetails,
        message: &Map<String, Value>,
    ) {
        let present = |key: &str| message.get(key).filter(|v| is_truthy(v));

        if let Some(spender) = present("spender") {
            b.flag(REASON_SPENDER);
            b.suggest_category(RiskCategory::PermitSignature);
            self.inspect_counterparty(b, "Spender", spender);
        }
        if let Some(operator) = present("operator") {
            b.flag(REASON_OPERATOR);
            b.suggest_category(RiskCategory::Erc721SetApprovalForAll);
            self.inspect_counterparty(b, "Operator", operator);
        }

        if let Some(value) = present("value")
            && looks_unlimited(value)
        {
            b.flag(REASON_UNLIMITED_VALUE);
            b.suggest_category(RiskCategory::PermitSignature);
            b.unlimited();
            b.amount(field_text(value));
        }
        if let Some(amount) = present("details")
            .and_then(|d| d.get("amount"))
            .filter(|v| is_truthy(v))
            && looks_unlimited(amount)
        {
            b.flag(REASON_UNLIMITED_PERMIT2);
            b.suggest_category(RiskCategory::PermitSignature);
            b.unlimited();
            b.amount(field_text(amount));
        }

        if present("offer").is_some() || present("consideration").is_some() {
            b.flag(REASON_MARKETPLACE_ORDER);
            b.force_category(RiskCategory::SeaportOrder);
            details.scheme.get_or_insert_with(|| "Seaport".to_owned());
        }
    }

    fn inspect_counterparty(&self, b: &mut VerdictBuilder, role: &str, value: &Value) {
        let Some(raw) = value.as_str() else {
            return;
        };
        match parse_address(raw) {
            Some(address) => {
                b.spender(format_address(&address));
                if self.blacklist.contains_address(&address) {
                    b.flag(format!("{role} is a blacklisted address"));
                    b.blacklisted();
                }
            },
            None => b.spender(raw.to_owned()),
        }
    }
}
