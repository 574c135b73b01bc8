use allowguard_core::{RiskCategory, RiskVerdict, SignatureDetails};

/// Accumulates findings and freezes them into a [`RiskVerdict`].
#[derive(Debug, Default)]
pub(crate) struct VerdictBuilder {
    verdict: RiskVerdict,
}

impl VerdictBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a finding. Marks the verdict risky; identical reasons are kept once.
    pub(crate) fn flag(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.verdict.is_risky = true;
        if !self.verdict.risk_reasons.contains(&reason) {
            self.verdict.risk_reasons.push(reason);
        }
    }

    /// Set the category unless an earlier finding already set one.
    pub(crate) fn suggest_category(&mut self, category: RiskCategory) {
        if self.verdict.category == RiskCategory::None {
            self.verdict.category = category;
        }
    }

    /// Set the category unconditionally.
    pub(crate) fn force_category(&mut self, category: RiskCategory) {
        self.verdict.category = category;
    }

    pub(crate) fn contract(&mut self, address: String) {
        self.verdict.contract_address = Some(address);
    }

    /// First spender/operator wins.
    pub(crate) fn spender(&mut self, address: String) {
        self.verdict.spender_or_operator.get_or_insert(address);
    }

    pub(crate) fn amount(&mut self, amount: String) {
        self.verdict.amount.get_or_insert(amount);
    }

    pub(crate) fn unlimited(&mut self) {
        self.verdict.is_unlimited_amount = true;
    }

    pub(crate) fn blacklisted(&mut self) {
        self.verdict.is_blacklisted = true;
    }

    pub(crate) fn method_name(&mut self, name: impl Into<String>) {
        self.verdict.method_name = Some(name.into());
    }

    pub(crate) fn signature(&mut self, details: SignatureDetails) {
        self.verdict.signature = Some(details);
    }

    pub(crate) fn is_risky(&self) -> bool {
        self.verdict.is_risky
    }

    pub(crate) fn build(self) -> RiskVerdict {
        self.verdict
    }
}
