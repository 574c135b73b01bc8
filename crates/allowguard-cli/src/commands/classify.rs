//! `classify` subcommands.

use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::Value;

use allowguard_classifier::PayloadClassifier;
use allowguard_core::{RiskVerdict, SignMethod, TransactionParams};

use crate::theme::Theme;

/// Exit code for a risky verdict.
const EXIT_RISKY: u8 = 2;

/// Classify an `eth_sendTransaction` payload.
pub(crate) fn transaction(
    classifier: &PayloadClassifier,
    to: String,
    from: Option<String>,
    data: Option<String>,
    value: Option<String>,
) -> RiskVerdict {
    let tx = TransactionParams {
        from,
        data,
        value,
        ..TransactionParams::to(to)
    };
    classifier.classify_transaction(&tx)
}

/// Classify a signing call from its method and JSON params.
pub(crate) fn signature(
    classifier: &PayloadClassifier,
    method: &str,
    params: &str,
) -> Result<RiskVerdict> {
    let params: Value =
        serde_json::from_str(params).context("--params must be valid JSON")?;
    if SignMethod::from_method(method).is_none() {
        eprintln!(
            "{}",
            Theme::warning(&format!("{method} is not a screened signing method"))
        );
    }
    Ok(classifier.classify_signature_method(method, &params))
}

/// Print `verdict` and pick the exit code.
///
/// The verdict goes to stdout as JSON; the summary goes to stderr so the
/// JSON can be piped.
pub(crate) fn report(verdict: &RiskVerdict) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(verdict)?);

    if !verdict.is_risky {
        eprintln!("{}", Theme::success("No risky approval detected"));
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!(
        "{}",
        Theme::warning(&format!("Risky request: {}", verdict.category))
    );
    for reason in &verdict.risk_reasons {
        eprintln!("  - {reason}");
    }
    Ok(ExitCode::from(EXIT_RISKY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use allowguard_classifier::{BlacklistSet, KnownContracts};
    use allowguard_core::RiskCategory;
    use std::sync::Arc;

    fn classifier() -> PayloadClassifier {
        PayloadClassifier::new(
            Arc::new(BlacklistSet::sample()),
            Arc::new(KnownContracts::default()),
        )
    }

    #[test]
    fn test_transaction_flags_unlimited_approve() {
        let data = format!(
            "0x095ea7b3{:0>64}{}",
            "2222222222222222222222222222222222222222",
            "f".repeat(64)
        );
        let verdict = transaction(
            &classifier(),
            "0x1111111111111111111111111111111111111111".to_owned(),
            None,
            Some(data),
            None,
        );
        assert!(verdict.is_risky);
        assert_eq!(verdict.category, RiskCategory::Erc20Approve);
    }

    #[test]
    fn test_signature_rejects_bad_json() {
        assert!(signature(&classifier(), "eth_sign", "[not json").is_err());
    }

    #[test]
    fn test_eth_sign_is_risky() {
        let verdict = signature(&classifier(), "eth_sign", "[]").unwrap();
        assert_eq!(verdict.category, RiskCategory::EthSign);
    }

    #[test]
    fn test_unscreened_method_is_safe() {
        let verdict = signature(&classifier(), "personal_sign", r#"["0x00"]"#).unwrap();
        assert!(!verdict.is_risky);
    }
}
