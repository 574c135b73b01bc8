//! Captured request payloads.
//!
//! Everything here is copied out of the page verbatim and is untrusted: the
//! fields stay as the strings the dapp supplied, and only the classifier
//! interprets them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::verdict::RiskVerdict;

/// Method name of the transaction-send call.
pub const SEND_TRANSACTION: &str = "eth_sendTransaction";

/// Arguments of an EIP-1193 `request()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
    /// JSON-RPC method name.
    pub method: String,
    /// Positional parameters, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RequestArguments {
    /// Create request arguments.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// The transaction object of an `eth_sendTransaction` call.
    ///
    /// Returns `None` only for other methods. A send whose `params[0]` is
    /// missing or malformed still yields a (possibly empty) transaction, so
    /// the call is always classified.
    #[must_use]
    pub fn transaction(&self) -> Option<TransactionParams> {
        if self.method != SEND_TRANSACTION {
            return None;
        }
        let first = self
            .params
            .as_ref()
            .and_then(Value::as_array)
            .and_then(|params| params.first())
            .filter(|first| first.is_object());
        Some(
            first
                .and_then(|first| serde_json::from_value(first.clone()).ok())
                .unwrap_or_default(),
        )
    }

    /// The signature method, if this is one of the guarded signing calls
    /// and it carries parameters.
    #[must_use]
    pub fn sign_method(&self) -> Option<SignMethod> {
        let method = SignMethod::from_method(&self.method)?;
        self.params.as_ref()?;
        Some(method)
    }
}

/// The transaction object passed to `eth_sendTransaction`.
///
/// Dapps send quantities as hex strings or as plain JSON numbers; both are
/// accepted. Numbers are kept as hex quantities, and values of any other
/// shape read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParams {
    /// Recipient (the contract being called).
    #[serde(
        default,
        deserialize_with = "lenient_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub to: Option<String>,
    /// Sender.
    #[serde(
        default,
        deserialize_with = "lenient_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub from: Option<String>,
    /// Hex-encoded call data.
    #[serde(
        default,
        deserialize_with = "lenient_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<String>,
    /// Native value, hex quantity.
    #[serde(
        default,
        deserialize_with = "lenient_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
    /// Gas limit, hex quantity.
    #[serde(
        default,
        deserialize_with = "lenient_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas: Option<String>,
    /// Legacy gas price, hex quantity.
    #[serde(
        default,
        deserialize_with = "lenient_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_price: Option<String>,
}

impl TransactionParams {
    /// A transaction to `to` with no call data.
    #[must_use]
    pub fn to(to: impl Into<String>) -> Self {
        Self {
            to: Some(to.into()),
            ..Self::default()
        }
    }

    /// Set the call data.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the sender.
    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Set the native value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Read a transaction field without ever failing the whole object.
fn lenient_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(match n.as_u64() {
            Some(n) => format!("{n:#x}"),
            None => n.to_string(),
        }),
        _ => None,
    })
}

/// The signing methods the guard inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignMethod {
    /// `eth_sign`: signs an arbitrary 32-byte hash.
    #[serde(rename = "eth_sign")]
    EthSign,
    /// `eth_signTypedData` (v1).
    #[serde(rename = "eth_signTypedData")]
    SignTypedData,
    /// `eth_signTypedData_v3`.
    #[serde(rename = "eth_signTypedData_v3")]
    SignTypedDataV3,
    /// `eth_signTypedData_v4`.
    #[serde(rename = "eth_signTypedData_v4")]
    SignTypedDataV4,
}

impl SignMethod {
    /// All guarded signing methods.
    pub const ALL: [Self; 4] = [
        Self::SignTypedDataV4,
        Self::SignTypedDataV3,
        Self::SignTypedData,
        Self::EthSign,
    ];

    /// Look up a JSON-RPC method name.
    #[must_use]
    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == method)
    }

    /// The JSON-RPC method name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EthSign => "eth_sign",
            Self::SignTypedData => "eth_signTypedData",
            Self::SignTypedDataV3 => "eth_signTypedData_v3",
            Self::SignTypedDataV4 => "eth_signTypedData_v4",
        }
    }

    /// Whether the payload is EIP-712 typed data.
    #[must_use]
    pub fn is_typed_data(self) -> bool {
        !matches!(self, Self::EthSign)
    }
}

impl fmt::Display for SignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A risky signature request as posted from the page to the bridge.
///
/// The page's own verdict travels with it so the bridge can render the
/// warning without waiting for the background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureRequest {
    /// The signing method.
    pub method: SignMethod,
    /// Raw parameters exactly as the dapp passed them.
    pub params: Value,
    /// Page-side classification.
    pub verdict: RiskVerdict,
}

/// A captured request, as stored by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawCallPayload {
    /// `eth_sendTransaction`.
    Transaction(TransactionParams),
    /// One of the guarded signing methods.
    Signature {
        /// The signing method.
        method: SignMethod,
        /// Raw parameters.
        params: Value,
    },
}

impl RawCallPayload {
    /// The method name this payload was captured from.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Transaction(_) => SEND_TRANSACTION,
            Self::Signature { method, .. } => method.as_str(),
        }
    }
}
