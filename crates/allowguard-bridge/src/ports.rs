//! Collaborators of the bridge: the two message channels and the warning UI.

use async_trait::async_trait;

use allowguard_core::message::{BackgroundReply, BridgeToBackground, BridgeToPage};
use allowguard_core::{RequestId, RequestKind, RiskVerdict, TransportError};

/// The extension messaging channel to the background context
/// (`chrome.runtime.sendMessage`).
#[async_trait]
pub trait BackgroundTransport: Send + Sync {
    /// Send a message and wait for the background's reply.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the background is unreachable or the
    /// channel closes before replying.
    async fn send(&self, message: BridgeToBackground) -> Result<BackgroundReply, TransportError>;
}

/// The same-origin channel back to the page (`window.postMessage`).
pub trait PagePort: Send + Sync {
    /// Post a message to the page.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the page is gone.
    fn post(&self, message: BridgeToPage) -> Result<(), TransportError>;
}

/// What the warning view shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    /// Ledger id of the request.
    pub tx_id: RequestId,
    /// Selects the transaction or signature layout.
    pub kind: RequestKind,
    /// The background's analysis.
    pub analysis: RiskVerdict,
}

/// The user's first-level choice on the warning view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    /// "Block" button.
    Block,
    /// "Proceed" button; still needs a [`Confirmation`].
    Proceed,
}

/// Secondary confirmation required before a risky request may proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// A yes/no dialog (transactions).
    Dialog {
        /// Dialog text.
        message: String,
    },
    /// The user must type `phrase` verbatim (signatures).
    TypedPhrase {
        /// Prompt text.
        message: String,
        /// The exact phrase to type.
        phrase: String,
    },
}

/// The user's answer to a [`Confirmation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmResponse {
    /// Dialog accepted.
    Accepted,
    /// Dialog or prompt cancelled.
    Declined,
    /// Text typed into a phrase prompt.
    Typed(String),
}

impl Confirmation {
    /// Confirmation for a risky transaction.
    #[must_use]
    pub fn for_transaction() -> Self {
        Self::Dialog {
            message: "Are you absolutely sure? This could drain your wallet!".to_owned(),
        }
    }

    /// Confirmation for a risky signature, requiring `phrase`.
    #[must_use]
    pub fn for_signature(phrase: impl Into<String>) -> Self {
        let phrase = phrase.into();
        Self::TypedPhrase {
            message: format!(
                "You are about to sign a message that could give permanent access to your \
                 tokens and NFTs. Type '{phrase}' to continue:"
            ),
            phrase,
        }
    }

    /// Whether `response` satisfies this confirmation.
    ///
    /// A typed phrase must match exactly, including case.
    #[must_use]
    pub fn is_satisfied_by(&self, response: &ConfirmResponse) -> bool {
        match (self, response) {
            (Self::Dialog { .. }, ConfirmResponse::Accepted) => true,
            (Self::TypedPhrase { phrase, .. }, ConfirmResponse::Typed(typed)) => typed == phrase,
            _ => false,
        }
    }
}

/// The blocking warning UI.
#[async_trait]
pub trait DecisionPrompt: Send + Sync {
    /// Render the warning and wait for Block or Proceed.
    async fn present(&self, warning: &Warning) -> PromptChoice;

    /// Ask for the secondary confirmation.
    async fn confirm(&self, confirmation: &Confirmation) -> ConfirmResponse;

    /// Remove the warning for `tx_id`, if it is still shown.
    fn dismiss(&self, tx_id: &RequestId);
}
