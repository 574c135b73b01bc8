//! Allowguard Interceptor - Page-context guard around the wallet provider.
//!
//! The interceptor decorates an EIP-1193 [`Provider`] with a
//! [`GuardedProvider`] that classifies every `eth_sendTransaction` and
//! signing call before it reaches the wallet. Risky calls are suspended on a
//! [`DecisionGate`] until the user decides; everything else passes straight
//! through.
//!
//! # Architecture
//!
//! ```text
//! dapp ──request()──▶ GuardedProvider ──▶ real provider
//!                          │ risky
//!                          ▼
//!                   PageDecisionGate ──TX_REQUEST / SIGNATURE_REQUEST──▶ bridge
//!                          ▲
//!                          └──────────────── TX_RESPONSE ◀────────────── bridge
//! ```
//!
//! Adapters are cached by [`ProviderInterceptor`], so wrapping is idempotent,
//! and [`ProviderSlot`] models the global `window.ethereum` slot with its
//! setter and retrying installer.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod adapter;
mod gate;
mod guarded;
mod options;
mod provider;
mod slot;

pub use adapter::ProviderInterceptor;
pub use gate::{DecisionGate, GateRequest, PageDecisionGate, PageOutbox};
pub use guarded::{GuardedProvider, screened_kind};
pub use options::InterceptorOptions;
pub use provider::{Provider, ResponseCallback};
pub use slot::ProviderSlot;
