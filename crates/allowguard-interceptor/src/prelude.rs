//! Prelude module - commonly used types for convenient import.
//!
//! Use `use allowguard_interceptor::prelude::*;` to import all essential types.

pub use crate::{DecisionGate, GateRequest, PageDecisionGate, PageOutbox};

pub use crate::{GuardedProvider, Provider, ProviderInterceptor, ResponseCallback};

pub use crate::{InterceptorOptions, ProviderSlot};
