//! The well-known global provider slot (`window.ethereum`).
//!
//! Wallets inject their provider at unpredictable times: before the guard
//! loads, shortly after, or by reassigning the slot later. The slot handles
//! all three:
//!
//! - [`ProviderSlot::install`] wraps whatever is present now.
//! - Once installed, [`ProviderSlot::set`] acts as the property setter and
//!   wraps every later assignment.
//! - [`ProviderSlot::install_with_retries`] repeats installation on a delay
//!   schedule to catch providers that appear asynchronously.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::adapter::ProviderInterceptor;
use crate::provider::Provider;

/// Holder of the page's provider and multi-provider list.
pub struct ProviderSlot {
    interceptor: Arc<ProviderInterceptor>,
    installed: AtomicBool,
    current: RwLock<Option<Arc<dyn Provider>>>,
    providers: RwLock<Vec<Arc<dyn Provider>>>,
}

impl ProviderSlot {
    /// Create an empty, uninstalled slot.
    #[must_use]
    pub fn new(interceptor: Arc<ProviderInterceptor>) -> Self {
        Self {
            interceptor,
            installed: AtomicBool::new(false),
            current: RwLock::new(None),
            providers: RwLock::new(Vec::new()),
        }
    }

    /// Read the slot.
    #[must_use]
    pub fn get(&self) -> Option<Arc<dyn Provider>> {
        read(&self.current).clone()
    }

    /// Assign the slot. After installation the value is wrapped first.
    pub fn set(&self, provider: Arc<dyn Provider>) {
        let stored = if self.is_installed() {
            debug!("provider assigned after installation, wrapping");
            self.interceptor.wrap(provider)
        } else {
            provider
        };
        *write(&self.current) = Some(stored);
    }

    /// Clear the slot.
    pub fn clear(&self) {
        *write(&self.current) = None;
    }

    /// The multi-provider list (`window.ethereum.providers`).
    #[must_use]
    pub fn providers(&self) -> Vec<Arc<dyn Provider>> {
        read(&self.providers).clone()
    }

    /// Replace the multi-provider list. After installation every element is
    /// wrapped individually.
    pub fn set_providers(&self, providers: Vec<Arc<dyn Provider>>) {
        let stored = if self.is_installed() {
            self.wrap_all(providers)
        } else {
            providers
        };
        *write(&self.providers) = stored;
    }

    /// Whether the setter is active.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// Activate the setter and wrap the providers present now.
    ///
    /// Idempotent. Returns `true` if a provider was present.
    pub fn install(&self) -> bool {
        self.installed.store(true, Ordering::Release);

        let found = {
            let mut current = write(&self.current);
            match current.take() {
                Some(provider) => {
                    *current = Some(self.interceptor.wrap(provider));
                    true
                },
                None => false,
            }
        };

        let mut providers = write(&self.providers);
        if !providers.is_empty() {
            let list = std::mem::take(&mut *providers);
            *providers = self.wrap_all(list);
        }

        found || !providers.is_empty()
    }

    /// Run [`install`](Self::install) once per entry of `delays`, sleeping
    /// for the entry first.
    ///
    /// Returns the number of attempts that found a provider.
    pub async fn install_with_retries(&self, delays: &[Duration]) -> usize {
        let mut found: usize = 0;
        for (attempt, delay) in delays.iter().enumerate() {
            if !delay.is_zero() {
                tokio::time::sleep(*delay).await;
            }
            if self.install() {
                if found == 0 {
                    info!(attempt, "provider interceptor installed");
                }
                found = found.saturating_add(1);
            } else {
                debug!(attempt, "no provider yet");
            }
        }
        if found == 0 {
            debug!(attempts = delays.len(), "no provider found; setter remains active");
        }
        found
    }

    fn wrap_all(&self, providers: Vec<Arc<dyn Provider>>) -> Vec<Arc<dyn Provider>> {
        providers
            .into_iter()
            .map(|p| self.interceptor.wrap(p))
            .collect()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| {
        warn!("provider slot lock poisoned, recovering");
        e.into_inner()
    })
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| {
        warn!("provider slot lock poisoned, recovering");
        e.into_inner()
    })
}
