use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use adpulse_core::TokenRefresher;
use adpulse_domain::{PrincipalId, RefreshedToken, RemoteFailure, TokenSlot};

/// Token refresher that counts exchanges and mints `"{slot}-access-{n}"`.
///
/// Failures can be queued per slot (consumed one per call) or made permanent.
#[derive(Default)]
pub struct CountingRefresher {
    calls: AtomicUsize,
    delay: Duration,
    queued_failures: Mutex<HashMap<TokenSlot, VecDeque<RemoteFailure>>>,
    permanent_failures: Mutex<HashMap<TokenSlot, RemoteFailure>>,
    seen: Mutex<Vec<(TokenSlot, String)>>,
}

impl CountingRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every exchange open for `delay` so concurrent callers pile up.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_next(&self, slot: TokenSlot, failure: RemoteFailure) {
        self.queued_failures.lock().unwrap().entry(slot).or_default().push_back(failure);
    }

    pub fn fail_always(&self, slot: TokenSlot, failure: RemoteFailure) {
        self.permanent_failures.lock().unwrap().insert(slot, failure);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Refresh tokens presented so far, in call order.
    pub fn seen(&self) -> Vec<(TokenSlot, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRefresher for CountingRefresher {
    async fn refresh(
        &self,
        _principal: &PrincipalId,
        slot: TokenSlot,
        refresh_token: &str,
    ) -> Result<RefreshedToken, RemoteFailure> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push((slot, refresh_token.to_string()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(failure) = self.permanent_failures.lock().unwrap().get(&slot).cloned() {
            return Err(failure);
        }
        let queued = self.queued_failures.lock().unwrap().get_mut(&slot).and_then(VecDeque::pop_front);
        if let Some(failure) = queued {
            return Err(failure);
        }

        Ok(RefreshedToken {
            access_token: format!("{slot}-access-{n}"),
            refresh_token: None,
            expires_in_secs: Some(3600),
        })
    }
}
