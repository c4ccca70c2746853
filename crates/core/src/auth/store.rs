//! In-memory credential cache keyed by principal

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use adpulse_common::Clock;
use adpulse_domain::{CredentialSet, PrincipalId, SlotCredential, TokenSlot};
use dashmap::DashMap;

/// Most recently minted access tokens per principal.
///
/// Only the refresh coordinator writes here in production; everything else
/// reads snapshots through [`CredentialStore::get`].
pub struct CredentialStore {
    entries: DashMap<PrincipalId, CredentialSet>,
    clock: Arc<dyn Clock>,
}

impl CredentialStore {
    /// Empty store aging entries against `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { entries: DashMap::new(), clock }
    }

    /// Snapshot of the cached credentials, if any slot was ever refreshed.
    pub fn get(&self, principal: &PrincipalId) -> Option<CredentialSet> {
        self.entries.get(principal).map(|entry| entry.value().clone())
    }

    /// Cached credential for one slot of a principal.
    pub fn slot(&self, principal: &PrincipalId, slot: TokenSlot) -> Option<SlotCredential> {
        self.entries.get(principal).and_then(|entry| entry.slot(slot).cloned())
    }

    /// Record a freshly minted access token for one slot, returning the
    /// principal's updated credential set.
    pub fn set(
        &self,
        principal: &PrincipalId,
        slot: TokenSlot,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        issued_at: SystemTime,
    ) -> CredentialSet {
        let mut entry = self
            .entries
            .entry(principal.clone())
            .or_insert_with(|| CredentialSet::new(principal.clone()));
        entry.slots.insert(
            slot,
            SlotCredential {
                access_token: access_token.into(),
                refresh_token: refresh_token.into(),
                issued_at,
            },
        );
        entry.value().clone()
    }

    /// True when the slot has never been refreshed or its token is older than
    /// `threshold`. Exactly `threshold` old is still fresh.
    pub fn is_near_expiry(
        &self,
        principal: &PrincipalId,
        slot: TokenSlot,
        threshold: Duration,
    ) -> bool {
        match self.slot(principal, slot) {
            Some(credential) => self.clock.elapsed_since(credential.issued_at) > threshold,
            None => true,
        }
    }

    /// Fresh and minted from `refresh_token`. A cached token minted from a
    /// different refresh token belongs to a previous grant and must not be
    /// handed out.
    pub fn is_fresh_for(
        &self,
        principal: &PrincipalId,
        slot: TokenSlot,
        refresh_token: &str,
        threshold: Duration,
    ) -> bool {
        match self.slot(principal, slot) {
            Some(credential) => {
                credential.refresh_token == refresh_token
                    && self.clock.elapsed_since(credential.issued_at) <= threshold
            }
            None => false,
        }
    }

    /// Drop everything cached for a principal.
    pub fn evict(&self, principal: &PrincipalId) -> Option<CredentialSet> {
        self.entries.remove(principal).map(|(_, set)| set)
    }

    /// Number of principals with cached credentials.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clock used for expiry checks.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
