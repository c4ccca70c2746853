//! Single-flight credential refresh
//!
//! At most one refresh per principal is in flight at any time. The first
//! caller that finds stale credentials registers a shared refresh future in
//! the in-flight table before its first suspension point; every concurrent
//! caller for the same principal awaits that same future. The future removes
//! its own table entry when it settles, whether it succeeded or failed, so
//! the next stale check starts a new one.
//!
//! A refresh reports an outcome per slot. A caller that joined a refresh
//! started by someone else only takes the outcomes of its own slots from it
//! and re-checks whatever that refresh did not cover.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use adpulse_domain::{CredentialSet, PrincipalId, RefreshTokens, RemoteFailure, TokenSlot};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use super::classifier::{classify, ClassifiedError, ErrorKind};
use super::store::CredentialStore;
use crate::ports::TokenRefresher;

type RefreshResult = Result<CredentialSet, ClassifiedError>;
type PlanOutcome = Arc<BTreeMap<TokenSlot, SlotAttempt>>;
type SharedRefresh = Shared<BoxFuture<'static, PlanOutcome>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshMode {
    /// Refresh only what is stale; a failed slot with a cached token keeps it.
    IfStale,
    /// The remote rejected the current tokens; every listed slot must be
    /// re-minted and failures are reported.
    Forced,
}

struct RefreshPlan {
    principal: PrincipalId,
    slots: Vec<(TokenSlot, String)>,
    mode: RefreshMode,
}

/// What one exchange did for one slot.
#[derive(Debug, Clone)]
struct SlotAttempt {
    refresh_token: String,
    result: SlotResult,
}

#[derive(Debug, Clone)]
enum SlotResult {
    Minted,
    /// Exchange failed; the previously cached token stays in place.
    KeptCached,
    Failed(ClassifiedError),
}

/// Keeps each principal's access tokens valid, coalescing concurrent
/// refreshes into one network exchange.
pub struct RefreshCoordinator {
    store: Arc<CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    threshold: Duration,
    in_flight: Arc<Mutex<HashMap<PrincipalId, SharedRefresh>>>,
}

impl RefreshCoordinator {
    /// Coordinator refreshing slots older than `threshold`.
    pub fn new(
        store: Arc<CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
        threshold: Duration,
    ) -> Self {
        Self { store, refresher, threshold, in_flight: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Cache the coordinator writes to.
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Age after which a cached access token is refreshed.
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Whether a refresh for `principal` is currently in flight.
    pub fn is_refreshing(&self, principal: &PrincipalId) -> bool {
        self.in_flight.lock().contains_key(principal)
    }

    /// Return credentials whose requested slots are all fresh, refreshing
    /// whatever is stale first.
    ///
    /// A slot is stale when it was never minted, is older than the refresh
    /// threshold, or was minted from a different refresh token than the one
    /// supplied now.
    #[instrument(skip(self, tokens), fields(principal = %principal))]
    pub async fn ensure_valid(
        &self,
        principal: &PrincipalId,
        tokens: &RefreshTokens,
    ) -> RefreshResult {
        require_tokens(principal, tokens)?;
        self.settle(principal, RefreshMode::IfStale, || self.stale_slots(principal, tokens)).await
    }

    /// Re-mint the tokens in `rejected` after the remote refused them.
    ///
    /// Slots whose cached token has already been replaced since `rejected`
    /// was handed out are not refreshed again; the newer token is returned
    /// instead. This keeps a burst of rejections from one expired token down
    /// to a single exchange.
    #[instrument(skip(self, tokens, rejected), fields(principal = %principal))]
    pub async fn refresh_rejected(
        &self,
        principal: &PrincipalId,
        tokens: &RefreshTokens,
        rejected: &CredentialSet,
    ) -> RefreshResult {
        require_tokens(principal, tokens)?;
        self.settle(principal, RefreshMode::Forced, || {
            self.rejected_slots(principal, tokens, rejected)
        })
        .await
    }

    /// Drive the slots returned by `pending` to a final outcome.
    ///
    /// Returns once every pending slot was either refreshed by a plan this
    /// caller started, or settled by a joined plan that exchanged the same
    /// refresh token. Joined plans never fail the caller for slots it did not
    /// ask for.
    async fn settle(
        &self,
        principal: &PrincipalId,
        mode: RefreshMode,
        pending: impl Fn() -> Vec<(TokenSlot, String)>,
    ) -> RefreshResult {
        let mut settled = BTreeSet::new();

        loop {
            let slots: Vec<_> =
                pending().into_iter().filter(|(slot, _)| !settled.contains(slot)).collect();
            if slots.is_empty() {
                return self.current(principal);
            }

            let plan = RefreshPlan { principal: principal.clone(), slots: slots.clone(), mode };
            let (refresh, started) = self.join_or_start(plan);
            let attempts = refresh.await;

            if started {
                let failure = slots.iter().find_map(|(slot, _)| match attempts.get(slot) {
                    Some(SlotAttempt { result: SlotResult::Failed(error), .. }) => Some(error.clone()),
                    _ => None,
                });
                return match failure {
                    Some(error) => Err(error),
                    None => self.current(principal),
                };
            }

            for (slot, refresh_token) in &slots {
                let Some(attempt) = attempts.get(slot) else { continue };
                if attempt.refresh_token != *refresh_token {
                    continue;
                }
                match &attempt.result {
                    SlotResult::Minted => {
                        settled.insert(*slot);
                    }
                    SlotResult::KeptCached if mode == RefreshMode::IfStale => {
                        settled.insert(*slot);
                    }
                    SlotResult::KeptCached => {}
                    SlotResult::Failed(error) => {
                        if mode == RefreshMode::IfStale
                            && keeps_cached(&self.store, principal, *slot, refresh_token, error)
                        {
                            settled.insert(*slot);
                        } else {
                            return Err(error.clone());
                        }
                    }
                }
            }
            debug!("joined in-flight refresh; re-checking requested slots");
        }
    }

    fn current(&self, principal: &PrincipalId) -> RefreshResult {
        self.store.get(principal).ok_or_else(|| {
            ClassifiedError::new(
                ErrorKind::PermanentInvalidCredential,
                RemoteFailure::message(format!("no credentials minted for principal {principal}")),
            )
        })
    }

    fn stale_slots(&self, principal: &PrincipalId, tokens: &RefreshTokens) -> Vec<(TokenSlot, String)> {
        tokens
            .iter()
            .filter(|(slot, refresh_token)| {
                !self.store.is_fresh_for(principal, *slot, refresh_token, self.threshold)
            })
            .map(|(slot, refresh_token)| (slot, refresh_token.to_string()))
            .collect()
    }

    /// Requested slots still holding the access token that was rejected (or
    /// never minted at all).
    fn rejected_slots(
        &self,
        principal: &PrincipalId,
        tokens: &RefreshTokens,
        rejected: &CredentialSet,
    ) -> Vec<(TokenSlot, String)> {
        tokens
            .iter()
            .filter(|(slot, refresh_token)| match self.store.slot(principal, *slot) {
                Some(current) => {
                    current.refresh_token != *refresh_token
                        || rejected.access_token(*slot) == Some(current.access_token.as_str())
                }
                None => true,
            })
            .map(|(slot, refresh_token)| (slot, refresh_token.to_string()))
            .collect()
    }

    /// Join the principal's in-flight refresh or register a new one. The
    /// check and the insert happen under one lock acquisition with no await
    /// in between.
    fn join_or_start(&self, plan: RefreshPlan) -> (SharedRefresh, bool) {
        let mut in_flight = self.in_flight.lock();
        if let Some(existing) = in_flight.get(&plan.principal) {
            return (existing.clone(), false);
        }

        let principal = plan.principal.clone();
        let refresh = self.refresh_future(plan);
        in_flight.insert(principal, refresh.clone());
        (refresh, true)
    }

    fn refresh_future(&self, plan: RefreshPlan) -> SharedRefresh {
        let store = Arc::clone(&self.store);
        let refresher = Arc::clone(&self.refresher);
        let in_flight = Arc::clone(&self.in_flight);

        async move {
            let principal = plan.principal.clone();
            let outcome = Arc::new(execute_plan(&store, refresher.as_ref(), plan).await);
            in_flight.lock().remove(&principal);
            outcome
        }
        .boxed()
        .shared()
    }
}

async fn execute_plan(
    store: &CredentialStore,
    refresher: &dyn TokenRefresher,
    plan: RefreshPlan,
) -> BTreeMap<TokenSlot, SlotAttempt> {
    let RefreshPlan { principal, slots, mode } = plan;
    info!(
        principal = %principal,
        slots = ?slots.iter().map(|(slot, _)| slot.as_str()).collect::<Vec<_>>(),
        forced = mode == RefreshMode::Forced,
        "refreshing access tokens"
    );

    let exchanges = slots.into_iter().map(|(slot, refresh_token)| {
        let principal = &principal;
        async move {
            let outcome = refresher.refresh(principal, slot, &refresh_token).await;
            (slot, refresh_token, outcome)
        }
    });

    let mut attempts = BTreeMap::new();
    for (slot, refresh_token, outcome) in join_all(exchanges).await {
        let result = match outcome {
            Ok(minted) => {
                if minted.refresh_token.as_deref().is_some_and(|rotated| rotated != refresh_token) {
                    info!(principal = %principal, slot = %slot, "token endpoint rotated the refresh token");
                }
                store.set(&principal, slot, minted.access_token, refresh_token.as_str(), store.clock().now());
                SlotResult::Minted
            }
            Err(failure) => {
                let error = classify(failure);
                if mode == RefreshMode::IfStale
                    && keeps_cached(store, &principal, slot, &refresh_token, &error)
                {
                    warn!(
                        principal = %principal,
                        slot = %slot,
                        error = %error,
                        "refresh failed; keeping previously cached token"
                    );
                    SlotResult::KeptCached
                } else {
                    warn!(principal = %principal, slot = %slot, error = %error, "refresh failed");
                    SlotResult::Failed(error)
                }
            }
        };
        attempts.insert(slot, SlotAttempt { refresh_token, result });
    }
    attempts
}

/// A stale-but-cached token survives a failed exchange unless the refresh
/// token itself is dead or the cache was minted from another refresh token.
fn keeps_cached(
    store: &CredentialStore,
    principal: &PrincipalId,
    slot: TokenSlot,
    refresh_token: &str,
    error: &ClassifiedError,
) -> bool {
    error.kind != ErrorKind::PermanentInvalidCredential
        && store.slot(principal, slot).is_some_and(|cached| cached.refresh_token == refresh_token)
}

fn require_tokens(principal: &PrincipalId, tokens: &RefreshTokens) -> Result<(), ClassifiedError> {
    if tokens.is_empty() {
        return Err(ClassifiedError::new(
            ErrorKind::PermanentInvalidCredential,
            RemoteFailure::message(format!("no refresh token supplied for principal {principal}")),
        ));
    }
    Ok(())
}
