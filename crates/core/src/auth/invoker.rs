//! Bounded auth-retry wrapper around remote operations

use std::future::Future;
use std::sync::Arc;

use adpulse_domain::{CredentialSet, PrincipalId, RefreshTokens, RemoteFailure};
use tracing::{instrument, warn};

use super::classifier::{classify, ClassifiedError};
use super::coordinator::RefreshCoordinator;

/// Runs an operation with valid credentials and retries it exactly once when
/// the remote rejects the access token.
///
/// The operation is called at most twice per [`RetryingInvoker::invoke`].
/// Rate limits, network faults and permanent credential failures are
/// classified and returned without a retry.
pub struct RetryingInvoker {
    coordinator: Arc<RefreshCoordinator>,
}

impl RetryingInvoker {
    /// Invoker refreshing through `coordinator`.
    pub fn new(coordinator: Arc<RefreshCoordinator>) -> Self {
        Self { coordinator }
    }

    /// The coordinator behind this invoker.
    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Run `operation` with valid credentials, refreshing and retrying once on an expired token.
    #[instrument(skip(self, tokens, operation), fields(principal = %principal))]
    pub async fn invoke<T, F, Fut>(
        &self,
        principal: &PrincipalId,
        tokens: &RefreshTokens,
        operation: F,
    ) -> Result<T, ClassifiedError>
    where
        F: Fn(CredentialSet) -> Fut,
        Fut: Future<Output = Result<T, RemoteFailure>>,
    {
        let credentials = self.coordinator.ensure_valid(principal, tokens).await?;

        let error = match operation(credentials.clone()).await {
            Ok(value) => return Ok(value),
            Err(failure) => classify(failure),
        };
        if !error.is_auth_expired() {
            return Err(error);
        }

        warn!(error = %error, "access token rejected; refreshing and retrying once");
        let refreshed = self.coordinator.refresh_rejected(principal, tokens, &credentials).await?;
        operation(refreshed).await.map_err(classify)
    }
}
