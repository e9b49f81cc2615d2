//! Route access guard — fetch identity, evaluate predicate, redirect on deny.
//!
//! ARCHITECTURE
//! ============
//! A `RouteGuard` is one fetch-then-decide-then-redirect scaffold shared by
//! every protected page; only the injected `AccessPredicate` differs. Each
//! call walks a fresh two-state machine:
//!
//! ```text
//! Pending --fetch ok, allowed--> Allow
//! Pending --fetch ok, denied---> Deny { redirected_to }
//! Pending --fetch err----------> Err (Propagate) | Deny (FailClosed)
//! ```
//!
//! TRADE-OFFS
//! ==========
//! The redirect future is detached onto the runtime instead of awaited, so the
//! decision can be returned before the redirect completes. Nothing orders the
//! two; callers that need the redirect applied first must observe it through
//! their navigator. Outside a tokio runtime the future is polled once in
//! place and dropped if it is still pending.

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;

use std::sync::Arc;

use futures::FutureExt;

use crate::identity::{IdentityError, IdentityProvider, UserAuthState};
use crate::navigation::{NavigationRequest, Navigator, RouteSnapshot, RouterStateSnapshot, join_segments};
use crate::policy::AccessPredicate;

pub const DEFAULT_ERROR_PAGE_ROOT: &str = "/error";
pub const UNAUTHORIZED_STATUS: u16 = 401;

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("identity fetch failed: {0}")]
    IdentityFetch(#[from] IdentityError),
}

/// What happens when the identity fetch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Return the fetch error to the caller; no redirect.
    #[default]
    Propagate,
    /// Treat the failure as a deny: redirect and return `false`.
    FailClosed,
}

/// Terminal state of a single guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { redirected_to: Vec<String> },
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Path segments of the unauthorized error page under `root`.
#[must_use]
pub fn unauthorized_segments(root: &str) -> Vec<String> {
    vec![join_segments(&[root.to_string(), UNAUTHORIZED_STATUS.to_string()])]
}

// =============================================================================
// GUARD
// =============================================================================

#[derive(Clone)]
pub struct RouteGuard {
    identity: Arc<dyn IdentityProvider>,
    navigator: Arc<dyn Navigator>,
    predicate: AccessPredicate,
    redirect: Vec<String>,
    on_failure: FailurePolicy,
}

impl RouteGuard {
    /// Guard that redirects denied users to `/error/401`.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
        predicate: impl Into<AccessPredicate>,
    ) -> Self {
        Self {
            identity,
            navigator,
            predicate: predicate.into(),
            redirect: unauthorized_segments(DEFAULT_ERROR_PAGE_ROOT),
            on_failure: FailurePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_redirect(mut self, segments: Vec<String>) -> Self {
        self.redirect = segments;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    #[must_use]
    pub fn predicate(&self) -> &AccessPredicate {
        &self.predicate
    }

    #[must_use]
    pub fn redirect_segments(&self) -> &[String] {
        &self.redirect
    }

    /// Decide whether the navigation to `route` may proceed.
    ///
    /// Returns `Ok(false)` exactly when a redirect was issued.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::IdentityFetch`] if the identity fetch fails and
    /// the failure policy is [`FailurePolicy::Propagate`].
    pub async fn can_activate(
        &self,
        route: &RouteSnapshot,
        state: &RouterStateSnapshot,
    ) -> Result<bool, GuardError> {
        let decision = self.evaluate(route, state).await?;
        Ok(decision.is_allowed())
    }

    /// [`RouteGuard::can_activate`] for a paired route and router state.
    ///
    /// # Errors
    ///
    /// See [`RouteGuard::can_activate`].
    pub async fn can_activate_request(&self, request: &NavigationRequest) -> Result<bool, GuardError> {
        self.can_activate(&request.route, &request.state).await
    }

    /// Run the check and return the terminal [`Decision`].
    ///
    /// # Errors
    ///
    /// See [`RouteGuard::can_activate`].
    pub async fn evaluate(
        &self,
        route: &RouteSnapshot,
        state: &RouterStateSnapshot,
    ) -> Result<Decision, GuardError> {
        let decision = match self.identity.current_user_auth_state().await {
            Ok(user) => self.decide(&user, route, state),
            Err(e) => match self.on_failure {
                FailurePolicy::Propagate => {
                    tracing::warn!(
                        path = %route.path,
                        guard = %self.predicate.name(),
                        error = %e,
                        "identity fetch failed"
                    );
                    return Err(e.into());
                }
                FailurePolicy::FailClosed => {
                    tracing::warn!(
                        path = %route.path,
                        guard = %self.predicate.name(),
                        error = %e,
                        "identity fetch failed, denying"
                    );
                    self.deny(route, state)
                }
            },
        };
        Ok(decision)
    }

    fn decide(&self, user: &UserAuthState, route: &RouteSnapshot, state: &RouterStateSnapshot) -> Decision {
        if self.predicate.allows(user) {
            tracing::debug!(path = %route.path, guard = %self.predicate.name(), "navigation allowed");
            Decision::Allow
        } else {
            self.deny(route, state)
        }
    }

    fn deny(&self, route: &RouteSnapshot, state: &RouterStateSnapshot) -> Decision {
        tracing::info!(
            path = %route.path,
            url = %state.url,
            guard = %self.predicate.name(),
            redirect = %join_segments(&self.redirect),
            "navigation denied"
        );
        let pending = self.navigator.navigate(self.redirect.clone());
        let target = join_segments(&self.redirect);
        let report = {
            let target = target.clone();
            async move {
                if !pending.await {
                    tracing::warn!(redirect = %target, "redirect was not applied");
                }
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(report);
            }
            Err(_) => {
                if report.now_or_never().is_none() {
                    tracing::warn!(redirect = %target, "no tokio runtime, pending redirect dropped");
                }
            }
        }
        Decision::Deny { redirected_to: self.redirect.clone() }
    }
}
