//! Navigation collaborator — route snapshots and redirect dispatch.
//!
//! DESIGN
//! ======
//! `Navigator::navigate` is called synchronously and hands back a future for
//! the redirect's outcome. Guards never await that future on their own path;
//! they detach it so the redirect can race the returned decision.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture, FutureExt};
use serde::Serialize;
use tokio::sync::mpsc;

// =============================================================================
// SNAPSHOTS
// =============================================================================

/// Target of a navigation attempt: the requested path and any captured params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteSnapshot {
    pub path: String,
    pub params: BTreeMap<String, String>,
}

impl RouteSnapshot {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), params: BTreeMap::new() }
    }
}

/// Router-side state for the navigation (the full URL being entered).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouterStateSnapshot {
    pub url: String,
}

impl RouterStateSnapshot {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// A route snapshot paired with its router state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationRequest {
    pub route: RouteSnapshot,
    pub state: RouterStateSnapshot,
}

// =============================================================================
// NAVIGATOR
// =============================================================================

/// Issues redirects. The returned future resolves to whether the redirect
/// took effect.
pub trait Navigator: Send + Sync {
    fn navigate(&self, segments: Vec<String>) -> BoxFuture<'static, bool>;
}

/// Join path segments into a single absolute path, collapsing repeated `/`.
#[must_use]
pub fn join_segments(segments: &[String]) -> String {
    let parts: Vec<&str> = segments
        .iter()
        .flat_map(|s| s.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", parts.join("/"))
}

/// A redirect command delivered by [`ChannelNavigator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub segments: Vec<String>,
}

impl Redirect {
    #[must_use]
    pub fn path(&self) -> String {
        join_segments(&self.segments)
    }
}

/// Forwards redirects to a consumer task over an mpsc channel.
#[derive(Clone)]
pub struct ChannelNavigator {
    tx: mpsc::Sender<Redirect>,
}

impl ChannelNavigator {
    /// Create a navigator and the receiving end its redirects arrive on.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Redirect>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, segments: Vec<String>) -> BoxFuture<'static, bool> {
        let tx = self.tx.clone();
        async move { tx.send(Redirect { segments }).await.is_ok() }.boxed()
    }
}

/// Captures the redirect issued while handling a single HTTP request.
///
/// Only the first redirect is kept.
#[derive(Clone, Default)]
pub struct RedirectSlot {
    target: Arc<Mutex<Option<String>>>,
}

impl RedirectSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded redirect path, if any.
    #[must_use]
    pub fn target(&self) -> Option<String> {
        self.target
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
    }
}

impl Navigator for RedirectSlot {
    fn navigate(&self, segments: Vec<String>) -> BoxFuture<'static, bool> {
        let recorded = match self.target.lock() {
            Ok(mut slot) => {
                if slot.is_none() {
                    *slot = Some(join_segments(&segments));
                }
                true
            }
            Err(_) => false,
        };
        future::ready(recorded).boxed()
    }
}
