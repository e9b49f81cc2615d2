//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers and the guard middleware via the
//! `State` extractor. It holds the guard table and the identity source that
//! builds a request-scoped identity provider from the caller's cookies.

use std::sync::Arc;

use crate::guard::FailurePolicy;
use crate::identity::IdentitySource;
use crate::registry::GuardTable;

/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<GuardTable>,
    pub identity: Arc<dyn IdentitySource>,
    pub on_failure: FailurePolicy,
}

impl AppState {
    #[must_use]
    pub fn new(table: GuardTable, identity: Arc<dyn IdentitySource>, on_failure: FailurePolicy) -> Self {
        Self { table: Arc::new(table), identity, on_failure }
    }
}
