//! Guard table — which page paths are protected, and by what.
//!
//! DESIGN
//! ======
//! The table is plain data (`path` pattern + `Requirement`), loaded from YAML
//! or taken from `default_table()`. Guards are built per navigation because
//! the identity provider is request-scoped (it carries the caller's cookie).
//!
//! Patterns match segment by segment; `{name}` captures one segment into the
//! route params. The first matching entry wins.
//!
//! Request paths are normalized with `normalize_path` before matching, so the
//! table sees the same path the static file layer will serve.

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::guard::{DEFAULT_ERROR_PAGE_ROOT, FailurePolicy, RouteGuard, unauthorized_segments};
use crate::identity::IdentityProvider;
use crate::navigation::{Navigator, RouteSnapshot};
use crate::policy::Requirement;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read guard config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid guard config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid route pattern {0:?}: must start with '/'")]
    Pattern(String),
}

/// One protected page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardedRoute {
    pub path: String,
    pub requires: Requirement,
}

impl GuardedRoute {
    #[must_use]
    pub fn new(path: impl Into<String>, requires: Requirement) -> Self {
        Self { path: path.into(), requires }
    }

    /// Match `path` against this route's pattern, capturing `{param}` segments.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<RouteSnapshot> {
        let pattern: Vec<&str> = split_path(&self.path);
        let actual: Vec<&str> = split_path(path);
        if pattern.len() != actual.len() {
            return None;
        }

        let mut route = RouteSnapshot::new(path);
        for (want, got) in pattern.iter().zip(&actual) {
            if let Some(name) = want
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                route.params.insert(name.to_string(), (*got).to_string());
            } else if want != got {
                return None;
            }
        }
        Some(route)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Percent-decode a request path and resolve `.` / `..` segments.
///
/// Returns `None` for paths that do not decode to UTF-8 or that would decode
/// again (double encoding); those cannot be matched reliably.
#[must_use]
pub fn normalize_path(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?;
    if urlencoding::decode(&decoded).ok()? != decoded {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    Some(format!("/{}", segments.join("/")))
}

fn default_error_page_root() -> String {
    DEFAULT_ERROR_PAGE_ROOT.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardTable {
    #[serde(default = "default_error_page_root")]
    pub error_page_root: String,
    #[serde(default)]
    pub routes: Vec<GuardedRoute>,
}

impl GuardTable {
    /// Parse a table from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed YAML and
    /// [`ConfigError::Pattern`] for a relative route pattern.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let table: Self = serde_yaml::from_str(raw)?;
        if let Some(bad) = table.routes.iter().find(|r| !r.path.starts_with('/')) {
            return Err(ConfigError::Pattern(bad.path.clone()));
        }
        Ok(table)
    }

    /// Read and parse a table from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise as
    /// [`GuardTable::from_yaml`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        Self::from_yaml(&raw)
    }

    /// First route whose pattern matches `path`, with its captured params.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&GuardedRoute, RouteSnapshot)> {
        self.routes
            .iter()
            .find_map(|route| route.matches(path).map(|snapshot| (route, snapshot)))
    }

    /// Build the guard for `route` wired to request-scoped collaborators.
    #[must_use]
    pub fn guard_for(
        &self,
        route: &GuardedRoute,
        identity: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
        on_failure: FailurePolicy,
    ) -> RouteGuard {
        RouteGuard::new(identity, navigator, route.requires.clone())
            .with_redirect(unauthorized_segments(&self.error_page_root))
            .with_failure_policy(on_failure)
    }
}

impl Default for GuardTable {
    fn default() -> Self {
        default_table()
    }
}

/// Built-in table covering the platform's protected pages.
#[must_use]
pub fn default_table() -> GuardTable {
    use Requirement::{
        AnyOf, BlogAuthor, CollectionCreator, CurriculumAdmin, LoggedIn, Moderator, QuestionAdmin, ReleaseCoordinator,
        SuperAdmin, TopicEditor, TranslationAdmin,
    };

    let routes = vec![
        GuardedRoute::new("/classroom-admin", CurriculumAdmin),
        GuardedRoute::new("/admin", SuperAdmin),
        GuardedRoute::new("/moderator", Moderator),
        GuardedRoute::new("/release-coordinator", ReleaseCoordinator),
        GuardedRoute::new("/topics-and-skills-dashboard", TopicEditor),
        GuardedRoute::new("/topic_editor/{topic_id}", TopicEditor),
        GuardedRoute::new("/skill_editor/{skill_id}", TopicEditor),
        GuardedRoute::new("/story_editor/{story_id}", TopicEditor),
        GuardedRoute::new("/create/{exploration_id}", LoggedIn),
        GuardedRoute::new("/blog-dashboard", BlogAuthor),
        GuardedRoute::new("/contributor-admin-dashboard", AnyOf(vec![TranslationAdmin, QuestionAdmin])),
        GuardedRoute::new("/collection_editor/create/{collection_id}", CollectionCreator),
        GuardedRoute::new("/preferences", LoggedIn),
        GuardedRoute::new("/facilitator-dashboard", LoggedIn),
        GuardedRoute::new("/create-learner-group", LoggedIn),
        GuardedRoute::new("/edit-learner-group/{learner_group_id}", LoggedIn),
    ];

    GuardTable { error_page_root: default_error_page_root(), routes }
}
