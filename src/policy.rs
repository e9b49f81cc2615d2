//! Access requirements evaluated by route guards.
//!
//! Each protected page names one `Requirement`; composite requirements nest
//! with `all_of` / `any_of`. `AccessPredicate` is what a guard actually holds,
//! so callers can also inject an arbitrary closure.

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::identity::UserAuthState;

/// A named role check, or a composite of them.
///
/// In config a plain requirement is a bare name (`curriculum_admin`) and a
/// composite is a single-key map (`any_of: [translation_admin, question_admin]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRequirement", into = "RawRequirement")]
pub enum Requirement {
    Open,
    LoggedIn,
    CurriculumAdmin,
    SuperAdmin,
    TopicManager,
    /// Curriculum admins, or logged-in topic managers.
    TopicEditor,
    Moderator,
    ReleaseCoordinator,
    /// Blog admins or blog post editors.
    BlogAuthor,
    TranslationAdmin,
    QuestionAdmin,
    CollectionCreator,
    AllOf(Vec<Requirement>),
    AnyOf(Vec<Requirement>),
}

impl Requirement {
    /// Look up a non-composite requirement by its config name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let req = match name {
            "open" => Self::Open,
            "logged_in" => Self::LoggedIn,
            "curriculum_admin" => Self::CurriculumAdmin,
            "super_admin" => Self::SuperAdmin,
            "topic_manager" => Self::TopicManager,
            "topic_editor" => Self::TopicEditor,
            "moderator" => Self::Moderator,
            "release_coordinator" => Self::ReleaseCoordinator,
            "blog_author" => Self::BlogAuthor,
            "translation_admin" => Self::TranslationAdmin,
            "question_admin" => Self::QuestionAdmin,
            "collection_creator" => Self::CollectionCreator,
            _ => return None,
        };
        Some(req)
    }

    /// Whether `user` satisfies this requirement.
    #[must_use]
    pub fn allows(&self, user: &UserAuthState) -> bool {
        match self {
            Self::Open => true,
            Self::LoggedIn => user.is_logged_in,
            Self::CurriculumAdmin => user.is_curriculum_admin,
            Self::SuperAdmin => user.is_super_admin,
            Self::TopicManager => user.is_logged_in && user.is_topic_manager,
            Self::TopicEditor => user.is_curriculum_admin || (user.is_logged_in && user.is_topic_manager),
            Self::Moderator => user.is_moderator,
            Self::ReleaseCoordinator => user.is_release_coordinator,
            Self::BlogAuthor => user.is_blog_admin || user.is_blog_post_editor,
            Self::TranslationAdmin => user.is_translation_admin,
            Self::QuestionAdmin => user.is_question_admin,
            Self::CollectionCreator => user.is_logged_in && user.can_create_collections,
            Self::AllOf(reqs) => reqs.iter().all(|r| r.allows(user)),
            Self::AnyOf(reqs) => reqs.iter().any(|r| r.allows(user)),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::LoggedIn => "logged_in",
            Self::CurriculumAdmin => "curriculum_admin",
            Self::SuperAdmin => "super_admin",
            Self::TopicManager => "topic_manager",
            Self::TopicEditor => "topic_editor",
            Self::Moderator => "moderator",
            Self::ReleaseCoordinator => "release_coordinator",
            Self::BlogAuthor => "blog_author",
            Self::TranslationAdmin => "translation_admin",
            Self::QuestionAdmin => "question_admin",
            Self::CollectionCreator => "collection_creator",
            Self::AllOf(_) => "all_of",
            Self::AnyOf(_) => "any_of",
        };
        f.write_str(name)
    }
}

// =============================================================================
// CONFIG FORM
// =============================================================================

/// Wire shape of a requirement: a bare name or `{ all_of | any_of: [..] }`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawRequirement {
    Name(String),
    Composite(BTreeMap<String, Vec<Requirement>>),
}

impl TryFrom<RawRequirement> for Requirement {
    type Error = String;

    fn try_from(raw: RawRequirement) -> Result<Self, Self::Error> {
        match raw {
            RawRequirement::Name(name) => {
                Self::from_name(&name).ok_or_else(|| format!("unknown requirement `{name}`"))
            }
            RawRequirement::Composite(map) => {
                let mut entries = map.into_iter();
                let (Some((key, members)), None) = (entries.next(), entries.next()) else {
                    return Err("composite requirement must have exactly one key".to_string());
                };
                match key.as_str() {
                    "all_of" => Ok(Self::AllOf(members)),
                    "any_of" => Ok(Self::AnyOf(members)),
                    other => Err(format!("unknown composite `{other}`, expected all_of or any_of")),
                }
            }
        }
    }
}

impl From<Requirement> for RawRequirement {
    fn from(req: Requirement) -> Self {
        match req {
            Requirement::AllOf(members) => Self::Composite(BTreeMap::from([("all_of".to_string(), members)])),
            Requirement::AnyOf(members) => Self::Composite(BTreeMap::from([("any_of".to_string(), members)])),
            other => Self::Name(other.to_string()),
        }
    }
}

// =============================================================================
// PREDICATE
// =============================================================================

type CustomFn = dyn Fn(&UserAuthState) -> bool + Send + Sync;

/// The decision function a guard is parameterized with.
#[derive(Clone)]
pub enum AccessPredicate {
    Requirement(Requirement),
    Custom { name: String, check: Arc<CustomFn> },
}

impl AccessPredicate {
    /// Wrap an arbitrary closure under a name used in logs.
    pub fn custom<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&UserAuthState) -> bool + Send + Sync + 'static,
    {
        Self::Custom { name: name.into(), check: Arc::new(check) }
    }

    #[must_use]
    pub fn allows(&self, user: &UserAuthState) -> bool {
        match self {
            Self::Requirement(req) => req.allows(user),
            Self::Custom { check, .. } => check(user),
        }
    }

    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Requirement(req) => req.to_string(),
            Self::Custom { name, .. } => name.clone(),
        }
    }
}

impl From<Requirement> for AccessPredicate {
    fn from(req: Requirement) -> Self {
        Self::Requirement(req)
    }
}

impl fmt::Debug for AccessPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requirement(req) => f
                .debug_tuple("Requirement")
                .field(req)
                .finish(),
            Self::Custom { name, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}
