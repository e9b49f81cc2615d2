use super::*;
use crate::identity::{IdentityError, UserAuthState};
use crate::navigation::{RedirectSlot, RouterStateSnapshot};

// =============================================================================
// GuardedRoute::matches
// =============================================================================

#[test]
fn literal_pattern_matches_exact_path() {
    let route = GuardedRoute::new("/classroom-admin", Requirement::CurriculumAdmin);
    let snapshot = route.matches("/classroom-admin").unwrap();
    assert_eq!(snapshot.path, "/classroom-admin");
    assert!(snapshot.params.is_empty());
}

#[test]
fn literal_pattern_ignores_trailing_slash() {
    let route = GuardedRoute::new("/classroom-admin", Requirement::CurriculumAdmin);
    assert!(route.matches("/classroom-admin/").is_some());
}

#[test]
fn literal_pattern_rejects_other_paths() {
    let route = GuardedRoute::new("/classroom-admin", Requirement::CurriculumAdmin);
    assert!(route.matches("/classroom").is_none());
    assert!(route.matches("/classroom-admin/extra").is_none());
    assert!(route.matches("/").is_none());
}

#[test]
fn param_pattern_captures_segment() {
    let route = GuardedRoute::new("/topic_editor/{topic_id}", Requirement::TopicEditor);
    let snapshot = route.matches("/topic_editor/abc123").unwrap();
    assert_eq!(snapshot.params.get("topic_id").map(String::as_str), Some("abc123"));
}

#[test]
fn param_pattern_requires_segment() {
    let route = GuardedRoute::new("/topic_editor/{topic_id}", Requirement::TopicEditor);
    assert!(route.matches("/topic_editor").is_none());
}

// =============================================================================
// normalize_path
// =============================================================================

#[test]
fn normalize_decodes_percent_escapes() {
    assert_eq!(normalize_path("/classroom%2Dadmin").as_deref(), Some("/classroom-admin"));
    assert_eq!(normalize_path("/%63lassroom-admin").as_deref(), Some("/classroom-admin"));
    assert_eq!(normalize_path("/classroom-admin%2F").as_deref(), Some("/classroom-admin"));
    assert_eq!(normalize_path("/topic_editor%2Fabc").as_deref(), Some("/topic_editor/abc"));
}

#[test]
fn normalize_resolves_dot_segments() {
    assert_eq!(normalize_path("/learn/../classroom-admin").as_deref(), Some("/classroom-admin"));
    assert_eq!(normalize_path("/./admin/.").as_deref(), Some("/admin"));
    assert_eq!(normalize_path("/learn/%2E%2E/admin").as_deref(), Some("/admin"));
    assert_eq!(normalize_path("/../../admin").as_deref(), Some("/admin"));
    assert_eq!(normalize_path("//admin//").as_deref(), Some("/admin"));
}

#[test]
fn normalize_rejects_double_encoding_and_bad_utf8() {
    assert!(normalize_path("/%2563lassroom-admin").is_none());
    assert!(normalize_path("/%FF").is_none());
}

#[test]
fn normalize_keeps_plain_paths() {
    assert_eq!(normalize_path("/").as_deref(), Some("/"));
    assert_eq!(normalize_path("/learn/math").as_deref(), Some("/learn/math"));
    assert_eq!(normalize_path("/100%").as_deref(), Some("/100%"));
}

#[test]
fn encoded_variants_match_guarded_route() {
    let table = default_table();
    for raw in ["/classroom%2Dadmin", "/%63lassroom-admin", "/classroom-admin%2F", "/learn/../classroom-admin"] {
        let path = normalize_path(raw).unwrap();
        let (route, _) = table.match_path(&path).unwrap();
        assert_eq!(route.requires, Requirement::CurriculumAdmin, "{raw}");
    }
}

// =============================================================================
// GuardTable
// =============================================================================

#[test]
fn default_table_protects_classroom_admin() {
    let table = default_table();
    let (route, _) = table.match_path("/classroom-admin").unwrap();
    assert_eq!(route.requires, Requirement::CurriculumAdmin);
    assert_eq!(table.error_page_root, "/error");
}

#[test]
fn default_table_protects_editor_pages() {
    let table = default_table();
    let (route, snapshot) = table.match_path("/story_editor/s1").unwrap();
    assert_eq!(route.requires, Requirement::TopicEditor);
    assert_eq!(snapshot.params.get("story_id").map(String::as_str), Some("s1"));

    let (route, _) = table.match_path("/create/exp9").unwrap();
    assert_eq!(route.requires, Requirement::LoggedIn);
}

#[test]
fn default_table_leaves_public_pages_unguarded() {
    let table = GuardTable::default();
    assert!(table.match_path("/").is_none());
    assert!(table.match_path("/learn/math").is_none());
    assert!(table.match_path("/error/401").is_none());
}

#[test]
fn first_match_wins() {
    let table = GuardTable {
        error_page_root: "/error".into(),
        routes: vec![
            GuardedRoute::new("/a/{id}", Requirement::LoggedIn),
            GuardedRoute::new("/a/special", Requirement::SuperAdmin),
        ],
    };
    let (route, _) = table.match_path("/a/special").unwrap();
    assert_eq!(route.requires, Requirement::LoggedIn);
}

#[test]
fn from_yaml_parses_routes() {
    let yaml = r"
error_page_root: /oops
routes:
  - path: /classroom-admin
    requires: curriculum_admin
  - path: /topic_editor/{topic_id}
    requires:
      any_of: [curriculum_admin, topic_manager]
";
    let table = GuardTable::from_yaml(yaml).unwrap();
    assert_eq!(table.error_page_root, "/oops");
    assert_eq!(table.routes.len(), 2);
    assert_eq!(
        table.routes[1].requires,
        Requirement::AnyOf(vec![Requirement::CurriculumAdmin, Requirement::TopicManager])
    );
}

#[test]
fn from_yaml_defaults_error_root() {
    let table = GuardTable::from_yaml("routes: []").unwrap();
    assert_eq!(table.error_page_root, DEFAULT_ERROR_PAGE_ROOT);
    assert!(table.routes.is_empty());
}

#[test]
fn from_yaml_rejects_relative_pattern() {
    let yaml = "routes:\n  - path: admin\n    requires: super_admin\n";
    assert!(matches!(GuardTable::from_yaml(yaml), Err(ConfigError::Pattern(p)) if p == "admin"));
}

#[test]
fn from_yaml_rejects_unknown_requirement() {
    let yaml = "routes:\n  - path: /admin\n    requires: wizard\n";
    assert!(matches!(GuardTable::from_yaml(yaml), Err(ConfigError::Parse(_))));
}

#[test]
fn from_file_missing_is_read_error() {
    let err = GuardTable::from_file(Path::new("/definitely/not/here/guards.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

// =============================================================================
// guard_for
// =============================================================================

struct FixedIdentity(UserAuthState);

#[async_trait::async_trait]
impl IdentityProvider for FixedIdentity {
    async fn current_user_auth_state(&self) -> Result<UserAuthState, IdentityError> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn guard_for_uses_table_error_root() {
    let table = GuardTable { error_page_root: "/oops".into(), routes: vec![] };
    let route = GuardedRoute::new("/admin", Requirement::SuperAdmin);
    let slot = RedirectSlot::new();
    let guard = table.guard_for(
        &route,
        Arc::new(FixedIdentity(UserAuthState::default())),
        Arc::new(slot.clone()),
        FailurePolicy::Propagate,
    );

    let allowed = guard
        .can_activate(&RouteSnapshot::new("/admin"), &RouterStateSnapshot::new("/admin"))
        .await
        .unwrap();
    assert!(!allowed);
    assert_eq!(slot.target().as_deref(), Some("/oops/401"));
}

#[test]
fn shipped_config_matches_builtin_table() {
    let table = GuardTable::from_yaml(include_str!("../config/guards.yaml")).unwrap();
    assert_eq!(table, default_table());
}
