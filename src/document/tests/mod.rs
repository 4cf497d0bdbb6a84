use super::*;
use crate::types::AccessLevel::{Deny, ReadOnly, ReadWrite};
use yare::parameterized;


fn assert_duplicate<T: std::fmt::Debug>(result: Result<T, AuthzError>) {
    assert!(
        matches!(result, Err(AuthzError::Duplicate(_))),
        "expected a duplicate error, got {result:?}"
    );
}

fn assert_unknown<T: std::fmt::Debug>(result: Result<T, AuthzError>) {
    assert!(
        matches!(result, Err(AuthzError::UnknownReference(_))),
        "expected an unknown reference error, got {result:?}"
    );
}

fn assert_invalid<T: std::fmt::Debug>(result: Result<T, AuthzError>) {
    assert!(
        matches!(result, Err(AuthzError::Validation { .. })),
        "expected a validation error, got {result:?}"
    );
}

/// admins = alice, bob; developers = @admins, carol; rules on myrepo:/trunk.
fn sample_document() -> Document {
    let mut doc = Document::new();
    let admins = doc.add_group("admins").unwrap();
    let developers = doc.add_group("developers").unwrap();
    let alice = doc.add_user("alice", None).unwrap();
    let bob = doc.add_user("bob", None).unwrap();
    let carol = doc.add_user("carol", None).unwrap();
    doc.add_group_member(admins, Principal::User(alice)).unwrap();
    doc.add_group_member(admins, Principal::User(bob)).unwrap();
    doc.add_group_member(developers, Principal::Group(admins))
        .unwrap();
    doc.add_group_member(developers, Principal::User(carol))
        .unwrap();

    let repo = doc.add_repository("myrepo").unwrap();
    let trunk = doc.add_path(Some(repo), "/trunk").unwrap();
    doc.add_access_rule_for_group(trunk, "admins", "rw").unwrap();
    doc.add_access_rule_for_user(trunk, "carol", "r").unwrap();
    doc
}

#[test]
fn test_new_document_is_empty() {
    let doc = Document::new();
    assert!(doc.is_empty());
    assert!(doc.snapshot().is_empty());
}

#[test]
fn test_add_and_find_repository() {
    let mut doc = Document::new();
    let id = doc.add_repository("myrepo").unwrap();
    assert_eq!(doc.find_repository("myrepo"), Some(id));
    assert_eq!(doc.repository(id).unwrap().name(), "myrepo");
    assert_eq!(doc.find_repository("other"), None);
}

#[test]
fn test_duplicate_repository_is_rejected() {
    let mut doc = Document::new();
    doc.add_repository("myrepo").unwrap();
    assert_duplicate(doc.add_repository("myrepo"));
}

#[parameterized(
    colon = { "my:repo" },
    blank = { " " },
)]
fn test_invalid_repository_is_rejected(name: &str) {
    let mut doc = Document::new();
    assert_invalid(doc.add_repository(name));
    assert!(doc.is_empty());
}

#[test]
fn test_duplicate_path_is_rejected() {
    let mut doc = Document::new();
    let repo = doc.add_repository("repoX").unwrap();
    doc.add_path(Some(repo), "/trunk").unwrap();
    let err = doc.add_path(Some(repo), "/trunk").unwrap_err();
    assert!(matches!(err, AuthzError::Duplicate(msg) if msg.contains("repoX:/trunk")));
}

#[test]
fn test_server_and_repository_paths_are_distinct() {
    let mut doc = Document::new();
    let repo = doc.add_repository("myrepo").unwrap();
    let server = doc.add_path(None, "/trunk").unwrap();
    let scoped = doc.add_path(Some(repo), "/trunk").unwrap();

    assert_ne!(server, scoped);
    assert_eq!(doc.find_path(None, "/trunk"), Some(server));
    assert_eq!(doc.find_path(Some(repo), "/trunk"), Some(scoped));
    assert!(doc.path(server).unwrap().is_server_level());
    assert_eq!(doc.section_name(server).unwrap(), "/trunk");
    assert_eq!(doc.section_name(scoped).unwrap(), "myrepo:/trunk");
    assert_eq!(doc.repository(repo).unwrap().paths().collect::<Vec<_>>(), vec![scoped]);
}

#[parameterized(
    relative = { "trunk" },
    trailing_slash = { "/trunk/" },
    empty = { "" },
)]
fn test_invalid_path_is_rejected(path: &str) {
    let mut doc = Document::new();
    assert_invalid(doc.add_path(None, path));
}

#[test]
fn test_colon_only_allowed_in_repository_paths() {
    let mut doc = Document::new();
    let err = doc.add_path(None, "/a:b").unwrap_err();
    assert!(matches!(
        err,
        AuthzError::Validation {
            field: Field::Path,
            ..
        }
    ));
    assert_eq!(doc.find_path(None, "/a:b"), None);

    let repo = doc.add_repository("repo").unwrap();
    assert!(doc.add_path(Some(repo), "/a:b").is_ok());
}

#[test]
fn test_path_under_removed_repository_is_unknown() {
    let mut doc = Document::new();
    let repo = doc.add_repository("gone").unwrap();
    doc.remove_repository(repo);
    assert_unknown(doc.add_path(Some(repo), "/trunk"));
}

#[test]
fn test_duplicate_group_is_rejected() {
    let mut doc = Document::new();
    doc.add_group("admins").unwrap();
    assert_duplicate(doc.add_group("admins"));
    assert_invalid(doc.add_group("ad=mins"));
}

#[test]
fn test_names_are_case_sensitive() {
    let mut doc = Document::new();
    let lower = doc.add_group("admins").unwrap();
    let upper = doc.add_group("Admins").unwrap();
    assert_ne!(lower, upper);
    assert_eq!(doc.find_group("ADMINS"), None);

    doc.add_user("bob", None).unwrap();
    assert!(doc.add_user("Bob", None).is_ok());
}

#[test]
fn test_add_user_with_alias() {
    let mut doc = Document::new();
    let id = doc.add_user("alice.smith", Some("alice")).unwrap();
    assert_eq!(doc.find_user("alice.smith"), Some(id));
    assert_eq!(doc.find_user_by_alias("alice"), Some(id));
    assert_eq!(doc.find_user("alice"), None);
    assert_eq!(doc.user(id).unwrap().alias(), Some("alice"));
}

#[test]
fn test_alias_collision_is_rejected() {
    let mut doc = Document::new();
    doc.add_user("robert", Some("bob")).unwrap();
    assert_duplicate(doc.add_user("roberta", Some("bob")));
}

#[test]
fn test_alias_may_not_shadow_user_name() {
    let mut doc = Document::new();
    doc.add_user("bob", None).unwrap();
    assert_duplicate(doc.add_user("robert", Some("bob")));
}

#[test]
fn test_user_name_may_not_shadow_alias() {
    let mut doc = Document::new();
    doc.add_user("robert", Some("bob")).unwrap();
    assert_duplicate(doc.add_user("bob", None));
}

#[test]
fn test_alias_may_equal_own_name() {
    let mut doc = Document::new();
    let id = doc.add_user("bob", Some("bob")).unwrap();
    assert_eq!(doc.find_user_by_alias("bob"), Some(id));
}

#[test]
fn test_invalid_alias_is_rejected() {
    let mut doc = Document::new();
    assert_invalid(doc.add_user("alice", Some("")));
    assert_invalid(doc.add_user("alice", Some("a=b")));
    assert!(doc.find_user("alice").is_none());
}

#[test]
fn test_set_user_alias_replaces_previous() {
    let mut doc = Document::new();
    let id = doc.add_user("alice.smith", Some("alice")).unwrap();
    doc.set_user_alias(id, Some("asmith")).unwrap();
    assert_eq!(doc.find_user_by_alias("alice"), None);
    assert_eq!(doc.find_user_by_alias("asmith"), Some(id));

    doc.set_user_alias(id, None).unwrap();
    assert_eq!(doc.find_user_by_alias("asmith"), None);
    assert_eq!(doc.user(id).unwrap().alias(), None);
}

#[test]
fn test_set_user_alias_rejects_collision() {
    let mut doc = Document::new();
    doc.add_user("robert", Some("bob")).unwrap();
    let other = doc.add_user("roberta", None).unwrap();
    assert_duplicate(doc.set_user_alias(other, Some("bob")));
    assert_duplicate(doc.set_user_alias(other, Some("robert")));
    assert_eq!(doc.user(other).unwrap().alias(), None);
}

#[test]
fn test_documents_compare_by_content_not_insertion_order() {
    let mut first = Document::new();
    first.add_user("alice", None).unwrap();
    first.add_user("bob", None).unwrap();

    let mut second = Document::new();
    second.add_user("bob", None).unwrap();
    second.add_user("alice", None).unwrap();

    assert_eq!(first, second);

    second.add_group("admins").unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_snapshot_of_sample_document() {
    let doc = sample_document();
    insta::assert_json_snapshot!(doc.snapshot(), @r#"
    {
      "repositories": [
        "myrepo"
      ],
      "groups": [
        {
          "name": "admins",
          "groups": [],
          "users": [
            "alice",
            "bob"
          ]
        },
        {
          "name": "developers",
          "groups": [
            "admins"
          ],
          "users": [
            "carol"
          ]
        }
      ],
      "users": [
        {
          "name": "alice"
        },
        {
          "name": "bob"
        },
        {
          "name": "carol"
        }
      ],
      "paths": [
        {
          "repository": "myrepo",
          "path": "/trunk",
          "rules": [
            {
              "user": "carol",
              "level": "read-only"
            },
            {
              "group": "admins",
              "level": "read-write"
            }
          ]
        }
      ]
    }
    "#);
}

#[test]
fn test_paths_in_order_puts_server_paths_first() {
    let mut doc = Document::new();
    let zeta = doc.add_repository("zeta").unwrap();
    let alpha = doc.add_repository("alpha").unwrap();
    let z = doc.add_path(Some(zeta), "/a").unwrap();
    let a = doc.add_path(Some(alpha), "/b").unwrap();
    let server = doc.add_path(None, "/z").unwrap();
    let root = doc.add_path(None, "/").unwrap();

    assert_eq!(doc.paths_in_order(), vec![root, server, a, z]);
}

#[test]
fn test_levels_are_stored() {
    let mut doc = Document::new();
    let path = doc.add_path(None, "/").unwrap();
    doc.add_user("a", None).unwrap();
    doc.add_user("b", None).unwrap();
    doc.add_user("c", None).unwrap();
    let levels: Vec<_> = [("a", ""), ("b", "r"), ("c", "rw")]
        .iter()
        .map(|(user, level)| {
            let id = doc.add_access_rule_for_user(path, user, level).unwrap();
            doc.access_rule(id).unwrap().level()
        })
        .collect();
    assert_eq!(levels, vec![Deny, ReadOnly, ReadWrite]);
}
