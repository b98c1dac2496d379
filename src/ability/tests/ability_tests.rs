//! Integration tests for the ability decision object
//!
//! Covers the documented decision scenarios, global markers, scope prefix
//! matching, context conditions and concurrent use of a shared ability.

use cretoai_ability::{
    can, cannot, group_permissions, parse_permission_string, permission, Ability, GroupOptions,
    Permission, PermissionGroup, PermissionItem, PermissionType, Scope,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread;

fn conditions(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

// ============================================================================
// DECISION SCENARIOS
// ============================================================================

#[test]
fn test_plain_grants() {
    let ability = Ability::new(["user:read", "user:create"]).unwrap();

    assert!(ability.has(["user:read"], None).unwrap());
    assert!(!ability.has(["user:delete"], None).unwrap());
}

#[test]
fn test_global_action_with_scope_prefix() {
    let ability = Ability::new(["org:123:all:manage"]).unwrap();

    let request = can("read", "user").in_scope("org:123:app:456").unwrap();
    assert!(ability.test(&request, None));

    let elsewhere = can("read", "user").in_scope("org:999:app:456").unwrap();
    assert!(!ability.test(&elsewhere, None));
}

#[test]
fn test_only_denials_granted() {
    let ability = Ability::new(["!user:delete"]).unwrap();

    assert!(!ability.has(["user:delete"], None).unwrap());
    // Nothing grants read either
    assert!(!ability.has(["user:read"], None).unwrap());
    assert!(ability.has([cannot("read", "user")], None).unwrap());
    assert!(ability.has(["!user:delete"], None).unwrap());
}

#[test]
fn test_parse_full_permission_string() {
    let p = parse_permission_string("org:123:user,role:read,write{active:true}").unwrap();

    assert_eq!(p.scope, Some(Scope::new("org:123").unwrap()));
    assert_eq!(p.subject, vec!["user", "role"]);
    assert_eq!(p.action, vec!["read", "write"]);
    assert_eq!(p.kind, PermissionType::Can);
    assert_eq!(p.conditions, Some(conditions(json!({ "active": true }))));
}

#[test]
fn test_group_shared_scope_and_conditions() {
    let build = |action: &str| {
        permission("user", action)
            .when(json!({ "orgId": "1" }))
            .in_scope("org:1")
            .unwrap()
    };

    let groups = group_permissions(
        &[build("read").into(), build("create").into()],
        &GroupOptions::default(),
    )
    .unwrap();

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.scope, Some(Scope::new("org:1").unwrap()));
    assert_eq!(group.conditions, Some(conditions(json!({ "orgId": "1" }))));
    assert_eq!(
        group.permissions,
        vec![
            PermissionItem::from(permission("user", "read")),
            PermissionItem::from(permission("user", "create")),
        ]
    );
}

// ============================================================================
// DECISION RULES
// ============================================================================

#[test]
fn test_cannot_overrides_can() {
    let ability = Ability::new([can("read", "user"), cannot("read", "user")]).unwrap();
    assert!(!ability.has([permission("user", "read")], None).unwrap());
}

#[test]
fn test_unmentioned_cannot_is_true() {
    let ability = Ability::new(["user:read", "role:manage"]).unwrap();
    assert!(ability.has([cannot("delete", "project")], None).unwrap());
    assert!(!ability.has([cannot("read", "user")], None).unwrap());
}

#[test]
fn test_global_markers() {
    let ability = Ability::new(["user:manage", "all:read"]).unwrap();

    for action in ["read", "update", "archive", "export"] {
        assert!(ability.can(action, "user"), "user:{action}");
    }
    for subject in ["user", "role", "invoice"] {
        assert!(ability.can("read", subject), "{subject}:read");
    }
    assert!(!ability.can("update", "role"));
}

#[test]
fn test_scoped_denial_inside_broad_grant() {
    let ability = Ability::new(["org:1:project:manage", "!org:1:app:secret:project:delete"])
        .unwrap();

    let open = can("delete", "project").in_scope("org:1:app:public").unwrap();
    let locked = can("delete", "project").in_scope("org:1:app:secret").unwrap();

    assert!(ability.test(&open, None));
    assert!(!ability.test(&locked, None));
}

#[test]
fn test_wildcard_scope_grant() {
    let ability = Ability::new(["org:*:app:456:role:assign,unassign"]).unwrap();

    let request = can(["assign", "unassign"], "role")
        .in_scope("org:77:app:456")
        .unwrap();
    assert!(ability.test(&request, None));

    let other_app = can("assign", "role").in_scope("org:77:app:457").unwrap();
    assert!(!ability.test(&other_app, None));
}

#[test]
fn test_group_inheritance_in_ability() {
    let group = PermissionGroup::new(vec![
        "user:read".into(),
        PermissionGroup::new(vec!["billing:update".into()])
            .in_scope("app:crm")
            .unwrap()
            .into(),
    ])
    .in_scope("org:9")
    .unwrap();

    let ability = Ability::new([group]).unwrap();
    let rendered: Vec<String> = ability.permissions().iter().map(Permission::to_string).collect();
    assert_eq!(rendered, vec!["org:9:user:read", "org:9:app:crm:billing:update"]);

    assert!(ability.test(&can("update", "billing").in_scope("org:9:app:crm").unwrap(), None));
    assert!(!ability.test(&can("update", "billing").in_scope("org:9:app:erp").unwrap(), None));
}

#[test]
fn test_explicit_global_request_is_stable_across_encoding() {
    let ability = Ability::new(["org:1:user:read"]).unwrap();

    let explicit = parse_permission_string(":user:read").unwrap();
    let decoded = parse_permission_string(&explicit.to_string()).unwrap();
    assert!(!ability.test(&explicit, None));
    assert!(!ability.test(&decoded, None));

    // Unscoped requests skip the scope check entirely
    assert!(ability.test(&can("read", "user"), None));
}

#[test]
fn test_grouping_preserves_explicit_global_decision() {
    let ability = Ability::new(["org:1:user:read"]).unwrap();
    let items: Vec<PermissionItem> = vec![":user:read".into()];

    let grouped: Vec<PermissionItem> = group_permissions(&items, &GroupOptions::default())
        .unwrap()
        .into_iter()
        .map(PermissionItem::from)
        .collect();

    assert!(!ability.has(items, None).unwrap());
    assert!(!ability.has(grouped, None).unwrap());
}

// ============================================================================
// CONDITIONS
// ============================================================================

#[test]
fn test_context_operators() {
    let ability = Ability::new(["document:read{level:{$lte:3},tags:{$in:['public','team']}}"])
        .unwrap();

    let ok = json!({ "level": 2, "tags": "team" });
    let too_high = json!({ "level": 5, "tags": "team" });
    let wrong_tag = json!({ "level": 1, "tags": "secret" });

    assert!(ability.test(&can("read", "document"), Some(&ok)));
    assert!(!ability.test(&can("read", "document"), Some(&too_high)));
    assert!(!ability.test(&can("read", "document"), Some(&wrong_tag)));
}

#[test]
fn test_cel_condition() {
    let granted = can("update", "post").when(json!({ "$cel": "user.id == post.authorId" }));
    let ability = Ability::new([granted]).unwrap();

    let own = json!({ "user": { "id": "u1" }, "post": { "authorId": "u1" } });
    let foreign = json!({ "user": { "id": "u1" }, "post": { "authorId": "u2" } });

    assert!(ability.test(&can("update", "post"), Some(&own)));
    assert!(!ability.test(&can("update", "post"), Some(&foreign)));
}

#[test]
fn test_requested_conditions_must_be_covered() {
    let ability = Ability::new(["invoice:read{orgId:'1',region:'eu'}"]).unwrap();

    assert!(ability.has(["invoice:read{orgId:'1'}"], None).unwrap());
    assert!(!ability.has(["invoice:read{orgId:'2'}"], None).unwrap());
}

// ============================================================================
// HAS / HAS_ANY / HAS_ALL
// ============================================================================

#[test]
fn test_has_variants() {
    let ability = Ability::new(["user:read", "role:read"]).unwrap();

    let mixed = ["user:read", "user:delete"];
    assert!(!ability.has(mixed, None).unwrap());
    assert!(!ability.has_all(mixed, None).unwrap());
    assert!(ability.has_any(mixed, None).unwrap());

    let group = PermissionGroup::new(vec!["user:read".into(), "role:read".into()]);
    assert!(ability.has_all([group], None).unwrap());
}

#[test]
fn test_has_rejects_malformed_strings() {
    let ability = Ability::new(["user:read"]).unwrap();
    assert!(ability.has_any(["user:read", "broken"], None).is_err());
    assert!(Ability::new(["user:read{role: admin}"]).is_err());
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn test_shared_across_threads() {
    let ability = Arc::new(
        Ability::new([
            "org:1:user:read",
            "org:1:post:update{$cel:\"user.id == 'u1'\"}",
        ])
        .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ability = Arc::clone(&ability);
            thread::spawn(move || {
                let scope = format!("org:1:app:{i}");
                let read = can("read", "user").in_scope(&scope).unwrap();
                let context = json!({ "user": { "id": "u1" } });

                (0..100).all(|_| {
                    ability.test(&read, None)
                        && ability.test(&can("update", "post"), Some(&context))
                        && !ability.test(&can("delete", "user"), None)
                })
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
