//! Property tests for the permission encoding and flatten/group transforms

use cretoai_ability::{
    flatten_permissions, group_permissions, modify_permission, parse_permission_string,
    stringify_permission, FlattenOptions, GroupOptions, ModifyOptions, Permission,
    PermissionGroup, PermissionItem, PermissionType, Scope,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_name(), 1..3)
}

fn arb_scope() -> impl Strategy<Value = Option<Scope>> {
    let nested = prop::collection::vec(("[a-z]{1,5}", "[a-z0-9]{1,4}|\\*"), 1..3).prop_map(|pairs| {
        let segments: Vec<String> = pairs
            .into_iter()
            .flat_map(|(kind, id)| [kind, id])
            .collect();
        Scope::new(&segments.join(":")).unwrap()
    });
    prop_oneof![
        2 => Just(None),
        1 => Just(Some(Scope::global())),
        3 => nested.prop_map(Some),
    ]
}

fn arb_conditions() -> impl Strategy<Value = Option<Map<String, Value>>> {
    prop::option::of(
        prop::collection::btree_map(
            "[a-z][a-zA-Z]{0,5}",
            prop_oneof![
                any::<bool>().prop_map(Value::Bool),
                (-1000i64..1000).prop_map(|n| json!(n)),
                "[a-z0-9 ]{0,6}".prop_map(Value::String),
            ],
            0..3,
        )
        .prop_map(|entries| entries.into_iter().collect::<Map<String, Value>>()),
    )
}

fn arb_permission() -> impl Strategy<Value = Permission> {
    (arb_names(), arb_names(), any::<bool>(), arb_conditions(), arb_scope()).prop_map(
        |(subject, action, denied, conditions, scope)| Permission {
            subject,
            action,
            kind: if denied {
                PermissionType::Cannot
            } else {
                PermissionType::Can
            },
            conditions,
            scope,
        },
    )
}

fn arb_items() -> impl Strategy<Value = Vec<PermissionItem>> {
    let leaf = arb_permission().prop_map(PermissionItem::from);
    let group = (prop::collection::vec(arb_permission(), 1..4), arb_conditions(), arb_scope()).prop_map(
        |(children, conditions, scope)| {
            PermissionItem::from(PermissionGroup {
                permissions: children.into_iter().map(PermissionItem::from).collect(),
                conditions,
                scope,
            })
        },
    );
    prop::collection::vec(prop_oneof![leaf, group], 0..6)
}

fn flatten(items: &[PermissionItem]) -> Vec<Permission> {
    flatten_permissions(items, &FlattenOptions::default()).unwrap()
}

/// Rendered leaves, sorted; grouping drops exact duplicates within a group
fn leaf_set(permissions: Vec<Permission>) -> Vec<String> {
    let mut rendered: Vec<String> = permissions.into_iter().map(|p| p.to_string()).collect();
    rendered.sort();
    rendered.dedup();
    rendered
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_string_round_trip(p in arb_permission()) {
        let decoded = parse_permission_string(&stringify_permission(&p)).unwrap();
        prop_assert_eq!(decoded, p);
    }

    #[test]
    fn test_flatten_is_idempotent(list in arb_items()) {
        let once = flatten(&list);
        let again: Vec<PermissionItem> = once.iter().cloned().map(PermissionItem::from).collect();
        prop_assert_eq!(flatten(&again), once);
    }

    #[test]
    fn test_flatten_group_duality(list in arb_items()) {
        let groups: Vec<PermissionItem> = group_permissions(&list, &GroupOptions::default())
            .unwrap()
            .into_iter()
            .map(PermissionItem::from)
            .collect();

        prop_assert_eq!(leaf_set(flatten(&groups)), leaf_set(flatten(&list)));
    }

    #[test]
    fn test_grouping_strips_keyed_parts(list in prop::collection::vec(arb_permission(), 0..8)) {
        let input: Vec<PermissionItem> = list.into_iter().map(PermissionItem::from).collect();
        let groups = group_permissions(&input, &GroupOptions::default()).unwrap();

        for group in &groups {
            for item in &group.permissions {
                let PermissionItem::Leaf(p) = item else {
                    return Err(TestCaseError::fail("expected only leaves"));
                };
                prop_assert!(p.scope.is_none());
                prop_assert!(p.conditions.is_none());
            }
        }
    }
}

#[test]
fn test_flatten_applies_options_once() {
    let group = PermissionGroup::new(vec!["user:read{orgId:'2'}".into()])
        .in_scope("app:1")
        .unwrap();
    let options = FlattenOptions::new()
        .with_scope_prefix(Scope::new("org:1").unwrap())
        .with_additional_conditions(
            json!({ "orgId": "1", "active": true })
                .as_object()
                .cloned()
                .unwrap(),
        );

    let flat = flatten_permissions(&[group.into()], &options).unwrap();
    assert_eq!(flat.len(), 1);
    assert_eq!(flat[0].scope, Some(Scope::new("org:1:app:1").unwrap()));
    assert_eq!(
        Value::Object(flat[0].conditions.clone().unwrap()),
        json!({ "orgId": "2", "active": true })
    );
}

#[test]
fn test_modify_permission_without_own_scope() {
    let p = parse_permission_string("user:read").unwrap();
    let options = ModifyOptions::new().with_scope_prefix(Scope::new("org:5").unwrap());

    let modified = modify_permission(&p, &options);
    assert_eq!(modified.to_string(), "org:5:user:read");
    assert_eq!(p.to_string(), "user:read");
}

#[test]
fn test_group_ignore_options() {
    let input: Vec<PermissionItem> = vec![
        "org:1:user:read{a:1}".into(),
        "org:2:user:read{a:1}".into(),
    ];

    let by_conditions = group_permissions(
        &input,
        &GroupOptions {
            ignore_scope: true,
            ignore_conditions: false,
        },
    )
    .unwrap();
    assert_eq!(by_conditions.len(), 1);
    assert_eq!(by_conditions[0].permissions.len(), 2);

    let by_nothing = group_permissions(
        &input,
        &GroupOptions {
            ignore_scope: true,
            ignore_conditions: true,
        },
    )
    .unwrap();
    assert_eq!(by_nothing.len(), 1);
    assert!(by_nothing[0].scope.is_none() && by_nothing[0].conditions.is_none());
}
