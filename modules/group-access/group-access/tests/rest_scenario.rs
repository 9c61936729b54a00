#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end scenario over the in-memory store.
//!
//! A minimal request pipeline plays the framework's part: principal loading,
//! ACL evaluation through the role registry, access hooks on queries and
//! before-save hooks on writes. Stores `A` and `B` are the groups.

use std::sync::Arc;

use access_security::{Filter, Record, ScopeValue};
use group_access::{Collaborators, GroupAccess, GroupAccessConfig};
use group_access_sdk::{
    AccessContext, AccessToken, HookRegistry, ModelDefinition, Query, QueryKind, Relation,
    RequestScope, RoleRegistry, SaveContext,
};
use serde_json::json;
use static_group_plugin::Service;

const READ: &[&str] = &["$group:admin", "$group:manager", "$group:member"];
const WRITE: &[&str] = &["$group:admin", "$group:manager"];
const DELETE: &[&str] = &["$group:admin"];

#[derive(Debug, PartialEq, Eq)]
enum Status {
    Unauthorized,
    NotFound,
}

struct App {
    store: Arc<Service>,
    access: GroupAccess,
    roles: RoleRegistry,
    hooks: HookRegistry,
}

fn rec(value: serde_json::Value) -> Record {
    serde_json::from_value(value).unwrap()
}

fn models() -> Vec<ModelDefinition> {
    vec![
        ModelDefinition::new("User"),
        ModelDefinition::new("Store").relation(Relation::has_many("invoices", "Invoice")),
        ModelDefinition::new("Invoice")
            .relation(Relation::belongs_to("store", "Store"))
            .relation(Relation::has_many("transactions", "Transaction")),
        ModelDefinition::new("Transaction").relation(Relation::belongs_to("invoice", "Invoice")),
        ModelDefinition::new("StoreUser")
            .relation(Relation::belongs_to("store", "Store"))
            .relation(Relation::belongs_to("user", "User")),
    ]
}

fn seed(store: &Service) {
    store.insert_all(
        "User",
        [
            rec(json!({ "id": "generalUser" })),
            rec(json!({ "id": "storeMemberA", "storeId": "A" })),
            rec(json!({ "id": "storeManagerA", "storeId": "A" })),
            rec(json!({ "id": "storeAdminA", "storeId": "A" })),
        ],
    );
    store.insert_all(
        "Store",
        [
            rec(json!({ "id": "A", "name": "Store A" })),
            rec(json!({ "id": "B", "name": "Store B" })),
        ],
    );
    store.insert_all(
        "Invoice",
        [
            rec(json!({ "id": 1, "storeId": "A", "invoiceNumber": 1, "status": "active" })),
            rec(json!({ "id": 2, "storeId": "B", "invoiceNumber": 2, "status": "active" })),
            rec(json!({ "id": 3, "storeId": "A", "invoiceNumber": 3, "status": "inactive" })),
        ],
    );
    store.insert_all(
        "Transaction",
        [
            rec(json!({ "id": 1, "invoiceId": 1 })),
            rec(json!({ "id": 2, "invoiceId": 1 })),
            rec(json!({ "id": 3, "invoiceId": 2 })),
        ],
    );
    store.insert_all(
        "StoreUser",
        [
            rec(json!({ "userId": "storeMemberA", "storeId": "A", "role": "member" })),
            rec(json!({ "userId": "storeManagerA", "storeId": "A", "role": "manager" })),
            rec(json!({ "userId": "storeAdminA", "storeId": "A", "role": "admin" })),
        ],
    );
}

impl App {
    /// The fixture with default settings: static operations need a group.
    fn strict() -> Self {
        Self::with_static_passthrough(false)
    }

    /// The fixture with `apply_to_static` enabled.
    fn permissive() -> Self {
        Self::with_static_passthrough(true)
    }

    fn with_static_passthrough(apply_to_static: bool) -> Self {
        let store = Arc::new(Service::new());
        seed(&store);

        let config = GroupAccessConfig {
            group_model: "Store".to_owned(),
            group_access_model: "StoreUser".to_owned(),
            group_roles: READ.iter().map(|r| (*r).to_owned()).collect(),
            apply_to_static,
            ..GroupAccessConfig::default()
        };
        let access =
            GroupAccess::setup(&config, Collaborators::single(store.clone(), models())).unwrap();
        let roles = RoleRegistry::new();
        let hooks = HookRegistry::new();
        access.register(&roles, &hooks);

        Self {
            store,
            access,
            roles,
            hooks,
        }
    }

    async fn login(&self, user: Option<&str>) -> RequestScope {
        let token = user.map(|u| AccessToken::new(format!("token-{u}"), u));
        self.access
            .principal_loader()
            .load(token.as_ref())
            .await
            .unwrap()
    }

    async fn authorize(
        &self,
        scope: &RequestScope,
        allowed: &[&str],
        ctx: &AccessContext,
    ) -> Result<(), Status> {
        if !scope.is_authenticated() {
            return Err(Status::Unauthorized);
        }
        for role in allowed {
            if self.roles.resolve(role, scope, ctx).await {
                return Ok(());
            }
        }
        Err(Status::Unauthorized)
    }

    async fn query(
        &self,
        user: Option<&str>,
        model: &str,
        kind: QueryKind,
        filter: Option<Filter>,
    ) -> Result<Vec<Record>, Status> {
        let scope = self.login(user).await;
        let mut ctx = AccessContext::new(model, "find");
        if let Some(filter) = &filter {
            ctx = ctx.with_filter(filter.clone());
        }
        self.authorize(&scope, READ, &ctx).await?;

        let mut query = Query::new(model, kind);
        query.filter = filter;
        self.hooks.run_access(&scope, &mut query).await.unwrap();
        Ok(self.store.find(model, query.filter.as_ref()).unwrap())
    }

    async fn find(
        &self,
        user: &str,
        model: &str,
        filter: Option<Filter>,
    ) -> Result<Vec<Record>, Status> {
        self.query(Some(user), model, QueryKind::Find, filter).await
    }

    async fn count(&self, user: &str, filter: Filter) -> Result<usize, Status> {
        self.query(Some(user), "Invoice", QueryKind::Count, Some(filter))
            .await
            .map(|rows| rows.len())
    }

    async fn find_by_id(
        &self,
        user: Option<&str>,
        model: &str,
        id: impl Into<ScopeValue>,
    ) -> Result<Record, Status> {
        let id = id.into();
        let scope = self.login(user).await;
        let ctx = AccessContext::new(model, "findById").with_id(id.clone());
        self.authorize(&scope, READ, &ctx).await?;

        let mut query = Query::find(model).with_filter(Filter::eq("id", id));
        self.hooks.run_access(&scope, &mut query).await.unwrap();
        self.store
            .find(model, query.filter.as_ref())
            .unwrap()
            .into_iter()
            .next()
            .ok_or(Status::NotFound)
    }

    async fn invoice_transactions(&self, user: &str, invoice: i64) -> Result<Vec<Record>, Status> {
        let scope = self.login(Some(user)).await;
        let ctx = AccessContext::new("Invoice", "__get__transactions").with_id(invoice);
        self.authorize(&scope, READ, &ctx).await?;

        let mut query = Query::find("Transaction").with_filter(Filter::eq("invoiceId", invoice));
        self.hooks.run_access(&scope, &mut query).await.unwrap();
        Ok(self.store.find("Transaction", query.filter.as_ref()).unwrap())
    }

    async fn create(&self, user: &str, model: &str, payload: Record) -> Result<Record, Status> {
        let scope = self.login(Some(user)).await;
        let ctx = AccessContext::new(model, "create").with_payload(payload.clone());
        self.authorize(&scope, WRITE, &ctx).await?;

        let mut save = SaveContext::create(model, payload);
        self.hooks.run_before_save(&scope, &mut save).await.unwrap();
        Ok(self.store.save(model, save.instance).unwrap())
    }

    async fn update(&self, user: &str, id: i64, patch: Record) -> Result<Record, Status> {
        let scope = self.login(Some(user)).await;
        let ctx = AccessContext::new("Invoice", "patchAttributes")
            .with_id(id)
            .with_payload(patch.clone());
        self.authorize(&scope, WRITE, &ctx).await?;

        let mut instance = self.store.find_by_id("Invoice", &id.into()).unwrap().unwrap();
        instance.extend(patch);
        let mut save = SaveContext::update("Invoice", instance);
        self.hooks.run_before_save(&scope, &mut save).await.unwrap();
        Ok(self.store.save("Invoice", save.instance).unwrap())
    }

    async fn delete(&self, user: &str, id: i64) -> Result<(), Status> {
        let scope = self.login(Some(user)).await;
        let ctx = AccessContext::new("Invoice", "deleteById").with_id(id);
        self.authorize(&scope, DELETE, &ctx).await
    }
}

fn invoice_numbers(rows: &[Record]) -> Vec<i64> {
    rows.iter()
        .map(|r| match r["invoiceNumber"] {
            ScopeValue::Int(n) => n,
            ref other => panic!("unexpected invoice number {other}"),
        })
        .collect()
}

/// (user, can read, can write, can delete)
const USERS: &[(&str, bool, bool, bool)] = &[
    ("generalUser", false, false, false),
    ("storeMemberA", true, false, false),
    ("storeManagerA", true, true, false),
    ("storeAdminA", true, true, true),
];

#[test]
fn discovers_group_content_models() {
    let app = App::permissive();
    assert_eq!(
        app.access.registry().group_content_models(),
        ["Invoice", "Transaction"]
    );
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let app = App::permissive();
    assert_eq!(
        app.query(None, "Invoice", QueryKind::Find, None).await,
        Err(Status::Unauthorized)
    );
    assert_eq!(
        app.find_by_id(None, "Invoice", 1_i64).await,
        Err(Status::Unauthorized)
    );
}

#[tokio::test]
async fn group_model_is_scoped() {
    let app = App::permissive();
    for &(user, read, _, _) in USERS {
        let own = app.find_by_id(Some(user), "Store", "A").await;
        if read {
            assert_eq!(own.unwrap()["name"], ScopeValue::from("Store A"), "{user}");
        } else {
            assert_eq!(own, Err(Status::Unauthorized), "{user}");
        }
        assert_eq!(
            app.find_by_id(Some(user), "Store", "B").await,
            Err(Status::Unauthorized),
            "{user}"
        );
    }
}

#[tokio::test]
async fn find_by_id_follows_membership() {
    let app = App::permissive();
    for &(user, read, _, _) in USERS {
        let own = app.find_by_id(Some(user), "Invoice", 1_i64).await;
        if read {
            assert_eq!(invoice_numbers(&[own.unwrap()]), [1], "{user}");
        } else {
            assert_eq!(own, Err(Status::Unauthorized), "{user}");
        }
        assert_eq!(
            app.find_by_id(Some(user), "Invoice", 2_i64).await,
            Err(Status::Unauthorized),
            "{user}"
        );
        assert_eq!(
            app.find_by_id(Some(user), "Invoice", "unknown-id").await,
            Err(Status::NotFound),
            "{user}"
        );
    }
}

#[tokio::test]
async fn lists_are_limited_to_own_groups() {
    let app = App::permissive();
    for &(user, read, _, _) in USERS {
        let expected: &[i64] = if read { &[1, 3] } else { &[] };

        let all = app.find(user, "Invoice", None).await.unwrap();
        assert_eq!(invoice_numbers(&all), expected, "{user}");

        let other_number = app
            .find(user, "Invoice", Some(Filter::eq("invoiceNumber", 2_i64)))
            .await
            .unwrap();
        assert!(other_number.is_empty(), "{user}");
    }
}

#[tokio::test]
async fn listing_by_group_requires_membership_of_that_group() {
    let app = App::permissive();
    for &(user, read, _, _) in USERS {
        let by_group = app
            .find(user, "Invoice", Some(Filter::eq("storeId", "A")))
            .await;
        if read {
            assert_eq!(invoice_numbers(&by_group.unwrap()), [1, 3], "{user}");
        } else {
            assert_eq!(by_group, Err(Status::Unauthorized), "{user}");
        }

        assert_eq!(
            app.find(user, "Invoice", Some(Filter::eq("storeId", "B"))).await,
            Err(Status::Unauthorized),
            "{user}"
        );
    }
}

#[tokio::test]
async fn counts_respect_caller_filters() {
    let app = App::permissive();
    let complex = Filter::all([
        Filter::eq("status", "active"),
        Filter::r#in("storeId", ["A", "B"]),
    ]);
    for &(user, read, _, _) in USERS {
        let n = usize::from(read);
        let own = app.count(user, Filter::eq("storeId", "A")).await;
        if read {
            assert_eq!(own, Ok(2), "{user}");
        } else {
            assert_eq!(own, Err(Status::Unauthorized), "{user}");
        }
        assert_eq!(
            app.count(user, Filter::eq("storeId", "B")).await,
            Err(Status::Unauthorized),
            "{user}"
        );
        assert_eq!(
            app.count(user, Filter::eq("invoiceNumber", 1_i64)).await,
            Ok(n),
            "{user}"
        );
        // No single group named: passes through, then gets scoped.
        assert_eq!(app.count(user, complex.clone()).await, Ok(n), "{user}");
    }
}

#[tokio::test]
async fn related_content_follows_the_parent_chain() {
    let app = App::permissive();
    for &(user, read, _, _) in USERS {
        let related = app.invoice_transactions(user, 1).await;
        if read {
            let ids: Vec<ScopeValue> = related.unwrap().iter().map(|t| t["id"].clone()).collect();
            assert_eq!(ids, [ScopeValue::Int(1), ScopeValue::Int(2)], "{user}");
        } else {
            assert_eq!(related, Err(Status::Unauthorized), "{user}");
        }
        // Transaction 3 belongs to invoice 2 in store B.
        assert_eq!(
            app.find_by_id(Some(user), "Transaction", 3_i64).await,
            Err(Status::Unauthorized),
            "{user}"
        );
    }
}

#[tokio::test]
async fn create_requires_membership_in_target_group() {
    let app = App::permissive();
    for &(user, _, write, _) in USERS {
        let created = app
            .create(user, "Invoice", rec(json!({ "storeId": "A", "invoiceNumber": 100 })))
            .await;
        if write {
            let created = created.unwrap();
            assert_eq!(invoice_numbers(&[created.clone()]), [100], "{user}");
            assert_eq!(created["storeId"], ScopeValue::from("A"), "{user}");
        } else {
            assert_eq!(created, Err(Status::Unauthorized), "{user}");
        }

        assert_eq!(
            app.create(user, "Invoice", rec(json!({ "storeId": "B", "invoiceNumber": 101 })))
                .await,
            Err(Status::Unauthorized),
            "{user}"
        );
    }
}

#[tokio::test]
async fn create_without_group_is_stamped_from_principal() {
    let app = App::permissive();
    let created = app
        .create("storeAdminA", "Invoice", rec(json!({ "invoiceNumber": 200 })))
        .await
        .unwrap();
    assert_eq!(created["storeId"], ScopeValue::from("A"));

    let listed = app.find("storeMemberA", "Invoice", None).await.unwrap();
    assert_eq!(invoice_numbers(&listed), [1, 3, 200]);
}

#[tokio::test]
async fn updates_cannot_move_content_to_foreign_group() {
    let app = App::permissive();
    for &(user, _, write, _) in USERS {
        let same_group = app
            .update(user, 1, rec(json!({ "status": "paid" })))
            .await;
        assert_eq!(same_group.is_ok(), write, "{user}");

        assert_eq!(
            app.update(user, 1, rec(json!({ "storeId": "B" }))).await,
            Err(Status::Unauthorized),
            "{user}"
        );
        assert_eq!(
            app.update(user, 2, rec(json!({ "status": "paid" }))).await,
            Err(Status::Unauthorized),
            "{user}"
        );
    }
    let unchanged = app.store.find_by_id("Invoice", &ScopeValue::Int(1)).unwrap().unwrap();
    assert_eq!(unchanged["storeId"], ScopeValue::from("A"));
}

#[tokio::test]
async fn only_admins_delete() {
    let app = App::permissive();
    for &(user, _, _, delete) in USERS {
        assert_eq!(app.delete(user, 3).await.is_ok(), delete, "{user}");
        assert_eq!(app.delete(user, 2).await, Err(Status::Unauthorized), "{user}");
    }
}

#[tokio::test]
async fn membership_store_outage_denies() {
    let app = App::permissive();
    let scope = app.login(Some("storeAdminA")).await;
    app.store.fail_on("StoreUser");

    let ctx = AccessContext::new("Invoice", "findById").with_id(1_i64);
    assert_eq!(
        app.authorize(&scope, READ, &ctx).await,
        Err(Status::Unauthorized)
    );
    assert!(!scope.group_acl_applied());

    app.store.recover("StoreUser");
    assert_eq!(app.authorize(&scope, READ, &ctx).await, Ok(()));
}

#[tokio::test]
async fn unknown_token_user_fails_to_load() {
    let app = App::permissive();
    let token = AccessToken::new("token-ghost".to_owned(), "ghost");
    let err = app
        .access
        .principal_loader()
        .load(Some(&token))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("no user with this access token was found"));
}

#[tokio::test]
async fn strict_mode_reads_follow_membership() {
    let app = App::strict();
    assert_eq!(
        invoice_numbers(&[app.find_by_id(Some("storeAdminA"), "Invoice", 1_i64).await.unwrap()]),
        [1]
    );
    assert_eq!(
        app.find_by_id(Some("storeAdminA"), "Invoice", 2_i64).await,
        Err(Status::Unauthorized)
    );

    for &(user, read, _, _) in USERS {
        let by_group = app
            .find(user, "Invoice", Some(Filter::eq("storeId", "A")))
            .await;
        if read {
            assert_eq!(invoice_numbers(&by_group.unwrap()), [1, 3], "{user}");
        } else {
            assert_eq!(by_group, Err(Status::Unauthorized), "{user}");
        }
        assert_eq!(
            app.find(user, "Invoice", Some(Filter::eq("storeId", "B"))).await,
            Err(Status::Unauthorized),
            "{user}"
        );
        // Nothing names a group.
        assert_eq!(app.find(user, "Invoice", None).await, Err(Status::Unauthorized), "{user}");
        assert_eq!(
            app.count(user, Filter::r#in("storeId", ["A", "B"])).await,
            Err(Status::Unauthorized),
            "{user}"
        );
    }
}

#[tokio::test]
async fn strict_mode_group_listing_is_scoped() {
    let app = App::strict();
    let scope = app.login(Some("storeAdminA")).await;
    let caller = Filter::all([Filter::eq("storeId", "A"), Filter::eq("status", "active")]);
    let ctx = AccessContext::new("Invoice", "find").with_filter(caller.clone());

    assert_eq!(app.authorize(&scope, READ, &ctx).await, Ok(()));
    assert!(scope.group_acl_applied());

    let mut query = Query::find("Invoice").with_filter(caller.clone());
    app.hooks.run_access(&scope, &mut query).await.unwrap();
    let filter = query.filter.unwrap();
    assert!(filter.contains_clause(&Filter::eq("storeId", "A")));
    assert!(filter.contains_clause(&Filter::eq("status", "active")));
    assert!(filter.contains_clause(&Filter::r#in("storeId", ["A"])));
    assert_eq!(
        invoice_numbers(&app.store.find("Invoice", Some(&filter)).unwrap()),
        [1]
    );
}

#[tokio::test]
async fn strict_mode_creation_needs_a_group() {
    let app = App::strict();
    assert_eq!(
        app.create(
            "storeAdminA",
            "Invoice",
            rec(json!({ "storeId": "B", "invoiceNumber": 300 }))
        )
        .await,
        Err(Status::Unauthorized)
    );
    assert_eq!(
        app.create("storeAdminA", "Invoice", rec(json!({ "invoiceNumber": 301 })))
            .await,
        Err(Status::Unauthorized)
    );
    let created = app
        .create(
            "storeManagerA",
            "Invoice",
            rec(json!({ "storeId": "A", "invoiceNumber": 302 })),
        )
        .await
        .unwrap();
    assert_eq!(created["id"], ScopeValue::Int(4));
}
