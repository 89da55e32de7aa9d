//! End-to-end tests against a running server.

use account_service::config::{RuleConfig, ServiceConfig, UserConfig};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

mod common;

#[tokio::test]
async fn test_get_account_as_user() {
    let service = common::start_service(ServiceConfig::default()).await;

    let res = service.get("/accounts/0", "user").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], 0);
    assert_eq!(body["name"], "John Doe");
    assert_eq!(body["number"], "1234567890");
    assert_eq!(body["beneficiaries"].as_array().unwrap().len(), 2);
    assert_eq!(body["beneficiaries"][0]["allocationPercentage"], 0.5);
}

#[tokio::test]
async fn test_create_account_returns_location() {
    let mut config = ServiceConfig::default();
    config.store.first_id = 20;
    let service = common::start_service(config).await;

    let res = service
        .post("/accounts", "admin")
        .json(&json!({"number": "1234123412341234", "name": "Jane Smith", "beneficiaries": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["location"], "/accounts/21");

    let created: Value = service
        .get("/accounts/21", "user")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created["name"], "Jane Smith");

    // USER cannot create.
    let res = service
        .post("/accounts", "user")
        .json(&json!({"number": "1", "name": "X"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_number_is_rejected() {
    let service = common::start_service(ServiceConfig::default()).await;
    let res = service
        .post("/accounts", "admin")
        .json(&json!({"number": "1234567890", "name": "Someone Else"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_beneficiary_is_404() {
    let service = common::start_service(ServiceConfig::default()).await;

    let res = service
        .get("/accounts/0/beneficiaries/Nobody", "user")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "Not Found");

    let res = service.get("/accounts/99", "user").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_as_user_is_forbidden() {
    let service = common::start_service(ServiceConfig::default()).await;

    let res = service
        .delete("/accounts/0/beneficiaries/Junior%20Doe", "user")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = service
        .delete("/accounts/0/beneficiaries/Junior%20Doe", "admin")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: Value = service
        .get("/accounts/0", "user")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["beneficiaries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_counter_counts_each_call() {
    let service = common::start_service(ServiceConfig::default()).await;
    let before = service.list_counter.count();

    for _ in 0..3 {
        let res = service.get("/accounts", "user").send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let accounts: Vec<Value> = res.json().await.unwrap();
        assert_eq!(accounts.len(), 1);
    }

    assert_eq!(service.list_counter.count(), before + 3);
}

#[tokio::test]
async fn test_authentication_failures() {
    let service = common::start_service(ServiceConfig::default()).await;

    let res = service.client.get(service.url("/accounts")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()["www-authenticate"], "Basic realm=\"accounts\"");

    let res = service
        .client
        .get(service.url("/accounts"))
        .basic_auth("user", Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_paths_without_rules_are_denied() {
    let service = common::start_service(ServiceConfig::default()).await;
    for path in ["/reports", "/accounts-archive", "/"] {
        let res = service.get(path, "superadmin").send().await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{path}");
    }
}

#[tokio::test]
async fn test_beneficiary_lifecycle() {
    let service = common::start_service(ServiceConfig::default()).await;

    // Make room, then add.
    let res = service
        .put("/accounts/0/beneficiaries", "admin")
        .json(&json!({"Jane Doe": "0.4", "Junior Doe": "0.5"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = service
        .post("/accounts/0/beneficiaries", "admin")
        .body("Kate Doe")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    assert_eq!(location, "/accounts/0/beneficiaries/Kate%20Doe");

    let kate: Value = service.get(&location, "user").send().await.unwrap().json().await.unwrap();
    assert_eq!(kate["allocationPercentage"], 0.0);

    // Over 100% is refused and changes nothing.
    let res = service
        .put("/accounts/0/beneficiaries", "admin")
        .json(&json!({"Kate Doe": 0.2}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = service
        .put("/accounts/0/beneficiaries", "admin")
        .json(&json!({"Kate Doe": 0.1}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = service.delete(&location, "superadmin").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = service.get(&location, "user").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_is_public() {
    let service = common::start_service(ServiceConfig::default()).await;

    let res = service
        .client
        .get(service.url("/health"))
        .header("x-request-id", "probe-1")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "probe-1");

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "UP");
    assert_eq!(body["details"]["count"], 1);

    // Only GET is open.
    let res = service.client.post(service.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_closed_by_rule_table() {
    let mut config = ServiceConfig::default();
    config.security.rules = Some(vec![RuleConfig {
        method: "GET".into(),
        path: "/accounts/**".into(),
        roles: vec!["USER".into()],
        anonymous: false,
    }]);
    let service = common::start_service(config).await;

    let res = service.client.get(service.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = service.get("/health", "superadmin").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = service.get("/accounts/0", "user").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_with_broken_beneficiaries_is_conflict() {
    let service = common::start_service(ServiceConfig::default()).await;

    for beneficiaries in [
        json!([{"name": "A", "allocationPercentage": 0.1}, {"name": "A", "allocationPercentage": 0.1}]),
        json!([{"name": "A", "allocationPercentage": 0.6}, {"name": "B", "allocationPercentage": 0.6}]),
    ] {
        let res = service
            .post("/accounts", "admin")
            .json(&json!({"number": "555", "name": "X", "beneficiaries": beneficiaries}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }
}

#[tokio::test]
async fn test_user_registry_reload() {
    let service = common::start_service(ServiceConfig::default()).await;

    let res = service.get("/authorities", "ops").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let mut config = ServiceConfig::default();
    config.security.users = vec![UserConfig {
        username: "ops".into(),
        password: Some("ops".into()),
        password_sha256: None,
        roles: vec!["USER".into()],
    }];
    service.updates.send(config).unwrap();

    let mut status = StatusCode::UNAUTHORIZED;
    for _ in 0..50 {
        status = service.get("/authorities", "ops").send().await.unwrap().status();
        if status == StatusCode::OK {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, StatusCode::OK);

    let res = service.get("/authorities", "user").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
