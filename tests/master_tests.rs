mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{ADMIN_PASSWORD, login, send, spawn_app};

#[tokio::test]
async fn department_crud_round_trip() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/admin/master/department",
        Some(&admin),
        Some(json!({"code": "ASM", "name": "Assembly"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], 201);
    let id = body["data"]["id"].as_i64().unwrap();

    // Create-then-get returns the posted fields verbatim
    let (status, _, body) = send(
        &app,
        "GET",
        &format!("/api/admin/master/department/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["code"], "ASM");
    assert_eq!(body["data"]["name"], "Assembly");

    let (status, _, _) = send(
        &app,
        "PUT",
        &format!("/api/admin/master/department/{id}"),
        Some(&admin),
        Some(json!({"code": "ASM", "name": "Final Assembly"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = send(
        &app,
        "GET",
        &format!("/api/admin/master/department/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body["data"]["name"], "Final Assembly");

    let (status, _, _) = send(
        &app,
        "DELETE",
        &format!("/api/admin/master/department/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &app,
        "GET",
        &format!("/api/admin/master/department/{id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_department_code_is_a_conflict() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/admin/master/department",
        Some(&admin),
        Some(json!({"code": "QC", "name": "Quality Control"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/admin/master/department",
        Some(&admin),
        Some(json!({"code": "QC", "name": "Quality Checks"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn list_pagination_reports_bounds_and_next_page() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    for (code, name) in [("A", "Alpha"), ("B", "Bravo"), ("C", "Charlie")] {
        let (status, _, _) = send(
            &app,
            "POST",
            "/api/admin/master/department",
            Some(&admin),
            Some(json!({"code": code, "name": name})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _, body) = send(
        &app,
        "GET",
        "/api/admin/master/department?page=1&rows=2",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["current_page"], 1);
    assert_eq!(body["pagination"]["next_page"], 2);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["pagination"]["rows_per_page"], 2);
    assert_eq!(body["pagination"]["total_rows"], 3);
    assert_eq!(body["pagination"]["from"], 1);
    assert_eq!(body["pagination"]["to"], 2);

    let (_, _, body) = send(
        &app,
        "GET",
        "/api/admin/master/department?page=2&rows=2",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["next_page"], serde_json::Value::Null);
    assert_eq!(body["pagination"]["from"], 3);
    assert_eq!(body["pagination"]["to"], 3);
}

#[tokio::test]
async fn search_filters_across_configured_fields() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    for (code, name) in [("ASM", "Assembly"), ("QC", "Quality Control")] {
        send(
            &app,
            "POST",
            "/api/admin/master/department",
            Some(&admin),
            Some(json!({"code": code, "name": name})),
        )
        .await;
    }

    let (status, _, body) = send(
        &app,
        "GET",
        "/api/admin/master/department?search=quality",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["code"], "QC");
}

#[tokio::test]
async fn sort_direction_flips_the_order() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    for (code, name) in [("A", "Alpha"), ("B", "Bravo")] {
        send(
            &app,
            "POST",
            "/api/admin/master/department",
            Some(&admin),
            Some(json!({"code": code, "name": name})),
        )
        .await;
    }

    let (_, _, body) = send(
        &app,
        "GET",
        "/api/admin/master/department?sortBy=code&sortDirection=false",
        Some(&admin),
        None,
    )
    .await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["code"], "B");

    let (_, _, body) = send(
        &app,
        "GET",
        "/api/admin/master/department?sortBy=code&sortDirection=true",
        Some(&admin),
        None,
    )
    .await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["code"], "A");
}

#[tokio::test]
async fn machine_and_currency_templates_behave_alike() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/admin/master/machine",
        Some(&admin),
        Some(json!({"code": "CNC-01", "name": "CNC Mill", "location": "Hall A"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["is_active"], true);

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/admin/master/currency",
        Some(&admin),
        Some(json!({"code": "EUR", "name": "Euro", "symbol": "€"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, _, body) = send(
        &app,
        "GET",
        "/api/admin/master/currency",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total_rows"], 1);
    assert_eq!(body["items"][0]["code"], "EUR");
}

#[tokio::test]
async fn writes_land_in_the_activity_log() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    send(
        &app,
        "POST",
        "/api/admin/master/department",
        Some(&admin),
        Some(json!({"code": "ASM", "name": "Assembly"})),
    )
    .await;

    let (status, _, body) = send(
        &app,
        "GET",
        "/api/admin/activity-log",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let items = body["items"].as_array().unwrap();
    assert!(
        items
            .iter()
            .any(|i| i["action"] == "create" && i["entity"] == "department")
    );
    assert_eq!(items[0]["user_id"], 1);
}

#[tokio::test]
async fn list_endpoints_require_authentication() {
    let (app, _) = spawn_app().await;

    let (status, _, _) = send(&app, "GET", "/api/admin/master/department", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
