mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{ADMIN_PASSWORD, create_user, login, send, spawn_app};

/// Seeded menu ids from the initial migration: 1 = Administration group,
/// 5 = Departments leaf (/admin/master/department).
const DEPARTMENTS_MENU: i32 = 5;

async fn viewer_with_department_menu(
    app: &axum::Router,
    admin: &str,
    username: &str,
) -> (i32, i32) {
    let (status, _, body) = send(
        app,
        "POST",
        "/api/admin/master/role",
        Some(admin),
        Some(json!({"code": format!("VIEW_{username}"), "name": "Viewer"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let role_id = i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap();

    let (status, _, _) = send(
        app,
        "PUT",
        &format!("/api/admin/master/role/{role_id}/menus"),
        Some(admin),
        Some(json!({"menu_ids": [DEPARTMENTS_MENU]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let user_id = create_user(app, admin, username, "secret123").await;

    let (status, _, _) = send(
        app,
        "PUT",
        &format!("/api/admin/master/user/{user_id}/roles"),
        Some(admin),
        Some(json!({"role_ids": [role_id]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (user_id, role_id)
}

#[tokio::test]
async fn full_forest_contains_the_seeded_administration_tree() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, _, body) = send(&app, "GET", "/api/admin/master/tree-menu", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let forest = body["data"].as_array().unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0]["label"], "Administration");
    assert_eq!(forest[0]["children"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn per_user_projection_keeps_ancestors_and_prunes_the_rest() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    viewer_with_department_menu(&app, &admin, "carl").await;
    let carl = login(&app, "carl", "secret123").await;

    let (status, _, body) = send(
        &app,
        "GET",
        "/api/admin/master/tree-menu/user",
        Some(&carl),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let forest = body["data"].as_array().unwrap();
    assert_eq!(forest.len(), 1, "group parent must be retained");
    assert_eq!(forest[0]["label"], "Administration");

    let children = forest[0]["children"].as_array().unwrap();
    assert_eq!(children.len(), 1, "unreachable leaves must be pruned");
    assert_eq!(children[0]["label"], "Departments");
}

#[tokio::test]
async fn projection_for_a_user_with_no_roles_is_empty() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    create_user(&app, &admin, "norole", "secret123").await;
    let norole = login(&app, "norole", "secret123").await;

    let (status, _, body) = send(
        &app,
        "GET",
        "/api/admin/master/tree-menu/user",
        Some(&norole),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn menu_link_grants_read_but_writes_need_flags() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (_, role_id) = viewer_with_department_menu(&app, &admin, "carl").await;
    let carl = login(&app, "carl", "secret123").await;

    // Read works through the bare role→menu link
    let (status, _, _) = send(
        &app,
        "GET",
        "/api/admin/master/department",
        Some(&carl),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Create is forbidden without the flag
    let (status, _, _) = send(
        &app,
        "POST",
        "/api/admin/master/department",
        Some(&carl),
        Some(json!({"code": "ASM", "name": "Assembly"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Grant may_create and retry
    let (status, _, _) = send(
        &app,
        "POST",
        "/api/admin/role-permission",
        Some(&admin),
        Some(json!({
            "role_id": role_id,
            "menu_id": DEPARTMENTS_MENU,
            "may_create": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/admin/master/department",
        Some(&carl),
        Some(json!({"code": "ASM", "name": "Assembly"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let dept_id = body["data"]["id"].as_i64().unwrap();

    // Delete still lacks its flag
    let (status, _, _) = send(
        &app,
        "DELETE",
        &format!("/api/admin/master/department/{dept_id}"),
        Some(&carl),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn user_without_menu_link_is_forbidden_even_for_reads() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    create_user(&app, &admin, "outsider", "secret123").await;
    let outsider = login(&app, "outsider", "secret123").await;

    let (status, _, _) = send(
        &app,
        "GET",
        "/api/admin/master/department",
        Some(&outsider),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn replace_sets_are_idempotent() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (user_id, role_id) = viewer_with_department_menu(&app, &admin, "carl").await;
    let carl = login(&app, "carl", "secret123").await;

    let tree_before = send(
        &app,
        "GET",
        "/api/admin/master/tree-menu/user",
        Some(&carl),
        None,
    )
    .await
    .2;

    // Applying the same desired sets again must change nothing
    let (status, _, _) = send(
        &app,
        "PUT",
        &format!("/api/admin/master/user/{user_id}/roles"),
        Some(&admin),
        Some(json!({"role_ids": [role_id]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &app,
        "PUT",
        &format!("/api/admin/master/role/{role_id}/menus"),
        Some(&admin),
        Some(json!({"menu_ids": [DEPARTMENTS_MENU]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let tree_after = send(
        &app,
        "GET",
        "/api/admin/master/tree-menu/user",
        Some(&carl),
        None,
    )
    .await
    .2;

    assert_eq!(tree_before, tree_after);
}

#[tokio::test]
async fn replacing_with_an_empty_set_revokes_access() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (user_id, _) = viewer_with_department_menu(&app, &admin, "carl").await;
    let carl = login(&app, "carl", "secret123").await;

    let (status, _, _) = send(
        &app,
        "PUT",
        &format!("/api/admin/master/user/{user_id}/roles"),
        Some(&admin),
        Some(json!({"role_ids": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &app,
        "GET",
        "/api/admin/master/department",
        Some(&carl),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn role_permission_tree_reflects_links_and_flags() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (_, role_id) = viewer_with_department_menu(&app, &admin, "carl").await;

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/admin/role-permission",
        Some(&admin),
        Some(json!({
            "role_id": role_id,
            "menu_id": DEPARTMENTS_MENU,
            "may_create": true,
            "may_update": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(
        &app,
        "GET",
        &format!("/api/admin/role-permission/{role_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let root = &body["data"][0];
    let departments = root["children"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["label"] == "Departments")
        .unwrap();
    assert_eq!(departments["linked"], true);
    assert_eq!(departments["may_create"], true);
    assert_eq!(departments["may_update"], true);
    assert_eq!(departments["may_delete"], false);

    let users_leaf = root["children"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["label"] == "Users")
        .unwrap();
    assert_eq!(users_leaf["linked"], false);
}

#[tokio::test]
async fn duplicate_role_code_is_a_conflict() {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/admin/master/role",
        Some(&admin),
        Some(json!({"code": "ADMIN", "name": "Shadow admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
