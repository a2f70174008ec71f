mod common;

use axum::{Router, http::StatusCode};
use serde_json::{Value, json};

use common::{ADMIN_PASSWORD, create_user, login, send, spawn_app};

/// Seeded Departments leaf menu (/admin/master/department).
const DEPARTMENTS_MENU: i32 = 5;
/// Seeded Machines leaf menu, used for misconfigured definitions.
const MACHINES_MENU: i32 = 6;

struct Workflow {
    app: Router,
    alice: String,
    bob: String,
    carol: String,
    bob_id: i32,
    carol_id: i32,
}

/// Definition on the Departments menu with levels [1: {bob}, 2: {carol}];
/// alice owns the records she submits.
async fn workflow_fixture() -> Workflow {
    let (app, _) = spawn_app().await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    create_user(&app, &admin, "alice", "secret123").await;
    let bob_id = create_user(&app, &admin, "bob", "secret123").await;
    let carol_id = create_user(&app, &admin, "carol", "secret123").await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/admin/approval",
        Some(&admin),
        Some(json!({"menu_id": DEPARTMENTS_MENU, "name": "Department approval"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let approval_id = body["data"]["id"].as_i64().unwrap();

    for (index, user_id) in [(1, bob_id), (2, carol_id)] {
        let (status, _, body) = send(
            &app,
            "POST",
            &format!("/api/admin/approval/{approval_id}/level"),
            Some(&admin),
            Some(json!({"level_index": index})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let level_id = body["data"]["id"].as_i64().unwrap();

        let (status, _, _) = send(
            &app,
            "PUT",
            &format!("/api/admin/approval/level/{level_id}/users"),
            Some(&admin),
            Some(json!({"user_ids": [user_id]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let alice = login(&app, "alice", "secret123").await;
    let bob = login(&app, "bob", "secret123").await;
    let carol = login(&app, "carol", "secret123").await;

    Workflow {
        app,
        alice,
        bob,
        carol,
        bob_id,
        carol_id,
    }
}

async fn transition(
    app: &Router,
    token: &str,
    ref_id: i32,
    action: &str,
) -> (StatusCode, Value) {
    let (status, _, body) = send(
        app,
        "POST",
        "/api/admin/approval-history",
        Some(token),
        Some(json!({
            "ref_table": "mst_department",
            "ref_id": ref_id,
            "menu_id": DEPARTMENTS_MENU,
            "action": action,
        })),
    )
    .await;
    (status, body)
}

async fn stream_state(app: &Router, token: &str, ref_id: i32) -> Value {
    let (status, _, body) = send(
        app,
        "GET",
        &format!("/api/admin/approval-history/mst_department/{ref_id}"),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"].clone()
}

#[tokio::test]
async fn happy_path_walks_both_levels_to_approved() {
    let wf = workflow_fixture().await;

    let (status, body) = transition(&wf.app, &wf.alice, 42, "submit").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["state"]["status"], "pending");
    assert_eq!(body["data"]["state"]["current_level"], 1);

    let (status, body) = transition(&wf.app, &wf.bob, 42, "approve").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["state"]["status"], "pending");
    assert_eq!(body["data"]["state"]["current_level"], 2);

    let (status, body) = transition(&wf.app, &wf.carol, 42, "approve").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["state"]["status"], "approved");

    let view = stream_state(&wf.app, &wf.alice, 42).await;
    assert_eq!(view["events"].as_array().unwrap().len(), 3);
    assert_eq!(view["max_level"], 2);
}

#[tokio::test]
async fn approver_of_a_later_level_cannot_jump_the_queue() {
    let wf = workflow_fixture().await;

    transition(&wf.app, &wf.alice, 7, "submit").await;

    // carol sits at level 2; the record is pending at level 1
    let (status, _) = transition(&wf.app, &wf.carol, 7, "approve").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The stream is unchanged
    let view = stream_state(&wf.app, &wf.alice, 7).await;
    assert_eq!(view["events"].as_array().unwrap().len(), 1);
    assert_eq!(view["state"]["current_level"], 1);
}

#[tokio::test]
async fn outsiders_cannot_approve_at_all() {
    let wf = workflow_fixture().await;

    transition(&wf.app, &wf.alice, 8, "submit").await;

    let (status, _) = transition(&wf.app, &wf.alice, 8, "approve").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reject_then_revise_then_resubmit_resets_the_chain() {
    let wf = workflow_fixture().await;

    transition(&wf.app, &wf.alice, 9, "submit").await;

    let (status, body) = transition(&wf.app, &wf.bob, 9, "reject").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"]["status"], "rejected");

    // Only the owner may revise
    let (status, _) = transition(&wf.app, &wf.carol, 9, "revise").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = transition(&wf.app, &wf.alice, 9, "revise").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"]["status"], "revising");

    let (status, body) = transition(&wf.app, &wf.alice, 9, "submit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"]["status"], "pending");
    assert_eq!(body["data"]["state"]["current_level"], 1);
}

#[tokio::test]
async fn losing_a_level_race_reads_as_stale_state() {
    let wf = workflow_fixture().await;

    transition(&wf.app, &wf.alice, 10, "submit").await;
    transition(&wf.app, &wf.bob, 10, "approve").await;

    // bob's second approve arrives after the level advanced past him
    let (status, body) = transition(&wf.app, &wf.bob, 10, "approve").await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    // Terminal records are stale for everyone
    transition(&wf.app, &wf.carol, 10, "approve").await;
    let (status, _) = transition(&wf.app, &wf.carol, 10, "approve").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn submit_is_rejected_while_a_stream_is_pending() {
    let wf = workflow_fixture().await;

    transition(&wf.app, &wf.alice, 11, "submit").await;

    let (status, _) = transition(&wf.app, &wf.alice, 11, "submit").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_original_submitter_may_resubmit() {
    let wf = workflow_fixture().await;

    transition(&wf.app, &wf.alice, 12, "submit").await;
    transition(&wf.app, &wf.bob, 12, "reject").await;
    transition(&wf.app, &wf.alice, 12, "revise").await;

    // carol trying to hijack the revised record
    let (status, _) = transition(&wf.app, &wf.carol, 12, "submit").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn notifications_follow_the_pending_level() {
    let wf = workflow_fixture().await;

    transition(&wf.app, &wf.alice, 13, "submit").await;

    let (status, _, body) = send(
        &wf.app,
        "GET",
        "/api/admin/approval-history/notifications",
        Some(&wf.bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let pending = body["data"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["ref_id"], 13);
    assert_eq!(pending[0]["level_index"], 1);

    // Nothing waits on carol yet
    let (_, _, body) = send(
        &wf.app,
        "GET",
        "/api/admin/approval-history/notifications",
        Some(&wf.carol),
        None,
    )
    .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    // After bob approves, the pending item moves to carol
    transition(&wf.app, &wf.bob, 13, "approve").await;

    let (_, _, body) = send(
        &wf.app,
        "GET",
        "/api/admin/approval-history/notifications",
        Some(&wf.carol),
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, _, body) = send(
        &wf.app,
        "GET",
        "/api/admin/approval-history/notifications",
        Some(&wf.bob),
        None,
    )
    .await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn level_indices_must_stay_contiguous() {
    let wf = workflow_fixture().await;
    let admin = login(&wf.app, "admin", ADMIN_PASSWORD).await;

    let (status, _, body) = send(
        &wf.app,
        "POST",
        "/api/admin/approval",
        Some(&admin),
        Some(json!({"menu_id": MACHINES_MENU, "name": "Machine approval"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let approval_id = body["data"]["id"].as_i64().unwrap();

    // First level must be 1
    let (status, _, _) = send(
        &wf.app,
        "POST",
        &format!("/api/admin/approval/{approval_id}/level"),
        Some(&admin),
        Some(json!({"level_index": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &wf.app,
        "POST",
        &format!("/api/admin/approval/{approval_id}/level"),
        Some(&admin),
        Some(json!({"level_index": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // A gap in the middle is rejected at insert time
    let (status, _, body) = send(
        &wf.app,
        "POST",
        &format!("/api/admin/approval/{approval_id}/level"),
        Some(&admin),
        Some(json!({"level_index": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn only_the_top_level_can_be_deleted() {
    let wf = workflow_fixture().await;
    let admin = login(&wf.app, "admin", ADMIN_PASSWORD).await;

    let (_, _, body) = send(
        &wf.app,
        "GET",
        &format!("/api/admin/approval/{DEPARTMENTS_MENU}/menu"),
        Some(&admin),
        None,
    )
    .await;
    let levels = body["data"]["levels"].as_array().unwrap();
    assert_eq!(levels.len(), 2);
    let level_one = levels[0]["id"].as_i64().unwrap();
    let level_two = levels[1]["id"].as_i64().unwrap();

    let (status, _, _) = send(
        &wf.app,
        "DELETE",
        &format!("/api/admin/approval/level/{level_one}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &wf.app,
        "DELETE",
        &format!("/api/admin/approval/level/{level_two}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn definition_lookup_by_menu_lists_levels_with_user_sets() {
    let wf = workflow_fixture().await;
    let admin = login(&wf.app, "admin", ADMIN_PASSWORD).await;

    let (status, _, body) = send(
        &wf.app,
        "GET",
        &format!("/api/admin/approval/{DEPARTMENTS_MENU}/menu"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let levels = body["data"]["levels"].as_array().unwrap();
    assert_eq!(levels[0]["level_index"], 1);
    assert_eq!(levels[0]["user_ids"][0], wf.bob_id);
    assert_eq!(levels[1]["level_index"], 2);
    assert_eq!(levels[1]["user_ids"][0], wf.carol_id);
}

#[tokio::test]
async fn misconfigured_definitions_cannot_accept_submissions() {
    let wf = workflow_fixture().await;
    let admin = login(&wf.app, "admin", ADMIN_PASSWORD).await;

    // Definition on the Machines menu with one level and no users
    let (_, _, body) = send(
        &wf.app,
        "POST",
        "/api/admin/approval",
        Some(&admin),
        Some(json!({"menu_id": MACHINES_MENU, "name": "Machine approval"})),
    )
    .await;
    let approval_id = body["data"]["id"].as_i64().unwrap();

    // Zero levels: submit is rejected outright
    let (status, _, body) = send(
        &wf.app,
        "POST",
        "/api/admin/approval-history",
        Some(&wf.alice),
        Some(json!({
            "ref_table": "mst_machine",
            "ref_id": 1,
            "menu_id": MACHINES_MENU,
            "action": "submit",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    // One level with an empty user set is just as unusable
    send(
        &wf.app,
        "POST",
        &format!("/api/admin/approval/{approval_id}/level"),
        Some(&admin),
        Some(json!({"level_index": 1})),
    )
    .await;

    let (status, _, body) = send(
        &wf.app,
        "POST",
        "/api/admin/approval-history",
        Some(&wf.alice),
        Some(json!({
            "ref_table": "mst_machine",
            "ref_id": 1,
            "menu_id": MACHINES_MENU,
            "action": "submit",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn a_menu_without_a_definition_cannot_take_history() {
    let wf = workflow_fixture().await;

    let (status, body) = {
        let (status, _, body) = send(
            &wf.app,
            "POST",
            "/api/admin/approval-history",
            Some(&wf.alice),
            Some(json!({
                "ref_table": "mst_currency",
                "ref_id": 1,
                "menu_id": 7,
                "action": "submit",
            })),
        )
        .await;
        (status, body)
    };
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
}
