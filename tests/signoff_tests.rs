mod common;

use reqwest::StatusCode;
use serde_json::json;

use common::{TestApp, TestUser};

/// An organization with an owner, admin, member and viewer plus one
/// project holding a board, a column and a card created by the member.
struct Workspace {
    owner: TestUser,
    admin: TestUser,
    member: TestUser,
    viewer: TestUser,
    org_id: String,
    project_id: String,
    board_id: String,
    column_id: String,
    card_id: String,
}

async fn workspace(app: &TestApp) -> Workspace {
    let owner = app.signup("owner@test.com", "Olivia").await;
    let admin = app.signup("admin@test.com", "Adam").await;
    let member = app.signup("member@test.com", "Mia").await;
    let viewer = app.signup("viewer@test.com", "Victor").await;

    let org_id = app.create_org(&owner.token, "Acme").await;
    app.add_member(&owner.token, &org_id, &admin.email, "admin").await;
    app.add_member(&owner.token, &org_id, &member.email, "member").await;
    app.add_member(&owner.token, &org_id, &viewer.email, "viewer").await;

    let project_id = app.create_project(&owner.token, &org_id, "Website").await;
    let board_id = app.create_board(&owner.token, &project_id, "Sprint").await;
    let column_id = app.create_column(&owner.token, &board_id, "To Do").await;
    let card_id = app
        .create_card(&member.token, &column_id, &json!({ "title": "Hero banner" }))
        .await;

    Workspace {
        owner,
        admin,
        member,
        viewer,
        org_id,
        project_id,
        board_id,
        column_id,
        card_id,
    }
}

async fn status(app: &TestApp, token: &str, project_id: &str) -> serde_json::Value {
    let (body, status) = app
        .get_auth(&format!("/api/v1/projects/{project_id}/signoff-status"), token)
        .await;
    assert_eq!(status, StatusCode::OK, "signoff-status failed: {body}");
    body["data"].clone()
}

#[tokio::test]
async fn new_project_is_unprotected() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;

    let s = status(&app, &ws.viewer.token, &ws.project_id).await;
    assert_eq!(s["state"], "unprotected");
    assert_eq!(s["sign_off_requested"], false);
    assert_eq!(s["sign_off_approved"], false);
    assert_eq!(s["data_protected"], false);
    assert_eq!(s["project_name"], "Website");
    assert_eq!(s["organization_id"], ws.org_id.as_str());

    common::cleanup(app).await;
}

#[tokio::test]
async fn signoff_end_to_end() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;

    // Member asks for review
    let (body, code) = app
        .post_auth(
            &format!("/api/v1/projects/{}/request-signoff", ws.project_id),
            &ws.member.token,
            &json!({ "notes": "ready for review", "reason": "Sprint done" }),
        )
        .await;
    assert_eq!(code, StatusCode::OK, "request failed: {body}");
    assert_eq!(body["data"]["state"], "requested");

    let s = status(&app, &ws.member.token, &ws.project_id).await;
    assert_eq!(s["sign_off_requested"], true);
    assert_eq!(s["data_protected"], true);
    assert_eq!(s["notes"], "ready for review");
    assert_eq!(s["reason"], "Sprint done");
    assert_eq!(s["requested_by"], ws.member.id.as_str());

    // Even the owner is locked out while protected
    let (body, code) = app
        .delete_auth(&format!("/api/v1/cards/{}", ws.card_id), &ws.owner.token)
        .await;
    assert_eq!(code, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "data_protected");

    // Owner approves and lifts protection
    let (body, code) = app
        .review_signoff(&ws.owner.token, &ws.project_id, true, true)
        .await;
    assert_eq!(code, StatusCode::OK, "approve failed: {body}");

    let s = status(&app, &ws.member.token, &ws.project_id).await;
    assert_eq!(s["state"], "approved");
    assert_eq!(s["sign_off_approved"], true);
    assert_eq!(s["data_protected"], false);
    assert_eq!(s["approved_by"], ws.owner.id.as_str());
    assert_eq!(s["approval_notes"], "Reviewed");

    // Member can delete their own card again
    let (_, code) = app
        .delete_auth(&format!("/api/v1/cards/{}", ws.card_id), &ws.member.token)
        .await;
    assert_eq!(code, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn protected_project_blocks_every_delete() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;

    let (_, code) = app.request_signoff(&ws.member.token, &ws.project_id).await;
    assert_eq!(code, StatusCode::OK);

    let targets = [
        format!("/api/v1/cards/{}", ws.card_id),
        format!("/api/v1/columns/{}", ws.column_id),
        format!("/api/v1/boards/{}", ws.board_id),
        format!("/api/v1/projects/{}", ws.project_id),
    ];
    for user in [&ws.owner, &ws.admin, &ws.member] {
        for path in &targets {
            let (body, code) = app.delete_auth(path, &user.token).await;
            assert_eq!(code, StatusCode::FORBIDDEN, "{path} by {}", user.email);
            assert_eq!(body["kind"], "data_protected", "{path} by {}", user.email);
        }
    }

    // The organization cannot be deleted around the lock either
    let (body, code) = app
        .delete_auth(&format!("/api/v1/organizations/{}", ws.org_id), &ws.owner.token)
        .await;
    assert_eq!(code, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "data_protected");

    // Nothing was removed
    let (_, code) = app
        .get_auth(&format!("/api/v1/cards/{}", ws.card_id), &ws.owner.token)
        .await;
    assert_eq!(code, StatusCode::OK);

    // Edits are still allowed
    let (_, code) = app
        .put_auth(
            &format!("/api/v1/cards/{}", ws.card_id),
            &ws.member.token,
            &json!({ "title": "Hero banner v2" }),
        )
        .await;
    assert_eq!(code, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn viewer_cannot_request_signoff() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;

    let (body, code) = app.request_signoff(&ws.viewer.token, &ws.project_id).await;
    assert_eq!(code, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "not_authorized");

    let s = status(&app, &ws.owner.token, &ws.project_id).await;
    assert_eq!(s["sign_off_requested"], false);
    assert_eq!(s["data_protected"], false);

    common::cleanup(app).await;
}

#[tokio::test]
async fn member_cannot_approve() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;
    app.request_signoff(&ws.member.token, &ws.project_id).await;

    for user in [&ws.member, &ws.viewer] {
        let (body, code) = app
            .review_signoff(&user.token, &ws.project_id, true, true)
            .await;
        assert_eq!(code, StatusCode::FORBIDDEN);
        assert_eq!(body["kind"], "not_authorized");
    }

    let s = status(&app, &ws.owner.token, &ws.project_id).await;
    assert_eq!(s["state"], "requested");
    assert_eq!(s["sign_off_approved"], false);
    assert_eq!(s["data_protected"], true);

    common::cleanup(app).await;
}

#[tokio::test]
async fn outsider_sees_not_found() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;
    let outsider = app.signup("outsider@test.com", "Otto").await;

    let (_, code) = app.request_signoff(&outsider.token, &ws.project_id).await;
    assert_eq!(code, StatusCode::NOT_FOUND);

    let (_, code) = app
        .get_auth(
            &format!("/api/v1/projects/{}/signoff-status", ws.project_id),
            &outsider.token,
        )
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn double_request_conflicts() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;

    let (_, code) = app.request_signoff(&ws.member.token, &ws.project_id).await;
    assert_eq!(code, StatusCode::OK);

    let (body, code) = app.request_signoff(&ws.admin.token, &ws.project_id).await;
    assert_eq!(code, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");

    let s = status(&app, &ws.owner.token, &ws.project_id).await;
    assert_eq!(s["requested_by"], ws.member.id.as_str());

    common::cleanup(app).await;
}

#[tokio::test]
async fn approve_without_pending_request_is_not_found() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;

    let (body, code) = app
        .review_signoff(&ws.owner.token, &ws.project_id, true, true)
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    common::cleanup(app).await;
}

#[tokio::test]
async fn rejection_returns_to_unprotected() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;
    app.request_signoff(&ws.member.token, &ws.project_id).await;

    let (body, code) = app
        .review_signoff(&ws.admin.token, &ws.project_id, false, false)
        .await;
    assert_eq!(code, StatusCode::OK, "reject failed: {body}");

    let s = status(&app, &ws.member.token, &ws.project_id).await;
    assert_eq!(s["state"], "unprotected");
    assert_eq!(s["sign_off_requested"], false);
    assert_eq!(s["sign_off_approved"], false);
    assert_eq!(s["data_protected"], false);

    let (_, code) = app
        .delete_auth(&format!("/api/v1/cards/{}", ws.card_id), &ws.member.token)
        .await;
    assert_eq!(code, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn approval_can_keep_protection() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;
    app.request_signoff(&ws.member.token, &ws.project_id).await;

    let (_, code) = app
        .review_signoff(&ws.owner.token, &ws.project_id, true, false)
        .await;
    assert_eq!(code, StatusCode::OK);

    let s = status(&app, &ws.owner.token, &ws.project_id).await;
    assert_eq!(s["sign_off_approved"], true);
    assert_eq!(s["data_protected"], true);

    let (body, code) = app
        .delete_auth(&format!("/api/v1/cards/{}", ws.card_id), &ws.owner.token)
        .await;
    assert_eq!(code, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "data_protected");

    // Not pending any more, so not listed for review
    let (body, _) = app.get_auth("/api/v1/pending-signoffs", &ws.owner.token).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    common::cleanup(app).await;
}

#[tokio::test]
async fn approved_project_can_be_requested_again() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;
    app.request_signoff(&ws.member.token, &ws.project_id).await;
    app.review_signoff(&ws.owner.token, &ws.project_id, true, true)
        .await;

    let (body, code) = app.request_signoff(&ws.member.token, &ws.project_id).await;
    assert_eq!(code, StatusCode::OK, "re-request failed: {body}");

    let s = status(&app, &ws.owner.token, &ws.project_id).await;
    assert_eq!(s["state"], "requested");
    assert_eq!(s["sign_off_approved"], false);
    assert!(s["approved_by"].is_null());
    assert_eq!(s["data_protected"], true);

    let (body, code) = app
        .get_auth(
            &format!("/api/v1/projects/{}/signoff-history", ws.project_id),
            &ws.viewer.token,
        )
        .await;
    assert_eq!(code, StatusCode::OK);
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["status"], "pending");
    assert_eq!(history[1]["status"], "approved");
    assert_eq!(history[1]["reviewed_by"], ws.owner.id.as_str());

    common::cleanup(app).await;
}

#[tokio::test]
async fn pending_list_is_scoped_to_reviewers() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;
    let quiet = app.create_project(&ws.owner.token, &ws.org_id, "Quiet").await;

    // A second organization the admin of Acme does not belong to
    let other_org = app.create_org(&ws.owner.token, "Globex").await;
    let other_project = app.create_project(&ws.owner.token, &other_org, "Portal").await;

    app.request_signoff(&ws.member.token, &ws.project_id).await;
    let (_, code) = app.request_signoff(&ws.owner.token, &other_project).await;
    assert_eq!(code, StatusCode::OK);

    let pending_ids = |body: &serde_json::Value| -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["project_id"].as_str().unwrap().to_string())
            .collect()
    };

    let (body, _) = app.get_auth("/api/v1/pending-signoffs", &ws.owner.token).await;
    let ids = pending_ids(&body);
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&ws.project_id));
    assert!(ids.contains(&other_project));
    assert!(!ids.contains(&quiet));

    let (body, _) = app
        .get_auth(
            &format!("/api/v1/pending-signoffs?organization_id={other_org}"),
            &ws.owner.token,
        )
        .await;
    assert_eq!(pending_ids(&body), vec![other_project.clone()]);

    let (body, _) = app.get_auth("/api/v1/pending-signoffs", &ws.admin.token).await;
    assert_eq!(pending_ids(&body), vec![ws.project_id.clone()]);

    for user in [&ws.member, &ws.viewer] {
        let (body, code) = app.get_auth("/api/v1/pending-signoffs", &user.token).await;
        assert_eq!(code, StatusCode::OK);
        assert!(pending_ids(&body).is_empty());
    }

    common::cleanup(app).await;
}

#[tokio::test]
async fn signoff_is_recorded_in_activity_feed() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;
    app.request_signoff(&ws.member.token, &ws.project_id).await;
    app.review_signoff(&ws.owner.token, &ws.project_id, false, false)
        .await;

    let (body, _) = app
        .get_auth(
            &format!("/api/v1/organizations/{}/activity", ws.org_id),
            &ws.viewer.token,
        )
        .await;
    let actions: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"signoff.requested"));
    assert!(actions.contains(&"signoff.rejected"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn concurrent_requests_admit_exactly_one() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;

    let (a, b) = tokio::join!(
        app.request_signoff(&ws.member.token, &ws.project_id),
        app.request_signoff(&ws.admin.token, &ws.project_id),
    );
    let mut codes = [a.1, b.1];
    codes.sort();
    assert_eq!(codes, [StatusCode::OK, StatusCode::CONFLICT]);

    let (body, _) = app
        .get_auth(
            &format!("/api/v1/projects/{}/signoff-history", ws.project_id),
            &ws.owner.token,
        )
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn concurrent_reviews_apply_exactly_one() {
    let app = common::spawn_app().await;
    let ws = workspace(&app).await;
    app.request_signoff(&ws.member.token, &ws.project_id).await;

    let (approve, reject) = tokio::join!(
        app.review_signoff(&ws.owner.token, &ws.project_id, true, true),
        app.review_signoff(&ws.admin.token, &ws.project_id, false, false),
    );
    let mut codes = [approve.1, reject.1];
    codes.sort();
    assert_eq!(codes, [StatusCode::OK, StatusCode::NOT_FOUND]);

    let approved_won = approve.1 == StatusCode::OK;
    let loser = if approved_won { &reject.0 } else { &approve.0 };
    assert_eq!(loser["kind"], "not_found");

    let s = status(&app, &ws.owner.token, &ws.project_id).await;
    assert_eq!(s["sign_off_requested"], false);
    assert_eq!(s["data_protected"], false);
    if approved_won {
        assert_eq!(s["state"], "approved");
        assert_eq!(s["sign_off_approved"], true);
        assert_eq!(s["approved_by"], ws.owner.id.as_str());
    } else {
        assert_eq!(s["state"], "unprotected");
        assert_eq!(s["sign_off_approved"], false);
    }

    let (body, _) = app
        .get_auth(
            &format!("/api/v1/projects/{}/signoff-history", ws.project_id),
            &ws.owner.token,
        )
        .await;
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    let expected = if approved_won { "approved" } else { "rejected" };
    assert_eq!(history[0]["status"], expected);

    common::cleanup(app).await;
}
