//! Tests for list handlers.

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::MockListCommand;
use crate::inbound::http::test_utils::{TestPorts, login_as};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use actix_web::test::TestRequest;
use mockall::predicate::{always, eq};
use pagination::PageRequest;
use rstest::rstest;
use serde_json::{Value, json};

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_list)
        .service(owned_lists)
        .service(public_lists)
        .service(recent_lists)
        .service(search_lists)
        .service(get_list)
        .service(update_list)
        .service(delete_list)
        .service(add_collaborator)
        .service(remove_collaborator)
        .service(members)
        .service(add_member);
}

fn with_lists(lists: MockListCommand) -> TestPorts {
    TestPorts {
        lists,
        ..TestPorts::default()
    }
}

fn details(id: i64) -> ListDetails {
    ListDetails {
        id: ListId::new(id),
        name: "Lisbon".to_owned(),
        description: None,
        is_private: true,
        is_owner: true,
        collaborators: Vec::new(),
    }
}

#[rstest]
fn create_request_requires_a_name() {
    let payload = CreateListRequest {
        name: None,
        description: None,
        is_private: false,
    };

    let error = parse_new_list(UserId::new(1), payload).expect_err("missing name");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
fn update_request_distinguishes_cleared_description() {
    let request: UpdateListRequest =
        serde_json::from_value(json!({ "description": null })).expect("valid body");

    let update = ListUpdate::try_from(request).expect("valid update");

    assert_eq!(update.description, Patch::Null);
    assert!(update.name.is_none());
    assert!(!update.is_empty());
}

#[rstest]
fn empty_update_body_is_empty_update() {
    let request: UpdateListRequest = serde_json::from_value(json!({})).expect("valid body");

    let update = ListUpdate::try_from(request).expect("valid update");

    assert!(update.is_empty());
}

#[actix_web::test]
async fn create_list_returns_created() {
    let mut lists = MockListCommand::new();
    lists
        .expect_create_list()
        .withf(|list| list.owner_id == UserId::new(3) && list.is_private)
        .return_once(|_| Ok(details(11)));
    let app = actix_test::init_service(with_lists(lists).app(configure)).await;
    let cookie = login_as(&app, 3).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/v1/lists")
            .cookie(cookie)
            .set_json(json!({ "name": "Lisbon", "isPrivate": true }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["id"], 11);
    assert_eq!(body["isOwner"], true);
}

#[actix_web::test]
async fn public_lists_need_no_session() {
    let mut lists = MockListCommand::new();
    lists
        .expect_lists()
        .with(eq(ListQuery::Public), eq(PageRequest::first(20)))
        .return_once(|_, request| Ok(Page::empty(request)));
    let app = actix_test::init_service(with_lists(lists).app(configure)).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::get().uri("/api/v1/lists/public").to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["totalPages"], 0);
}

#[actix_web::test]
async fn anonymous_search_has_no_viewer() {
    let mut lists = MockListCommand::new();
    lists
        .expect_lists()
        .withf(|query, _| matches!(query, ListQuery::Search { viewer: None, .. }))
        .return_once(|_, request| Ok(Page::empty(request)));
    let app = actix_test::init_service(with_lists(lists).app(configure)).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/v1/lists/search?q=tasca")
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_web::test]
async fn duplicate_collaborator_is_a_conflict() {
    let mut lists = MockListCommand::new();
    lists
        .expect_add_collaborator()
        .with(eq(ListId::new(4)), eq(UserId::new(3)), always())
        .return_once(|_, _, _| {
            Err(Error::collaborator_already_exists(
                "User is already a collaborator on this list",
            ))
        });
    let app = actix_test::init_service(with_lists(lists).app(configure)).await;
    let cookie = login_as(&app, 3).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/v1/lists/4/collaborators")
            .cookie(cookie)
            .set_json(json!({ "email": "bob@example.com" }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "collaborator_already_exists");
}

#[actix_web::test]
async fn invalid_collaborator_email_is_rejected_before_the_service() {
    let app = actix_test::init_service(TestPorts::default().app(configure)).await;
    let cookie = login_as(&app, 3).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/v1/lists/4/collaborators")
            .cookie(cookie)
            .set_json(json!({ "email": "not-an-email" }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn removing_the_owner_is_a_bad_request() {
    let mut lists = MockListCommand::new();
    lists
        .expect_remove_collaborator()
        .with(eq(ListId::new(4)), eq(UserId::new(3)), eq(UserId::new(3)))
        .return_once(|_, _, _| {
            Err(Error::invalid_request(
                "Cannot remove the list owner as a collaborator.",
            ))
        });
    let app = actix_test::init_service(with_lists(lists).app(configure)).await;
    let cookie = login_as(&app, 3).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::delete()
            .uri("/api/v1/lists/4/collaborators/3")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn add_member_defaults_to_viewer() {
    let mut lists = MockListCommand::new();
    lists
        .expect_add_member()
        .with(
            eq(ListId::new(4)),
            eq(UserId::new(3)),
            eq(UserId::new(8)),
            eq(CollaboratorRole::Viewer),
        )
        .return_once(|_, _, _, _| Ok(Vec::new()));
    let app = actix_test::init_service(with_lists(lists).app(configure)).await;
    let cookie = login_as(&app, 3).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/v1/lists/4/members")
            .cookie(cookie)
            .set_json(json!({ "userId": 8 }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_web::test]
async fn foreign_list_is_forbidden() {
    let mut lists = MockListCommand::new();
    lists
        .expect_get_list()
        .return_once(|_, _| Err(Error::forbidden("You do not have access to this list")));
    let app = actix_test::init_service(with_lists(lists).app(configure)).await;
    let cookie = login_as(&app, 3).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/v1/lists/99")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
