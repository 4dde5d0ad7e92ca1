//! Tests for account self-service handlers.

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::MockAccountCommand;
use crate::inbound::http::test_utils::{TestPorts, login_as, session_cookie};
use crate::middleware::Budget;
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use actix_web::test::TestRequest;
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::{Value, json};

fn user(id: i64) -> User {
    User {
        id: UserId::new(id),
        email: format!("user{id}@example.com"),
        username: Some(format!("user{id}")),
        display_name: None,
        profile_picture_url: None,
    }
}

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(current_user)
        .service(update_current_user)
        .service(delete_current_user)
        .service(set_username)
        .service(get_settings)
        .service(update_settings)
        .service(get_user);
}

fn with_accounts(accounts: MockAccountCommand) -> TestPorts {
    TestPorts {
        accounts,
        ..TestPorts::default()
    }
}

#[rstest]
fn profile_request_keeps_absent_and_null_apart() {
    let request: ProfileRequest =
        serde_json::from_value(json!({ "profilePictureUrl": null })).expect("valid body");

    let update = ProfileUpdate::try_from(request).expect("valid update");

    assert_eq!(update.display_name, Patch::Unset);
    assert_eq!(update.profile_picture_url, Patch::Null);
}

#[rstest]
fn profile_request_rejects_overlong_display_name() {
    let request = ProfileRequest {
        display_name: Patch::Value("x".repeat(51)),
        ..ProfileRequest::default()
    };

    let error = ProfileUpdate::try_from(request).expect_err("too long");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        error.details().and_then(|d| d.get("field")).and_then(Value::as_str),
        Some("displayName")
    );
}

#[rstest]
#[case(json!({}), "missing_field")]
#[case(json!({ "username": "has space" }), "invalid_value")]
fn username_body_is_validated(#[case] body: Value, #[case] code: &str) {
    let request: UsernameRequest = serde_json::from_value(body).expect("valid json");

    let error = parse_username(request).expect_err("rejected");

    assert_eq!(
        error.details().and_then(|d| d.get("code")).and_then(Value::as_str),
        Some(code)
    );
}

#[actix_web::test]
async fn current_user_requires_a_session() {
    let app = actix_test::init_service(TestPorts::default().app(configure)).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::get().uri("/api/v1/users/me").to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn current_user_returns_profile() {
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_profile()
        .with(eq(UserId::new(5)))
        .return_once(|_| Ok(user(5)));
    let app = actix_test::init_service(with_accounts(accounts).app(configure)).await;
    let cookie = login_as(&app, 5).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/v1/users/me")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["id"], 5);
    assert_eq!(body["email"], "user5@example.com");
}

#[actix_web::test]
async fn taken_username_is_a_conflict() {
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_set_username()
        .return_once(|_, _| Err(Error::already_exists("Username already taken")));
    let app = actix_test::init_service(with_accounts(accounts).app(configure)).await;
    let cookie = login_as(&app, 5).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::put()
            .uri("/api/v1/users/me/username")
            .cookie(cookie)
            .set_json(json!({ "username": "Ada" }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "already_exists");
    assert_eq!(body["message"], "Username already taken");
}

#[actix_web::test]
async fn settings_patch_forwards_only_supplied_flags() {
    let expected = PrivacySettingsUpdate {
        profile_is_public: Patch::Value(false),
        ..PrivacySettingsUpdate::default()
    };
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_update_privacy_settings()
        .with(eq(UserId::new(5)), eq(expected))
        .return_once(|_, _| {
            Ok(PrivacySettings {
                profile_is_public: false,
                ..PrivacySettings::default()
            })
        });
    let app = actix_test::init_service(with_accounts(accounts).app(configure)).await;
    let cookie = login_as(&app, 5).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::patch()
            .uri("/api/v1/users/me/settings")
            .cookie(cookie)
            .set_json(json!({ "profileIsPublic": false }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["profileIsPublic"], false);
    assert_eq!(body["listsArePublic"], true);
}

#[actix_web::test]
async fn private_profile_is_forbidden() {
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_view_profile()
        .with(eq(UserId::new(5)), eq(UserId::new(9)))
        .return_once(|_, _| Err(Error::forbidden("This profile is private")));
    let app = actix_test::init_service(with_accounts(accounts).app(configure)).await;
    let cookie = login_as(&app, 5).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/v1/users/9")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn deleting_the_account_ends_the_session() {
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_delete_account()
        .with(eq(UserId::new(5)))
        .return_once(|_| Ok(()));
    let app = actix_test::init_service(with_accounts(accounts).app(configure)).await;
    let cookie = login_as(&app, 5).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::delete()
            .uri("/api/v1/users/me")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = session_cookie(&response).expect("removal cookie");
    assert_eq!(cleared.value(), "");
}

#[actix_web::test]
async fn session_for_a_deleted_account_is_dropped() {
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_profile()
        .with(eq(UserId::new(5)))
        .return_once(|_| Err(Error::not_found("User not found")));
    let app = actix_test::init_service(with_accounts(accounts).app(configure)).await;
    let cookie = login_as(&app, 5).await;

    let response = actix_test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/v1/users/me")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let cleared = session_cookie(&response).expect("removal cookie");
    assert_eq!(cleared.value(), "");
}

#[actix_web::test]
async fn username_changes_are_rate_limited_per_user() {
    let allowance = Budget::SetUsername.per_minute();
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_set_username()
        .with(eq(UserId::new(5)), mockall::predicate::always())
        .times(usize::try_from(allowance).expect("small allowance"))
        .returning(|_, _| Ok(user(5)));
    accounts
        .expect_set_username()
        .with(eq(UserId::new(6)), mockall::predicate::always())
        .times(1)
        .returning(|_, _| Ok(user(6)));
    let app = actix_test::init_service(with_accounts(accounts).app(configure)).await;
    let first = login_as(&app, 5).await;
    let second = login_as(&app, 6).await;
    let put_username = |cookie: &actix_web::cookie::Cookie<'static>| {
        TestRequest::put()
            .uri("/api/v1/users/me/username")
            .cookie(cookie.clone())
            .set_json(json!({ "username": "ada_l" }))
            .to_request()
    };

    for _ in 0..allowance {
        let response = actix_test::call_service(&app, put_username(&first)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let limited = actix_test::call_service(&app, put_username(&first)).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = actix_test::read_body_json(limited).await;
    assert_eq!(body["code"], "too_many_requests");

    let other = actix_test::call_service(&app, put_username(&second)).await;
    assert_eq!(other.status(), StatusCode::OK);
}
