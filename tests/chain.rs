use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use request_gate::{
    api::v1::{ADMIN_GET_USER, ADMIN_LIST_USERS, GET_PROFILE, INTERNAL_PING, INTERNAL_RESOLVE_USER},
    app::build_router,
    config::GateConfig,
    services::{
        auth::{JwtClaimVerifier, Role},
        users::{InMemoryUserDirectory, User},
    },
    state::AppState,
};

const SERVICE_NAME: &str = "user-service";
const DOMAIN: &str = "user-service.example.com";
const SERVICE_SECRET: &[u8] = b"chain-test-service-secret";
const USER_SECRET: &[u8] = b"chain-test-user-secret";
const BODY_LIMIT: usize = 64 * 1024;

fn member(role: Role, suspended: bool) -> User {
    User {
        id: Uuid::new_v4(),
        name: format!("{role}-{}", if suspended { "suspended" } else { "active" }),
        role,
        suspended,
    }
}

fn app(users: Vec<User>) -> Router {
    let gate = GateConfig::new(SERVICE_NAME, DOMAIN, [INTERNAL_PING]);
    let verifier = Arc::new(JwtClaimVerifier::new(SERVICE_SECRET, USER_SECRET, 0));
    let directory = Arc::new(InMemoryUserDirectory::new(users));

    build_router(AppState::new(gate, verifier, directory), BODY_LIMIT)
}

fn exp_in(seconds: i64) -> i64 {
    chrono::Utc::now().timestamp() + seconds
}

fn sign(secret: &[u8], claims: Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .unwrap()
}

fn user_token(user: &User) -> String {
    sign(
        USER_SECRET,
        json!({
            "sub": user.id.to_string(),
            "sid": format!("session-{}", user.name),
            "verified": true,
            "role": user.role,
            "exp": exp_in(3600),
        }),
    )
}

fn service_token(audience: &[&str]) -> String {
    sign(
        SERVICE_SECRET,
        json!({ "iss": "gateway", "aud": audience, "exp": exp_in(3600) }),
    )
}

struct Reply {
    status: StatusCode,
    request_id_header: Option<String>,
    body: Value,
}

async fn call(app: &Router, path: &str, headers: &[(&str, String)], body: Value) -> Reply {
    call_raw(app, path, headers, "application/json", body.to_string()).await
}

async fn call_raw(
    app: &Router,
    path: &str,
    headers: &[(&str, String)],
    content_type: &str,
    body: String,
) -> Reply {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", content_type);
    for (key, value) in headers {
        builder = builder.header(*key, value);
    }
    let req = builder.body(Body::from(body)).unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let request_id_header = resp
        .headers()
        .get("x-request-id")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    Reply {
        status,
        request_id_header,
        body,
    }
}

fn error_info(body: &Value) -> &Value {
    &body["error"]["details"][0]
}

fn assert_envelope(reply: &Reply, status: StatusCode, reason: &str, request_id: &str) {
    assert_eq!(reply.status, status, "{}", reply.body);
    assert_eq!(reply.body["error"]["status"], reason);
    let info = error_info(&reply.body);
    assert_eq!(info["reason"], reason);
    assert_eq!(info["domain"], DOMAIN);
    assert_eq!(info["metadata"]["request_id"], request_id);
    assert!(info["metadata"]["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn missing_request_id_stops_the_chain_first() {
    let caller = member(Role::Admin, false);
    let app = app(vec![caller.clone()]);

    // No user token either: the correlator must reject before user authentication runs.
    let reply = call(&app, GET_PROFILE, &[], json!({})).await;

    assert_envelope(&reply, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", "unknown");
    assert_eq!(reply.body["error"]["message"], "missing request id");
}

#[tokio::test]
async fn malformed_request_id_is_unauthenticated() {
    let caller = member(Role::Admin, false);
    let app = app(vec![caller.clone()]);

    let reply = call(
        &app,
        GET_PROFILE,
        &[
            ("x-request-id", "not-a-uuid".into()),
            ("x-user-token", user_token(&caller)),
        ],
        json!({}),
    )
    .await;

    assert_envelope(&reply, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", "unknown");
    assert_eq!(reply.body["error"]["message"], "invalid request id");
}

#[tokio::test]
async fn verified_user_claims_reach_the_handler_unchanged() {
    let caller = member(Role::Moderator, false);
    let app = app(vec![caller.clone()]);
    let request_id = Uuid::new_v4().to_string();

    let reply = call(
        &app,
        GET_PROFILE,
        &[
            ("x-request-id", request_id.clone()),
            ("x-user-token", user_token(&caller)),
        ],
        json!({}),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.request_id_header.as_deref(), Some(request_id.as_str()));
    assert_eq!(reply.body["id"], caller.id.to_string());
    assert_eq!(reply.body["session_id"], format!("session-{}", caller.name));
    assert_eq!(reply.body["verified"], true);
    assert_eq!(reply.body["role"], "moderator");
    assert_eq!(reply.body["user"]["name"], caller.name);
}

#[tokio::test]
async fn missing_user_token_carries_the_request_id() {
    let app = app(vec![]);
    let request_id = Uuid::new_v4().to_string();

    let reply = call(
        &app,
        GET_PROFILE,
        &[("x-request-id", request_id.clone())],
        json!({}),
    )
    .await;

    assert_envelope(&reply, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", &request_id);
    assert_eq!(reply.body["error"]["message"], "missing user token");
}

#[tokio::test]
async fn expired_user_token_gets_a_generic_message() {
    let caller = member(Role::Admin, false);
    let app = app(vec![caller.clone()]);
    let request_id = Uuid::new_v4().to_string();
    let expired = sign(
        USER_SECRET,
        json!({
            "sub": caller.id.to_string(),
            "role": "admin",
            "exp": exp_in(-3600),
        }),
    );

    let reply = call(
        &app,
        GET_PROFILE,
        &[("x-request-id", request_id.clone()), ("x-user-token", expired)],
        json!({}),
    )
    .await;

    assert_envelope(&reply, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", &request_id);
    assert_eq!(reply.body["error"]["message"], "failed to verify user token");
}

#[tokio::test]
async fn plain_user_calling_admin_action_is_permission_denied() {
    let caller = member(Role::User, false);
    let target = member(Role::User, false);
    let app = app(vec![caller.clone(), target.clone()]);
    let request_id = Uuid::new_v4().to_string();

    let reply = call(
        &app,
        ADMIN_GET_USER,
        &[
            ("x-request-id", request_id.clone()),
            ("x-user-token", user_token(&caller)),
        ],
        json!({ "user_id": target.id.to_string() }),
    )
    .await;

    assert_envelope(&reply, StatusCode::FORBIDDEN, "PERMISSION_DENIED", &request_id);
    assert_eq!(
        reply.body["error"]["message"],
        "role cannot perform this action"
    );
}

#[tokio::test]
async fn admin_may_read_lower_ranked_user() {
    let admin = member(Role::Admin, false);
    let target = member(Role::Moderator, false);
    let app = app(vec![admin.clone(), target.clone()]);

    let reply = call(
        &app,
        ADMIN_GET_USER,
        &[
            ("x-request-id", Uuid::new_v4().to_string()),
            ("x-user-token", user_token(&admin)),
        ],
        json!({ "user_id": target.id.to_string() }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["id"], target.id.to_string());
    assert_eq!(reply.body["role"], "moderator");
}

#[tokio::test]
async fn admin_may_not_read_peer_admin() {
    let admin = member(Role::Admin, false);
    let peer = member(Role::Admin, false);
    let app = app(vec![admin.clone(), peer.clone()]);
    let request_id = Uuid::new_v4().to_string();

    let reply = call(
        &app,
        ADMIN_GET_USER,
        &[
            ("x-request-id", request_id.clone()),
            ("x-user-token", user_token(&admin)),
        ],
        json!({ "user_id": peer.id.to_string() }),
    )
    .await;

    assert_envelope(&reply, StatusCode::FORBIDDEN, "PERMISSION_DENIED", &request_id);
    assert_eq!(
        reply.body["error"]["message"],
        "initiator role too low for target"
    );
}

#[tokio::test]
async fn suspended_superuser_is_denied() {
    let suspended = member(Role::SuperUser, true);
    let target = member(Role::User, false);
    let app = app(vec![suspended.clone(), target.clone()]);

    let reply = call(
        &app,
        ADMIN_GET_USER,
        &[
            ("x-request-id", Uuid::new_v4().to_string()),
            ("x-user-token", user_token(&suspended)),
        ],
        json!({ "user_id": target.id.to_string() }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["error"]["message"], "initiator is suspended");
}

#[tokio::test]
async fn superuser_target_is_readable_by_admin() {
    let admin = member(Role::Admin, false);
    let root = member(Role::SuperUser, false);
    let app = app(vec![admin.clone(), root.clone()]);

    let reply = call(
        &app,
        ADMIN_GET_USER,
        &[
            ("x-request-id", Uuid::new_v4().to_string()),
            ("x-user-token", user_token(&admin)),
        ],
        json!({ "user_id": root.id.to_string() }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["role"], "superuser");
}

#[tokio::test]
async fn malformed_target_is_invalid_argument_with_field_violation() {
    let admin = member(Role::Admin, false);
    let app = app(vec![admin.clone()]);
    let request_id = Uuid::new_v4().to_string();

    let reply = call(
        &app,
        ADMIN_GET_USER,
        &[
            ("x-request-id", request_id.clone()),
            ("x-user-token", user_token(&admin)),
        ],
        json!({ "user_id": "42" }),
    )
    .await;

    assert_envelope(&reply, StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", &request_id);
    let violations = &reply.body["error"]["details"][1]["field_violations"];
    assert_eq!(violations[0]["field"], "user_id");
    assert_eq!(violations[0]["description"], "must be a valid UUID");
}

#[tokio::test]
async fn unknown_target_is_not_found() {
    let admin = member(Role::Admin, false);
    let app = app(vec![admin.clone()]);
    let request_id = Uuid::new_v4().to_string();

    let reply = call(
        &app,
        ADMIN_GET_USER,
        &[
            ("x-request-id", request_id.clone()),
            ("x-user-token", user_token(&admin)),
        ],
        json!({ "user_id": Uuid::new_v4().to_string() }),
    )
    .await;

    assert_envelope(&reply, StatusCode::NOT_FOUND, "NOT_FOUND", &request_id);
}

#[tokio::test]
async fn initiator_missing_from_directory_is_unauthenticated() {
    let ghost = member(Role::Admin, false);
    let target = member(Role::User, false);
    let app = app(vec![target.clone()]);

    let reply = call(
        &app,
        ADMIN_GET_USER,
        &[
            ("x-request-id", Uuid::new_v4().to_string()),
            ("x-user-token", user_token(&ghost)),
        ],
        json!({ "user_id": target.id.to_string() }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"]["message"], "initiator not found");
}

#[tokio::test]
async fn list_users_is_paginated() {
    let moderator = member(Role::Moderator, false);
    let mut users = vec![moderator.clone()];
    users.extend((0..4).map(|_| member(Role::User, false)));
    let app = app(users);

    let reply = call(
        &app,
        ADMIN_LIST_USERS,
        &[
            ("x-request-id", Uuid::new_v4().to_string()),
            ("x-user-token", user_token(&moderator)),
        ],
        json!({ "page": 2, "size": 2 }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["items"].as_array().unwrap().len(), 2);
    assert_eq!(
        reply.body["pagination"],
        json!({ "page": 2, "size": 2, "total": 5 })
    );
}

#[tokio::test]
async fn oversized_pages_are_rejected_and_far_pages_are_empty() {
    let admin = member(Role::Admin, false);
    let app = app(vec![admin.clone()]);
    let request_id = Uuid::new_v4().to_string();
    let headers = [
        ("x-request-id", request_id.clone()),
        ("x-user-token", user_token(&admin)),
    ];

    let reply = call(
        &app,
        ADMIN_LIST_USERS,
        &headers,
        json!({ "page": u32::MAX, "size": u32::MAX }),
    )
    .await;

    assert_envelope(&reply, StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", &request_id);
    let violations = &reply.body["error"]["details"][1]["field_violations"];
    assert_eq!(violations[0]["field"], "size");

    let reply = call(
        &app,
        ADMIN_LIST_USERS,
        &headers,
        json!({ "page": u32::MAX, "size": 100 }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert!(reply.body["items"].as_array().unwrap().is_empty());
    assert_eq!(reply.body["pagination"]["total"], 1);
}

#[tokio::test]
async fn unparsable_body_is_invalid_argument_envelope() {
    let admin = member(Role::Admin, false);
    let app = app(vec![admin.clone()]);
    let request_id = Uuid::new_v4().to_string();
    let headers = [
        ("x-request-id", request_id.clone()),
        ("x-user-token", user_token(&admin)),
    ];

    let reply = call_raw(&app, ADMIN_GET_USER, &headers, "application/json", "{".into()).await;

    assert_envelope(&reply, StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", &request_id);
    assert_eq!(reply.body["error"]["message"], "malformed request body");
    let violations = &reply.body["error"]["details"][1]["field_violations"];
    assert_eq!(violations[0]["field"], "body");
}

#[tokio::test]
async fn mistyped_body_is_invalid_argument_envelope() {
    let admin = member(Role::Admin, false);
    let app = app(vec![admin.clone()]);
    let request_id = Uuid::new_v4().to_string();

    let reply = call(
        &app,
        ADMIN_GET_USER,
        &[
            ("x-request-id", request_id.clone()),
            ("x-user-token", user_token(&admin)),
        ],
        json!({ "user_id": 5 }),
    )
    .await;

    assert_envelope(&reply, StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", &request_id);
    assert_eq!(reply.body["error"]["message"], "invalid request body");
    let violations = &reply.body["error"]["details"][1]["field_violations"];
    assert_eq!(violations[0]["field"], "body");
    assert!(violations[0]["description"].as_str().unwrap().contains("user_id"));
}

#[tokio::test]
async fn non_json_content_type_is_invalid_argument_envelope() {
    let user = member(Role::User, false);
    let app = app(vec![user.clone()]);
    let request_id = Uuid::new_v4().to_string();

    let reply = call_raw(
        &app,
        INTERNAL_RESOLVE_USER,
        &[
            ("x-request-id", request_id.clone()),
            ("x-service-token", service_token(&[SERVICE_NAME])),
        ],
        "text/plain",
        json!({ "user_id": user.id.to_string() }).to_string(),
    )
    .await;

    assert_envelope(&reply, StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", &request_id);
    assert_eq!(reply.body["error"]["message"], "unsupported content type");
}

#[tokio::test]
async fn oversized_body_is_invalid_argument_envelope() {
    let admin = member(Role::Admin, false);
    let app = app(vec![admin.clone()]);
    let request_id = Uuid::new_v4().to_string();

    let reply = call(
        &app,
        ADMIN_GET_USER,
        &[
            ("x-request-id", request_id.clone()),
            ("x-user-token", user_token(&admin)),
        ],
        json!({ "user_id": "x".repeat(BODY_LIMIT + 1) }),
    )
    .await;

    assert_envelope(&reply, StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", &request_id);
    assert_eq!(reply.body["error"]["message"], "request body too large");
}

#[tokio::test]
async fn service_token_in_authorization_key_is_accepted() {
    let user = member(Role::User, false);
    let app = app(vec![user.clone()]);

    let reply = call(
        &app,
        INTERNAL_RESOLVE_USER,
        &[
            ("x-request-id", Uuid::new_v4().to_string()),
            (
                "authorization",
                format!("Bearer {}", service_token(&[SERVICE_NAME])),
            ),
        ],
        json!({ "user_id": user.id.to_string() }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["id"], user.id.to_string());
}

#[tokio::test]
async fn service_token_for_another_audience_is_rejected() {
    let user = member(Role::User, false);
    let app = app(vec![user.clone()]);
    let request_id = Uuid::new_v4().to_string();

    let reply = call(
        &app,
        INTERNAL_RESOLVE_USER,
        &[
            ("x-request-id", request_id.clone()),
            ("x-service-token", service_token(&["billing"])),
        ],
        json!({ "user_id": user.id.to_string() }),
    )
    .await;

    assert_envelope(&reply, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", &request_id);
}

#[tokio::test]
async fn service_token_signed_with_wrong_key_is_rejected_generically() {
    let user = member(Role::User, false);
    let app = app(vec![user.clone()]);
    let forged = sign(
        USER_SECRET,
        json!({ "iss": "gateway", "aud": SERVICE_NAME, "exp": exp_in(3600) }),
    );

    let reply = call(
        &app,
        INTERNAL_RESOLVE_USER,
        &[
            ("x-request-id", Uuid::new_v4().to_string()),
            ("x-service-token", forged),
        ],
        json!({ "user_id": user.id.to_string() }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        reply.body["error"]["message"],
        "failed to verify service token"
    );
}

#[tokio::test]
async fn peer_service_resolves_user() {
    let user = member(Role::User, false);
    let app = app(vec![user.clone()]);

    let reply = call(
        &app,
        INTERNAL_RESOLVE_USER,
        &[
            ("x-request-id", Uuid::new_v4().to_string()),
            (
                "x-service-token",
                format!("Bearer {}", service_token(&["billing", SERVICE_NAME])),
            ),
        ],
        json!({ "user_id": user.id.to_string() }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["id"], user.id.to_string());
}

#[tokio::test]
async fn user_token_does_not_open_service_routes() {
    let user = member(Role::SuperUser, false);
    let app = app(vec![user.clone()]);

    let reply = call(
        &app,
        INTERNAL_RESOLVE_USER,
        &[
            ("x-request-id", Uuid::new_v4().to_string()),
            ("x-user-token", user_token(&user)),
        ],
        json!({ "user_id": user.id.to_string() }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"]["message"], "missing service token");
}

#[tokio::test]
async fn exempt_method_skips_service_authentication() {
    let app = app(vec![]);

    let reply = call(
        &app,
        INTERNAL_PING,
        &[("x-request-id", Uuid::new_v4().to_string())],
        json!({}),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["status"], "ok");
}

#[tokio::test]
async fn exempt_method_still_requires_request_id() {
    let app = app(vec![]);

    let reply = call(&app, INTERNAL_PING, &[], json!({})).await;

    assert_envelope(&reply, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", "unknown");
}

#[tokio::test]
async fn health_and_unknown_routes_bypass_the_chain() {
    let app = app(vec![]);

    let health = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let missing = call(&app, "/nope.v1.Nothing/Here", &[], json!({})).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
