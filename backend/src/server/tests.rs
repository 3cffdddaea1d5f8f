//! Tests for server bootstrap: wiring, readiness and the fixture fallback.

use actix_web::cookie::{Key, SameSite};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use nutrisnap::TRACE_ID_HEADER;
use nutrisnap::domain::ports::FIXTURE_FOOD_NAME;
use nutrisnap::inbound::http::health::HealthState;
use nutrisnap::inbound::http::session_config::SessionSettings;

use super::state_builders::build_app_states;
use super::{AppDependencies, ServerConfig, build_app, create_server};

const PHOTO: &str = "data:image/png;base64,AAAA";

#[fixture]
fn server_config() -> ServerConfig {
    let session = SessionSettings {
        key: Key::generate(),
        cookie_secure: false,
        same_site: SameSite::Lax,
    };
    ServerConfig::new(session, ([127, 0, 0, 1], 0).into())
}

fn dependencies(config: &ServerConfig) -> AppDependencies {
    AppDependencies {
        health_state: web::Data::new(HealthState::new()),
        states: build_app_states(config).expect("fixture states build"),
        key: config.key.clone(),
        cookie_secure: config.cookie_secure,
        same_site: config.same_site,
    }
}

#[rstest]
#[actix_rt::test]
async fn create_server_marks_ready(server_config: ServerConfig) {
    let health_state = web::Data::new(HealthState::new());
    assert!(!health_state.is_ready(), "state should start unready");

    let server = create_server(health_state.clone(), server_config).expect("server starts");

    assert!(health_state.is_ready());
    let handle = server.handle();
    actix_rt::spawn(server);
    handle.stop(false).await;
}

#[rstest]
#[actix_rt::test]
async fn signed_in_scans_are_stored(server_config: ServerConfig) {
    let app = test::init_service(build_app(dependencies(&server_config))).await;

    let signed_in = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/session/anonymous")
            .to_request(),
    )
    .await;
    assert_eq!(signed_in.status(), StatusCode::OK);
    let cookie = signed_in
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(|cookie| cookie.into_owned())
        .expect("session cookie");

    let scanned = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/scans")
            .cookie(cookie)
            .set_json(json!({ "photoDataUri": PHOTO }))
            .to_request(),
    )
    .await;
    assert_eq!(scanned.status(), StatusCode::OK);
    assert!(scanned.headers().contains_key(TRACE_ID_HEADER));
    let body: Value = test::read_body_json(scanned).await;

    assert_eq!(body["foodName"], FIXTURE_FOOD_NAME);
    assert_eq!(body["persisted"], true);
    assert!(body["scanId"].is_string());
}

#[rstest]
#[actix_rt::test]
async fn anonymous_scans_are_analysed_but_not_stored(server_config: ServerConfig) {
    let app = test::init_service(build_app(dependencies(&server_config))).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/scans")
            .set_json(json!({ "photoDataUri": PHOTO }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;

    assert_eq!(body["persisted"], false);
    assert!(body.get("scanId").is_none());
}

#[rstest]
#[actix_rt::test]
async fn empty_photo_is_a_bad_request(server_config: ServerConfig) {
    let app = test::init_service(build_app(dependencies(&server_config))).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/scans")
            .set_json(json!({ "photoDataUri": "" }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert!(body["traceId"].is_string());
}

#[rstest]
#[actix_rt::test]
async fn probes_are_served_outside_the_api_scope(server_config: ServerConfig) {
    let app = test::init_service(build_app(dependencies(&server_config))).await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/health/live").to_request())
        .await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[cfg(debug_assertions)]
#[rstest]
#[actix_rt::test]
async fn serves_the_openapi_document(server_config: ServerConfig) {
    let app = test::init_service(build_app(dependencies(&server_config))).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api-docs/openapi.json")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let doc: Value = test::read_body_json(res).await;

    assert!(doc["paths"]["/api/v1/scans"].is_object());
}
