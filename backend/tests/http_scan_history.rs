//! HTTP scans and the WebSocket history feed over a real socket.
//!
//! Anonymous callers get an analysis but nothing is stored; signed-in
//! callers see each stored scan pushed to their history feed.

use std::sync::Arc;
use std::time::Duration;

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServerHandle;
use actix_web::{App, HttpServer, web};
use awc::BoxedSocket;
use awc::ws::{Codec, Frame};
use futures_util::StreamExt;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use nutrisnap::Trace;
use nutrisnap::domain::ports::{
    FixtureFoodAnalysisService, FixtureNutritionSummarizer, FIXTURE_FOOD_NAME, ScanStore,
};
use nutrisnap::domain::{DailyNutritionService, ScanPipeline};
use nutrisnap::inbound::http::identity::sign_in_anonymous;
use nutrisnap::inbound::http::scans::submit_scan;
use nutrisnap::inbound::http::state::HttpState;
use nutrisnap::inbound::ws::history_feed;
use nutrisnap::inbound::ws::state::WsState;
use nutrisnap::outbound::memory::InMemoryScanStore;

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

const PHOTO: &str = "data:image/png;base64,AAAA";

struct TestServer {
    base: String,
    handle: ServerHandle,
}

#[fixture]
fn server() -> TestServer {
    let store: Arc<dyn ScanStore> = Arc::new(InMemoryScanStore::new(Arc::new(DefaultClock)));
    let scans = Arc::new(ScanPipeline::new(
        Arc::new(FixtureFoodAnalysisService),
        Arc::clone(&store),
    ));
    let nutrition = Arc::new(DailyNutritionService::new(Arc::new(
        FixtureNutritionSummarizer,
    )));
    let http_state = web::Data::new(HttpState::new(scans, nutrition));
    let ws_state = web::Data::new(WsState::new(store));
    let key = Key::generate();

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let server = HttpServer::new(move || {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .build();
        App::new()
            .app_data(http_state.clone())
            .app_data(ws_state.clone())
            .wrap(Trace)
            .service(
                web::scope("/api/v1")
                    .wrap(session)
                    .service(sign_in_anonymous)
                    .service(submit_scan)
                    .service(history_feed),
            )
    })
    .workers(1)
    .listen(listener)
    .expect("listen")
    .disable_signals()
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    TestServer {
        base: format!("http://{addr}/api/v1"),
        handle,
    }
}

async fn sign_in(client: &awc::Client, base: &str) -> Cookie<'static> {
    let response = client
        .post(format!("{base}/session/anonymous"))
        .send()
        .await
        .expect("sign in");
    assert!(response.status().is_success());
    response.cookie("session").expect("session cookie").into_owned()
}

async fn post_scan(client: &awc::Client, base: &str, cookie: Option<&Cookie<'static>>) -> Value {
    let mut request = client.post(format!("{base}/scans"));
    if let Some(cookie) = cookie {
        request = request.cookie(cookie.clone());
    }
    let mut response = request
        .send_json(&json!({ "photoDataUri": PHOTO }))
        .await
        .expect("scan request");
    assert!(response.status().is_success());
    response.json().await.expect("scan body")
}

async fn next_snapshot(socket: &mut Socket) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("frame within timeout")
            .expect("open stream")
            .expect("valid frame");
        match frame {
            Frame::Text(bytes) => {
                let message: Value = serde_json::from_slice(&bytes).expect("json frame");
                assert_eq!(message["type"], "snapshot");
                return message;
            }
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

#[rstest]
#[actix_rt::test]
async fn anonymous_scan_is_analysed_but_not_stored(server: TestServer) {
    let client = awc::Client::default();

    let body = post_scan(&client, &server.base, None).await;
    server.handle.stop(false).await;

    assert_eq!(body["foodName"], FIXTURE_FOOD_NAME);
    assert_eq!(body["persisted"], false);
    assert!(body.get("scanId").is_none());
}

#[rstest]
#[actix_rt::test]
async fn stored_scan_is_pushed_to_the_history_feed(server: TestServer) {
    let client = awc::Client::default();
    let cookie = sign_in(&client, &server.base).await;
    let (_response, mut socket) = client
        .ws(format!("{}/ws/history", server.base))
        .cookie(cookie.clone())
        .connect()
        .await
        .expect("websocket connect");

    let initial = next_snapshot(&mut socket).await;
    assert_eq!(initial["scans"], json!([]));

    post_scan(&client, &server.base, None).await;
    let body = post_scan(&client, &server.base, Some(&cookie)).await;
    assert_eq!(body["persisted"], true);

    let updated = next_snapshot(&mut socket).await;
    server.handle.stop(false).await;

    let scans = updated["scans"].as_array().expect("scans array");
    assert_eq!(scans.len(), 1);
    assert_eq!(scans.first().map(|scan| &scan["id"]), Some(&body["scanId"]));
    assert_eq!(
        scans.first().map(|scan| &scan["foodName"]),
        Some(&json!(FIXTURE_FOOD_NAME))
    );
}
