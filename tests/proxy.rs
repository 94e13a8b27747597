use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use reqwest::Client;
use serde_json::Value;
use std::net::SocketAddr;
use tower::ServiceExt;
use voice_compare::fetch::ProxyRule;
use voice_compare::server::{ProxyState, router};

const BODY: &[u8] = b"RIFF....WAVEfmt ";

async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/voices/ok.wav", get(|| async { BODY }))
        .route(
            "/voices/forbidden.wav",
            get(|| async { (StatusCode::FORBIDDEN, "denied") }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn proxy_for(prefix: String) -> Router {
    let rule = ProxyRule::new(vec![prefix], "http://127.0.0.1:3000");
    router(ProxyState::new(Client::new(), rule, 120))
}

async fn get_proxy(app: Router, target: Option<&str>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let uri = match target {
        Some(target) => {
            let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
            format!("/audio-proxy?url={encoded}")
        }
        None => "/audio-proxy".to_string(),
    };
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

fn error_message(body: &[u8]) -> String {
    let value: Value = serde_json::from_slice(body).unwrap();
    value["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_missing_url_is_bad_request() {
    let (status, _, body) = get_proxy(proxy_for("http://x/".to_string()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "URL parameter is required");
}

#[tokio::test]
async fn test_disallowed_origin_is_rejected() {
    let (status, _, body) = get_proxy(
        proxy_for("https://bucket.example/".to_string()),
        Some("https://elsewhere.example/a.wav"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Invalid URL");
}

#[tokio::test]
async fn test_streams_allowed_audio_with_headers() {
    let addr = spawn_upstream().await;
    let app = proxy_for(format!("http://{addr}/voices/"));

    let (status, headers, body) =
        get_proxy(app, Some(&format!("http://{addr}/voices/ok.wav"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, BODY);
    assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET");
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=120");
}

#[tokio::test]
async fn test_upstream_status_is_forwarded() {
    let addr = spawn_upstream().await;

    let (status, _, body) = get_proxy(
        proxy_for(format!("http://{addr}/voices/")),
        Some(&format!("http://{addr}/voices/forbidden.wav")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_message(&body), "Failed to fetch audio");

    let (status, _, body) = get_proxy(
        proxy_for(format!("http://{addr}/voices/")),
        Some(&format!("http://{addr}/voices/missing.wav")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "Failed to fetch audio");
}

#[tokio::test]
async fn test_unreachable_upstream_is_internal_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (status, _, body) = get_proxy(
        proxy_for(format!("http://{addr}/")),
        Some(&format!("http://{addr}/a.wav")),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(&body), "Internal server error");
}

#[tokio::test]
async fn test_http_fetcher_goes_through_proxy() {
    use voice_compare::fetch::{Fetcher, HttpFetcher};
    use voice_compare::error::AudioError;

    let upstream = spawn_upstream().await;
    let prefix = format!("http://{upstream}/voices/");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_addr = listener.local_addr().unwrap();
    let app = proxy_for(prefix.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let rule = ProxyRule::new(vec![prefix.clone()], format!("http://{proxy_addr}"));
    let fetcher = HttpFetcher::new(rule).unwrap();

    let bytes = fetcher.fetch(&format!("{prefix}ok.wav")).await.unwrap();
    assert_eq!(&bytes[..], BODY);

    let err = fetcher.fetch(&format!("{prefix}missing.wav")).await.unwrap_err();
    assert!(matches!(err, AudioError::Fetch { status: Some(404), .. }));
}
