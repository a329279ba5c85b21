//! End-to-end request handling through the axum router.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use asset_preprocessor::build::CACHE_STATUS_HEADER;
use asset_preprocessor::config::RewriteRuleConfig;
use asset_preprocessor::http::X_REQUEST_ID;

mod common;
use common::{server_with, Theme, Upper};

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_compiles_requested_stylesheet() {
    let theme = Theme::new();
    let upper = Upper::new();
    let app = server_with(theme.config(), upper.clone()).into_router();

    let response = get(&app, &theme.url("theme/assets/stylesheets/app.css")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/css; charset=utf-8"
    );
    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "miss");
    assert!(response.headers().contains_key(X_REQUEST_ID));
    assert_eq!(body_text(response).await, "BODY { COLOR: RED }");
    assert_eq!(upper.calls(), 1);
}

#[tokio::test]
async fn test_second_request_hits_cache() {
    let theme = Theme::new();
    let upper = Upper::new();
    let app = server_with(theme.config(), upper.clone()).into_router();
    let url = theme.url("theme/assets/stylesheets/app.css");

    get(&app, &url).await;
    let response = get(&app, &url).await;

    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "hit");
    assert_eq!(body_text(response).await, "BODY { COLOR: RED }");
    assert_eq!(upper.calls(), 1);
    assert!(theme.root().join("tmp").is_dir());
}

#[tokio::test]
async fn test_edited_source_is_recompiled() {
    let theme = Theme::new();
    let upper = Upper::new();
    let app = server_with(theme.config(), upper.clone()).into_router();
    let url = theme.url("theme/assets/stylesheets/app.css");

    get(&app, &url).await;
    theme.write("theme/assets/stylesheets/app.scss", "a { b: c }");
    let response = get(&app, &url).await;

    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "miss");
    assert_eq!(body_text(response).await, "A { B: C }");
    assert_eq!(upper.calls(), 2);
}

#[tokio::test]
async fn test_other_files_are_served_statically() {
    let theme = Theme::new();
    let upper = Upper::new();
    let app = server_with(theme.config(), upper.clone()).into_router();

    let response = get(&app, &theme.url("readme.txt")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "plain file");
    assert_eq!(upper.calls(), 0);
}

#[tokio::test]
async fn test_existing_output_files_are_served_unchanged() {
    let theme = Theme::new();
    theme.write("theme/assets/stylesheets/vendor.css", "plain-vendor");
    theme.write("vendor/normalize.css", "plain-normalize");
    let upper = Upper::new();
    let app = server_with(theme.config(), upper.clone()).into_router();

    let response = get(&app, &theme.url("theme/assets/stylesheets/vendor.css")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(CACHE_STATUS_HEADER).is_none());
    assert_eq!(body_text(response).await, "plain-vendor");

    // Outside the assets tree, where an intercepted request would be rejected.
    let response = get(&app, &theme.url("vendor/normalize.css")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "plain-normalize");

    assert_eq!(upper.calls(), 0);
}

#[tokio::test]
async fn test_existing_file_wins_over_host_catch_all() {
    let theme = Theme::new();
    theme.write("theme/assets/stylesheets/vendor.css", "plain-vendor");
    let mut config = theme.config();
    config.host.rewrite.push(RewriteRuleConfig {
        pattern: "^/(.*)$".into(),
        target: "index?pagename=$1".into(),
    });
    let upper = Upper::new();
    let app = server_with(config, upper.clone()).into_router();

    let response = get(&app, &theme.url("theme/assets/stylesheets/vendor.css")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "plain-vendor");
    assert_eq!(upper.calls(), 0);
}

#[tokio::test]
async fn test_missing_source_is_not_found() {
    let theme = Theme::new();
    let upper = Upper::new();
    let app = server_with(theme.config(), upper.clone()).into_router();

    let response = get(&app, &theme.url("theme/assets/stylesheets/missing.css")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(upper.calls(), 0);
}

#[tokio::test]
async fn test_unresolvable_urls_are_rejected() {
    let theme = Theme::new();
    let upper = Upper::new();
    let app = server_with(theme.config(), upper.clone()).into_router();

    for uri in [
        "/elsewhere/theme/assets/stylesheets/app.css".to_string(),
        theme.url("views/app.css"),
        theme.url("theme/assets/../../secret.css"),
    ] {
        let response = get(&app, &uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
    assert_eq!(upper.calls(), 0);
}

#[tokio::test]
async fn test_asset_rules_beat_host_catch_all() {
    let theme = Theme::new();
    let mut config = theme.config();
    config.host.rewrite.push(RewriteRuleConfig {
        pattern: "^/(.*)$".into(),
        target: "index?pagename=$1".into(),
    });
    let upper = Upper::new();
    let app = server_with(config, upper.clone()).into_router();

    let response = get(&app, &theme.url("theme/assets/stylesheets/app.css")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(upper.calls(), 1);

    let response = get(&app, &theme.url("readme.txt")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "plain file");
}

#[tokio::test]
async fn test_concurrent_requests_build_once() {
    let theme = Theme::new();
    let upper = Upper::with_delay(Duration::from_millis(200));
    let app = server_with(theme.config(), upper.clone()).into_router();
    let url = theme.url("theme/assets/stylesheets/app.css");

    let requests = (0..8).map(|_| {
        let app = app.clone();
        let url = url.clone();
        tokio::spawn(async move { get(&app, &url).await.status() })
    });
    for handle in requests.collect::<Vec<_>>() {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(upper.calls(), 1);
}

#[tokio::test]
async fn test_slow_build_times_out() {
    let theme = Theme::new();
    let mut config = theme.config();
    config.build.timeout_secs = 1;
    let upper = Upper::with_delay(Duration::from_secs(5));
    let app = server_with(config, upper).into_router();

    let response = get(&app, &theme.url("theme/assets/stylesheets/app.css")).await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[cfg(unix)]
#[tokio::test]
async fn test_stylesheet_preprocessor_runs_configured_program() {
    let theme = Theme::new();
    let mut config = theme.config();
    config.preferences.insert("css.sass_path".into(), "echo".into());
    config.preferences.insert("css.output_style".into(), "compressed".into());
    let app = asset_preprocessor::lifecycle::initialize(config)
        .unwrap()
        .into_router();

    let response = get(&app, &theme.url("theme/assets/stylesheets/app.css")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("--style=compressed"), "{body}");
    assert!(body.trim_end().ends_with("app.scss"), "{body}");
}
