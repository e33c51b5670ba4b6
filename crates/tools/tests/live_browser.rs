//! End-to-end checks against a locally installed Chrome/Chromium.
//!
//! Ignored by default; run with `cargo test -- --ignored` on a machine with
//! a browser available.

use base64::Engine;
use serde_json::json;
use webscout_core::Config;
use webscout_tools::{ToolContext, ToolRegistry};

fn live_ctx(dir: &tempfile::TempDir) -> ToolContext {
    ToolContext::new(dir.path().to_path_buf(), Config::default())
}

#[tokio::test]
#[ignore]
async fn open_evaluate_screenshot_close() {
    let dir = tempfile::tempdir().unwrap();
    let reg = ToolRegistry::with_defaults();
    let ctx = live_ctx(&dir);

    let opened = reg.dispatch("open_browser", ctx.clone(), json!({})).await;
    assert_eq!(opened["status"], "browser opened");

    // Arithmetic evaluates to its value, unmodified.
    let two = reg
        .dispatch("execute_javascript", ctx.clone(), json!({"script": "1+1"}))
        .await;
    assert_eq!(two, json!(2));

    // Stealth script is active before any page script runs.
    let webdriver = reg
        .dispatch(
            "execute_javascript",
            ctx.clone(),
            json!({"script": "navigator.webdriver"}),
        )
        .await;
    assert_eq!(webdriver, json!(false));

    // A screenshot decodes to PNG bytes.
    let shot = reg.dispatch("take_screenshot", ctx.clone(), json!({})).await;
    let encoded = shot.as_str().expect("base64 payload");
    assert!(!encoded.is_empty());
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);

    let closed = reg.dispatch("close_browser", ctx.clone(), json!({})).await;
    assert_eq!(closed["status"], "browser closed");
}

#[tokio::test]
#[ignore]
async fn navigation_records_current_url() {
    let dir = tempfile::tempdir().unwrap();
    let reg = ToolRegistry::with_defaults();
    let ctx = live_ctx(&dir);

    let url = "https://example.com/";
    let opened = reg
        .dispatch("open_browser", ctx.clone(), json!({"url": url}))
        .await;
    assert_eq!(
        opened["status"].as_str().unwrap(),
        format!("browser opened with url: {url}")
    );

    let current = reg.dispatch("get_current_url", ctx.clone(), json!({})).await;
    assert_eq!(current["url"], url);

    reg.dispatch("close_browser", ctx, json!({})).await;
}

#[tokio::test]
#[ignore]
async fn session_content_refresh_and_file_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let session = webscout_tools::Session::launch(
        Config::default().browser,
        dir.path().to_path_buf(),
    );

    assert!(session.goto("https://example.com/").await);

    let html = session.content().await.unwrap();
    assert!(html.contains("<html"));

    assert!(session.refresh().await);

    let path = session
        .screenshot_to_file(Some(dir.path().join("page.png")))
        .await
        .unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);

    assert!(session.teardown().await);
}
