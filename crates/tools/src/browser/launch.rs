//! Chrome discovery and launch plumbing: binary lookup, debug-port
//! allocation, command-line arguments, and CDP endpoint discovery.

use serde_json::Value;
use std::path::Path;
use webscout_core::{Error, Result};

/// Locate a Chrome/Chromium binary. An explicitly configured path wins and
/// is not second-guessed; otherwise walk the platform candidate list.
pub fn find_browser_binary(explicit: Option<&str>) -> Option<String> {
    if let Some(path) = explicit {
        if Path::new(path).exists() {
            return Some(path.to_string());
        }
        return None;
    }

    let candidates: Vec<&str> = if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ]
    } else if cfg!(target_os = "linux") {
        vec![
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
        ]
    } else {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
    };

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
        if !candidate.contains('/') && !candidate.contains('\\') && which::which(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }
    None
}

/// Build the Chrome command line. The anti-automation switches match what a
/// stealth launch needs: no AutomationControlled blink feature, no popup
/// blocking or extensions, a believable window size.
pub fn build_launch_args(debug_port: u16, user_data_dir: &Path, headless: bool) -> Vec<String> {
    let mut args = vec![
        format!("--remote-debugging-port={}", debug_port),
        format!("--user-data-dir={}", user_data_dir.display()),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-features=IsolateOrigins,site-per-process".to_string(),
        "--disable-popup-blocking".to_string(),
        "--disable-extensions".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-sync".to_string(),
        "--metrics-recording-only".to_string(),
        "--password-store=basic".to_string(),
    ];
    if headless {
        args.push("--headless=new".to_string());
    }
    args.push("--window-size=1280,800".to_string());
    args.push("about:blank".to_string());
    args
}

/// Find a free TCP port for the debugging endpoint.
pub async fn find_free_port() -> Result<u16> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| Error::Browser(format!("failed to bind for free port: {e}")))?;
    let port = listener
        .local_addr()
        .map_err(|e| Error::Browser(format!("failed to read local addr: {e}")))?
        .port();
    drop(listener);
    Ok(port)
}

/// Poll `/json/version` until the browser-level WebSocket URL appears.
pub async fn wait_for_browser_ws(port: u16, timeout_secs: u64) -> Result<String> {
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_secs(timeout_secs);
    let url = format!("http://127.0.0.1:{port}/json/version");

    loop {
        if start.elapsed() > timeout {
            return Err(Error::Timeout(format!(
                "browser CDP endpoint not ready after {timeout_secs}s on port {port}"
            )));
        }

        if let Ok(resp) = reqwest::get(&url).await {
            if let Ok(body) = resp.json::<Value>().await {
                if let Some(ws_url) = body.get("webSocketDebuggerUrl").and_then(|v| v.as_str()) {
                    return Ok(ws_url.to_string());
                }
            }
        }

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}

/// Resolve a page target's WebSocket debugger URL via `/json/list`.
/// Retries since a freshly created target may not be listed immediately.
pub async fn page_ws_url(port: u16, target_id: &str) -> Result<String> {
    let url = format!("http://127.0.0.1:{port}/json/list");

    for attempt in 0..10 {
        if attempt > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        }

        let resp = match reqwest::get(&url).await {
            Ok(r) => r,
            Err(_) => continue,
        };
        let targets: Vec<Value> = match resp.json().await {
            Ok(t) => t,
            Err(_) => continue,
        };

        for target in &targets {
            if target.get("id").and_then(|v| v.as_str()) == Some(target_id) {
                if let Some(ws_url) = target.get("webSocketDebuggerUrl").and_then(|v| v.as_str()) {
                    return Ok(ws_url.to_string());
                }
            }
        }
    }

    Err(Error::NotFound(format!(
        "no WebSocket URL for target '{target_id}' after retries"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn explicit_binary_path_is_not_second_guessed() {
        assert_eq!(find_browser_binary(Some("/nonexistent/chrome-bin")), None);
    }

    #[test]
    fn launch_args_toggle_headless() {
        let dir = PathBuf::from("/tmp/profile");
        let headless = build_launch_args(9222, &dir, true);
        assert!(headless.contains(&"--headless=new".to_string()));
        assert!(headless.contains(&"--remote-debugging-port=9222".to_string()));
        assert!(headless.contains(&"--user-data-dir=/tmp/profile".to_string()));
        assert!(headless.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(headless.contains(&"--window-size=1280,800".to_string()));

        let headed = build_launch_args(9222, &dir, false);
        assert!(!headed.contains(&"--headless=new".to_string()));
    }

    #[tokio::test]
    async fn free_port_is_nonzero() {
        let port = find_free_port().await.unwrap();
        assert!(port > 0);
    }
}
