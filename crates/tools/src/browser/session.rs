//! One browser session: a Chrome process, an isolated browsing context,
//! and a single page target.
//!
//! `Session::launch` returns immediately and initializes in the background;
//! the completion signal is a one-shot watch flag and every operation goes
//! through `ensure_ready` before touching handles, so initialization
//! happens-before first use. Navigation is paced with randomized delays and
//! synthetic pointer motion to look less like automation.

use rand::Rng;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use webscout_core::{BrowserConfig, Error, Result};

use super::cdp::CdpClient;
use super::launch::{
    build_launch_args, find_browser_binary, find_free_port, page_ws_url, wait_for_browser_ws,
};
use super::stealth::{user_agent, STEALTH_SCRIPT};

const INIT_TIMEOUT_SECS: u64 = 15;
const NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Live engine/context/page handles. Released child-to-parent in
/// `Session::teardown`; dropping the CDP clients aborts their socket tasks
/// and the child process is killed on drop as a backstop.
struct Handles {
    process: Child,
    /// Browser-level CDP connection (target management, shutdown).
    browser: CdpClient,
    /// Isolated browsing context, if one was created.
    context_id: Option<String>,
    page_target: String,
    /// Page-level CDP connection (navigation, scripts, screenshots).
    page: CdpClient,
}

pub struct Session {
    config: BrowserConfig,
    user_data_dir: PathBuf,
    screenshots_dir: PathBuf,
    handles: Arc<Mutex<Option<Handles>>>,
    current_url: Arc<Mutex<Option<String>>>,
    ready: watch::Receiver<bool>,
}

impl Session {
    /// Start a session rooted in `workspace` (browser profile and
    /// screenshots live under it). Initialization (process launch, stealth
    /// setup, context/page creation) runs in a background task; the
    /// returned handle is usable immediately and operations will wait for
    /// readiness.
    pub fn launch(config: BrowserConfig, workspace: PathBuf) -> Self {
        let user_data_dir = config
            .profile
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| workspace.join("browser").join("profile"));
        let screenshots_dir = workspace.join("screenshots");

        let (ready_tx, ready_rx) = watch::channel(false);
        let handles: Arc<Mutex<Option<Handles>>> = Arc::new(Mutex::new(None));

        {
            let config = config.clone();
            let user_data_dir = user_data_dir.clone();
            let handles = handles.clone();
            tokio::spawn(async move {
                match initialize(&config, &user_data_dir).await {
                    Ok(h) => {
                        *handles.lock().await = Some(h);
                    }
                    Err(e) => {
                        warn!(error = %e, "browser initialization failed");
                    }
                }
                // Fires exactly once, success or not; a failed init is
                // retried by whichever operation awaits readiness next.
                let _ = ready_tx.send(true);
            });
        }

        Self {
            config,
            user_data_dir,
            screenshots_dir,
            handles,
            current_url: Arc::new(Mutex::new(None)),
            ready: ready_rx,
        }
    }

    /// Wait for the one-shot initialization signal, then re-run
    /// initialization synchronously if no live handles exist (failed
    /// background init or a prior teardown).
    pub async fn ensure_ready(&self) -> Result<()> {
        let mut ready = self.ready.clone();
        ready
            .wait_for(|done| *done)
            .await
            .map_err(|_| Error::Session("initialization task dropped".to_string()))?;

        let mut guard = self.handles.lock().await;
        if guard.is_none() {
            *guard = Some(initialize(&self.config, &self.user_data_dir).await?);
        }
        Ok(())
    }

    /// The URL most recently recorded by navigation.
    pub async fn current_url(&self) -> Option<String> {
        self.current_url.lock().await.clone()
    }

    /// Load a URL, wait for DOMContentLoaded, then pace like a reader:
    /// a short random pause, a few pointer moves, a small scroll.
    pub async fn goto(&self, url: &str) -> bool {
        match self.try_goto(url).await {
            Ok(()) => true,
            Err(e) => {
                warn!(url, error = %e, "navigation failed");
                false
            }
        }
    }

    async fn try_goto(&self, url: &str) -> Result<()> {
        self.ensure_ready().await?;
        let guard = self.handles.lock().await;
        let h = live(&guard)?;

        let mut dom_loaded = h.page.subscribe_event("Page.domContentEventFired").await;
        h.page.navigate(url).await?;
        tokio::time::timeout(
            Duration::from_secs(NAVIGATION_TIMEOUT_SECS),
            dom_loaded.recv(),
        )
        .await
        .map_err(|_| Error::Timeout(format!("DOMContentLoaded not observed for {url}")))?;

        *self.current_url.lock().await = Some(url.to_string());

        tokio::time::sleep(jitter(0.5, 2.0)).await;
        if let Err(e) = simulate_human_behavior(&h.page).await {
            debug!(error = %e, "human behavior simulation failed");
        }
        Ok(())
    }

    /// Go back one history entry; the current URL is updated from the
    /// page's own reported entry.
    pub async fn go_back(&self) -> bool {
        match self.try_go_back().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "history navigation failed");
                false
            }
        }
    }

    async fn try_go_back(&self) -> Result<()> {
        self.ensure_ready().await?;
        let guard = self.handles.lock().await;
        let h = live(&guard)?;

        let (index, entries) = h.page.navigation_history().await?;
        let (entry_id, url) = previous_history_entry(index, &entries)?;
        h.page.navigate_to_history_entry(entry_id).await?;

        *self.current_url.lock().await = url;

        tokio::time::sleep(jitter(0.5, 1.0)).await;
        Ok(())
    }

    /// Reload the current page.
    pub async fn refresh(&self) -> bool {
        let result: Result<()> = async {
            self.ensure_ready().await?;
            let guard = self.handles.lock().await;
            live(&guard)?.page.reload().await
        }
        .await;
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "refresh failed");
                false
            }
        }
    }

    /// Run JavaScript against the current page and return the value it
    /// produces, unmodified.
    pub async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        self.ensure_ready().await?;
        let guard = self.handles.lock().await;
        live(&guard)?.page.evaluate(script).await
    }

    /// Full HTML of the current page.
    pub async fn content(&self) -> Result<String> {
        let value = self.evaluate("document.documentElement.outerHTML").await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Browser("page content was not a string".to_string()))
    }

    /// Capture the page as a base64-encoded PNG.
    pub async fn screenshot_base64(&self) -> Result<String> {
        self.ensure_ready().await?;
        let guard = self.handles.lock().await;
        live(&guard)?.page.capture_screenshot().await
    }

    /// Capture the page to a PNG file. Defaults to a timestamp-derived
    /// filename in the workspace screenshots directory. Returns the path
    /// written.
    pub async fn screenshot_to_file(&self, path: Option<PathBuf>) -> Result<PathBuf> {
        use base64::Engine;

        let encoded = self.screenshot_base64().await?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| Error::Browser(format!("screenshot decode failed: {e}")))?;

        let path = path.unwrap_or_else(|| self.screenshots_dir.join(screenshot_filename()));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Suspend for a uniformly random duration between `begin` and `end`
    /// seconds. An inverted range is normalized by swapping the bounds.
    pub async fn sleep_for(&self, begin: f64, end: f64) {
        tokio::time::sleep(jitter(begin, end)).await;
    }

    /// Release page, context, engine, and driver handles in that order.
    /// Each step is independently guarded; a partially-initialized session
    /// tears down cleanly. Never errors.
    pub async fn teardown(&self) -> bool {
        // Let an in-flight background init settle first so no orphan
        // process survives the slot being vacated.
        let mut ready = self.ready.clone();
        let _ = ready.wait_for(|done| *done).await;

        let mut guard = self.handles.lock().await;
        let Some(mut h) = guard.take() else {
            *self.current_url.lock().await = None;
            return true;
        };

        if let Err(e) = h.browser.close_target(&h.page_target).await {
            debug!(error = %e, "page close failed (may already be gone)");
        }
        if let Some(context_id) = h.context_id.take() {
            if let Err(e) = h.browser.dispose_browser_context(&context_id).await {
                debug!(error = %e, "context dispose failed (may already be gone)");
            }
        }
        if let Err(e) = h.browser.browser_close().await {
            debug!(error = %e, "browser close failed (may already be gone)");
        }
        if let Err(e) = h.process.kill().await {
            debug!(error = %e, "process kill failed (may already have exited)");
        }
        // Dropping `h` tears down the CDP socket tasks.

        *self.current_url.lock().await = None;
        true
    }
}

fn live<'a>(guard: &'a tokio::sync::MutexGuard<'_, Option<Handles>>) -> Result<&'a Handles> {
    guard
        .as_ref()
        .ok_or_else(|| Error::Session("browser not initialized".to_string()))
}

/// Entry one step back from the browser-reported history index: its id and
/// url. The index comes from the wire, so out-of-range is an error.
fn previous_history_entry(
    index: usize,
    entries: &[serde_json::Value],
) -> Result<(i64, Option<String>)> {
    if index == 0 {
        return Err(Error::Session("no previous page in history".to_string()));
    }
    let entry = entries
        .get(index - 1)
        .ok_or_else(|| Error::Browser(format!("history index {index} out of range")))?;
    let id = entry
        .get("id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| Error::Browser("history entry without id".to_string()))?;
    let url = entry
        .get("url")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    Ok((id, url))
}

/// Launch the engine, connect CDP, create the context and page, and apply
/// the stealth configuration (once per page target, before any document).
async fn initialize(config: &BrowserConfig, user_data_dir: &Path) -> Result<Handles> {
    let binary = find_browser_binary(config.chrome_path.as_deref()).ok_or_else(|| {
        Error::NotFound("no Chrome/Chromium binary found; install one or set chromePath".to_string())
    })?;

    std::fs::create_dir_all(user_data_dir)
        .map_err(|e| Error::Browser(format!("failed to create user data dir: {e}")))?;

    let port = find_free_port().await?;
    let args = build_launch_args(port, user_data_dir, config.headless);

    info!(port, headless = config.headless, "launching browser");

    let mut process = Command::new(&binary)
        .args(&args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Browser(format!("failed to launch {binary}: {e}")))?;

    match attach(port, config).await {
        Ok((browser, context_id, page_target, page)) => {
            info!(port, target = %page_target, "browser session ready");
            Ok(Handles {
                process,
                browser,
                context_id,
                page_target,
                page,
            })
        }
        Err(e) => {
            let _ = process.kill().await;
            Err(e)
        }
    }
}

async fn attach(
    port: u16,
    config: &BrowserConfig,
) -> Result<(CdpClient, Option<String>, String, CdpClient)> {
    let browser_ws = wait_for_browser_ws(port, INIT_TIMEOUT_SECS).await?;
    let browser = CdpClient::connect(&browser_ws).await?;

    // A persistent profile already isolates state on disk; otherwise use an
    // incognito-style context.
    let context_id = if config.incognito && config.profile.is_none() {
        Some(browser.create_browser_context().await?)
    } else {
        None
    };

    let page_target = browser
        .create_target("about:blank", context_id.as_deref())
        .await?;
    let page_ws = page_ws_url(port, &page_target).await?;
    let page = CdpClient::connect(&page_ws).await?;

    page.enable_domain("Page").await?;
    page.enable_domain("Runtime").await?;
    page.set_user_agent(&user_agent(config.chrome_version.as_deref()))
        .await?;
    page.add_init_script(STEALTH_SCRIPT).await?;

    Ok((browser, context_id, page_target, page))
}

/// A handful of pointer moves and a small scroll after navigation.
async fn simulate_human_behavior(page: &CdpClient) -> Result<()> {
    let dims = page
        .evaluate("({width: window.innerWidth, height: window.innerHeight})")
        .await?;
    let width = dims.get("width").and_then(|v| v.as_f64()).unwrap_or(1280.0);
    let height = dims.get("height").and_then(|v| v.as_f64()).unwrap_or(800.0);

    let plan = plan_human_behavior(width, height);
    for (x, y) in &plan.moves {
        page.mouse_move(*x, *y).await?;
        tokio::time::sleep(jitter(0.1, 0.3)).await;
    }
    page.mouse_wheel(width / 2.0, height / 2.0, 0.0, plan.wheel)
        .await?;
    tokio::time::sleep(jitter(0.2, 0.5)).await;
    Ok(())
}

struct HumanPlan {
    moves: Vec<(f64, f64)>,
    wheel: f64,
}

/// 2-5 random pointer positions away from the viewport edges, plus a
/// 100-300px scroll. Falls back to the full viewport when it is too small
/// for the usual margins.
fn plan_human_behavior(width: f64, height: f64) -> HumanPlan {
    let mut rng = rand::thread_rng();

    let (x_lo, x_hi) = if width > 300.0 { (100.0, width - 200.0) } else { (0.0, width.max(1.0)) };
    let (y_lo, y_hi) = if height > 300.0 { (100.0, height - 200.0) } else { (0.0, height.max(1.0)) };

    let count = rng.gen_range(2..=5);
    let moves = (0..count)
        .map(|_| (rng.gen_range(x_lo..x_hi).round(), rng.gen_range(y_lo..y_hi).round()))
        .collect();

    HumanPlan {
        moves,
        wheel: rng.gen_range(100.0f64..=300.0).round(),
    }
}

/// Uniform random duration in `[begin, end]` seconds; inverted bounds are
/// swapped rather than rejected.
fn jitter(begin: f64, end: f64) -> Duration {
    let (lo, hi) = if begin <= end { (begin, end) } else { (end, begin) };
    let lo = lo.max(0.0);
    let hi = hi.max(lo);
    let secs = if hi > lo {
        rand::thread_rng().gen_range(lo..=hi)
    } else {
        lo
    };
    Duration::from_secs_f64(secs)
}

fn screenshot_filename() -> String {
    format!("screenshot_{}.png", chrono::Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_in_range() {
        for _ in 0..50 {
            let d = jitter(0.1, 0.3);
            assert!(d >= Duration::from_secs_f64(0.1));
            assert!(d <= Duration::from_secs_f64(0.3));
        }
    }

    #[test]
    fn jitter_swaps_inverted_range() {
        for _ in 0..50 {
            let d = jitter(2.0, 0.5);
            assert!(d >= Duration::from_secs_f64(0.5));
            assert!(d <= Duration::from_secs_f64(2.0));
        }
    }

    #[test]
    fn jitter_handles_degenerate_inputs() {
        assert_eq!(jitter(1.0, 1.0), Duration::from_secs_f64(1.0));
        assert_eq!(jitter(-3.0, -1.0), Duration::ZERO);
    }

    #[test]
    fn human_plan_stays_inside_viewport() {
        for _ in 0..20 {
            let plan = plan_human_behavior(1280.0, 800.0);
            assert!(plan.moves.len() >= 2 && plan.moves.len() <= 5);
            for (x, y) in &plan.moves {
                assert!(*x >= 100.0 && *x <= 1080.0);
                assert!(*y >= 100.0 && *y <= 600.0);
            }
            assert!(plan.wheel >= 100.0 && plan.wheel <= 300.0);
        }
    }

    #[test]
    fn human_plan_tolerates_tiny_viewport() {
        let plan = plan_human_behavior(200.0, 120.0);
        assert!(!plan.moves.is_empty());
    }

    #[test]
    fn history_back_is_bounds_checked() {
        use serde_json::json;
        let entries = vec![json!({"id": 7, "url": "https://example.com/"})];

        assert!(previous_history_entry(0, &entries).is_err());
        // An index past the array (malformed CDP response) errors, no panic.
        assert!(previous_history_entry(5, &entries).is_err());
        assert!(previous_history_entry(1, &[json!({"url": "x"})]).is_err());

        let (id, url) = previous_history_entry(1, &entries).unwrap();
        assert_eq!(id, 7);
        assert_eq!(url.as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn screenshot_filename_is_timestamped_png() {
        let name = screenshot_filename();
        assert!(name.starts_with("screenshot_"));
        assert!(name.ends_with(".png"));
    }

    #[tokio::test]
    async fn session_dirs_derive_from_workspace() {
        let config = BrowserConfig {
            chrome_path: Some("/nonexistent/chrome-bin".to_string()),
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let session = Session::launch(config, dir.path().to_path_buf());

        assert_eq!(session.screenshots_dir, dir.path().join("screenshots"));
        assert_eq!(
            session.user_data_dir,
            dir.path().join("browser").join("profile")
        );
        assert!(session.teardown().await);
    }

    #[tokio::test]
    async fn failed_init_surfaces_on_ensure_ready() {
        let config = BrowserConfig {
            chrome_path: Some("/nonexistent/chrome-bin".to_string()),
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let session = Session::launch(config, dir.path().to_path_buf());

        let err = session.ensure_ready().await.unwrap_err();
        assert!(err.to_string().contains("binary"), "unexpected error: {err}");

        // A dead session still tears down without error.
        assert!(session.teardown().await);
        assert_eq!(session.current_url().await, None);
    }
}
