//! Chrome DevTools Protocol client over WebSocket.
//!
//! One client per CDP target. Commands are matched to responses by an
//! auto-incrementing id; events fan out to subscribers by method name.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, warn};
use webscout_core::{Error, Result};

const COMMAND_TIMEOUT_SECS: u64 = 30;

pub struct CdpClient {
    /// Sender to write messages to the WebSocket.
    ws_tx: mpsc::Sender<String>,
    /// Pending command responses, keyed by request id.
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>,
    /// Auto-incrementing command id.
    next_id: AtomicU64,
    /// Event listeners (`Domain.event` -> channels).
    event_listeners: Arc<Mutex<HashMap<String, Vec<mpsc::Sender<Value>>>>>,
    _reader_handle: tokio::task::JoinHandle<()>,
    _writer_handle: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to a CDP WebSocket endpoint.
    pub async fn connect(ws_url: &str) -> Result<Self> {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::connect_async;
        use tokio_tungstenite::tungstenite::Message;

        let (ws_stream, _) = connect_async(ws_url)
            .await
            .map_err(|e| Error::Browser(format!("CDP connect to {ws_url} failed: {e}")))?;

        let (mut ws_sink, mut ws_read) = ws_stream.split();

        let (ws_tx, mut ws_rx) = mpsc::channel::<String>(256);

        let pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let pending_clone = pending.clone();

        let event_listeners: Arc<Mutex<HashMap<String, Vec<mpsc::Sender<Value>>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let events_clone = event_listeners.clone();

        // Writer task owns the sink and forwards outgoing messages.
        let writer_handle = tokio::spawn(async move {
            while let Some(msg) = ws_rx.recv().await {
                if let Err(e) = ws_sink.send(Message::Text(msg)).await {
                    error!("CDP WebSocket write error: {}", e);
                    break;
                }
            }
        });

        // Reader task dispatches responses to pending callers and events to
        // subscribers.
        let reader_handle = tokio::spawn(async move {
            while let Some(msg_result) = ws_read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        let Ok(val) = serde_json::from_str::<Value>(&text) else {
                            continue;
                        };
                        if let Some(id) = val.get("id").and_then(|v| v.as_u64()) {
                            let mut pending = pending_clone.lock().await;
                            if let Some(tx) = pending.remove(&id) {
                                let _ = tx.send(val);
                            }
                        } else if let Some(method) = val.get("method").and_then(|v| v.as_str()) {
                            let mut listeners = events_clone.lock().await;
                            if let Some(senders) = listeners.get_mut(method) {
                                let params = val.get("params").cloned().unwrap_or(Value::Null);
                                senders.retain(|tx| !tx.is_closed());
                                for tx in senders.iter() {
                                    let _ = tx.try_send(params.clone());
                                }
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("CDP WebSocket closed by server");
                        break;
                    }
                    Err(e) => {
                        warn!("CDP WebSocket read error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok(Self {
            ws_tx,
            pending,
            next_id: AtomicU64::new(1),
            event_listeners,
            _reader_handle: reader_handle,
            _writer_handle: writer_handle,
        })
    }

    /// Send a CDP command and wait for its response.
    pub async fn send_command(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let msg = json!({
            "id": id,
            "method": method,
            "params": params,
        });

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id, tx);
        }

        self.ws_tx
            .send(msg.to_string())
            .await
            .map_err(|e| Error::Browser(format!("failed to send CDP command: {e}")))?;

        let timeout =
            tokio::time::timeout(std::time::Duration::from_secs(COMMAND_TIMEOUT_SECS), rx);
        match timeout.await {
            Ok(Ok(response)) => {
                if let Some(error) = response.get("error") {
                    Err(Error::Browser(format!("CDP error for {method}: {error}")))
                } else {
                    Ok(response.get("result").cloned().unwrap_or(Value::Null))
                }
            }
            Ok(Err(_)) => Err(Error::Browser("CDP response channel closed".to_string())),
            Err(_) => {
                let mut pending = self.pending.lock().await;
                pending.remove(&id);
                Err(Error::Timeout(format!(
                    "CDP command '{method}' timed out after {COMMAND_TIMEOUT_SECS}s"
                )))
            }
        }
    }

    /// Subscribe to a CDP event. The receiver gets each event's params.
    pub async fn subscribe_event(&self, method: &str) -> mpsc::Receiver<Value> {
        let (tx, rx) = mpsc::channel(64);
        let mut listeners = self.event_listeners.lock().await;
        listeners.entry(method.to_string()).or_default().push(tx);
        rx
    }

    /// Enable a CDP domain (e.g. "Page", "Runtime").
    pub async fn enable_domain(&self, domain: &str) -> Result<()> {
        self.send_command(&format!("{domain}.enable"), json!({})).await?;
        Ok(())
    }

    /// Start loading a URL. Returns once the navigation is accepted by the
    /// browser; load progress is observed via Page events.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        let result = self.send_command("Page.navigate", json!({"url": url})).await?;
        if let Some(error_text) = result.get("errorText").and_then(|v| v.as_str()) {
            if !error_text.is_empty() {
                return Err(Error::Browser(format!("navigation to {url} failed: {error_text}")));
            }
        }
        Ok(())
    }

    /// Reload the current page.
    pub async fn reload(&self) -> Result<()> {
        self.send_command("Page.reload", json!({})).await?;
        Ok(())
    }

    /// Evaluate JavaScript in the page and return whatever value the script
    /// produces, unmodified. Script exceptions surface as `Error::Script`.
    pub async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .send_command(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;

        if let Some(details) = result.get("exceptionDetails") {
            let text = details
                .get("exception")
                .and_then(|e| e.get("description"))
                .and_then(|d| d.as_str())
                .unwrap_or("script threw an exception");
            return Err(Error::Script(text.to_string()));
        }

        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Capture a PNG screenshot, returned base64-encoded.
    pub async fn capture_screenshot(&self) -> Result<String> {
        let result = self
            .send_command("Page.captureScreenshot", json!({"format": "png"}))
            .await?;
        result
            .get("data")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Browser("no screenshot data returned".to_string()))
    }

    /// Register a script that runs before any page script on every new
    /// document in this target.
    pub async fn add_init_script(&self, source: &str) -> Result<()> {
        self.send_command(
            "Page.addScriptToEvaluateOnNewDocument",
            json!({"source": source}),
        )
        .await?;
        Ok(())
    }

    /// Override the user agent for all outbound requests from this target.
    pub async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        self.send_command(
            "Emulation.setUserAgentOverride",
            json!({"userAgent": user_agent}),
        )
        .await?;
        Ok(())
    }

    /// Move the pointer to viewport coordinates.
    pub async fn mouse_move(&self, x: f64, y: f64) -> Result<()> {
        self.send_command(
            "Input.dispatchMouseEvent",
            json!({"type": "mouseMoved", "x": x, "y": y}),
        )
        .await?;
        Ok(())
    }

    /// Scroll via a synthetic wheel event at the given position.
    pub async fn mouse_wheel(&self, x: f64, y: f64, delta_x: f64, delta_y: f64) -> Result<()> {
        self.send_command(
            "Input.dispatchMouseEvent",
            json!({
                "type": "mouseWheel",
                "x": x,
                "y": y,
                "deltaX": delta_x,
                "deltaY": delta_y,
            }),
        )
        .await?;
        Ok(())
    }

    /// Current navigation history: (current index, entries).
    pub async fn navigation_history(&self) -> Result<(usize, Vec<Value>)> {
        let result = self
            .send_command("Page.getNavigationHistory", json!({}))
            .await?;
        let index = result
            .get("currentIndex")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;
        let entries = result
            .get("entries")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        Ok((index, entries))
    }

    /// Jump to a specific history entry.
    pub async fn navigate_to_history_entry(&self, entry_id: i64) -> Result<()> {
        self.send_command(
            "Page.navigateToHistoryEntry",
            json!({"entryId": entry_id}),
        )
        .await?;
        Ok(())
    }

    // ─── Browser-level target management ──────────────────────────────

    /// Create an isolated (incognito-style) browsing context.
    pub async fn create_browser_context(&self) -> Result<String> {
        let result = self
            .send_command("Target.createBrowserContext", json!({}))
            .await?;
        result
            .get("browserContextId")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Browser("no browserContextId returned".to_string()))
    }

    /// Create a page target, optionally inside a browsing context.
    pub async fn create_target(&self, url: &str, context_id: Option<&str>) -> Result<String> {
        let mut params = json!({"url": url});
        if let Some(id) = context_id {
            params["browserContextId"] = json!(id);
        }
        let result = self.send_command("Target.createTarget", params).await?;
        result
            .get("targetId")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Browser("no targetId returned from createTarget".to_string()))
    }

    /// Close a page target.
    pub async fn close_target(&self, target_id: &str) -> Result<()> {
        self.send_command("Target.closeTarget", json!({"targetId": target_id}))
            .await?;
        Ok(())
    }

    /// Dispose a browsing context and everything in it.
    pub async fn dispose_browser_context(&self, context_id: &str) -> Result<()> {
        self.send_command(
            "Target.disposeBrowserContext",
            json!({"browserContextId": context_id}),
        )
        .await?;
        Ok(())
    }

    /// Ask the browser process to shut down gracefully.
    pub async fn browser_close(&self) -> Result<()> {
        self.send_command("Browser.close", json!({})).await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._reader_handle.abort();
        self._writer_handle.abort();
    }
}
