//! The LLM-facing browser tools.
//!
//! Every tool resolves the single session slot from the `ToolContext`,
//! delegates to the session, and converts any failure into a descriptive
//! payload; the calling agent framework never sees an error, only text.

use async_trait::async_trait;
use serde_json::{json, Value};
use webscout_core::{Error, Result};

use crate::{Tool, ToolContext, ToolSchema};
use super::session::Session;

const BLANK: &str = "about:blank";

fn not_opened(verb: &str) -> Value {
    json!({"error": format!("No browser is opened to {verb}.")})
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::Tool(format!("'{key}' is required")))
}

fn required_f64(params: &Value, key: &str) -> Result<f64> {
    params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| Error::Tool(format!("'{key}' must be a number")))
}

/// Open the browser. No-op with a message when one is already open.
pub struct OpenBrowserTool;

#[async_trait]
impl Tool for OpenBrowserTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "open_browser",
            description: "Open the stealth browser. Call this once before any other browser tool. Optionally pass a url to visit immediately.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "URL to visit right after opening (optional)"
                    }
                },
                "required": []
            }),
        }
    }

    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value> {
        let mut slot = ctx.browser.lock().await;
        if slot.is_some() {
            return Ok(json!({"status": "browser already opened"}));
        }

        let session = Session::launch(ctx.config.browser.clone(), ctx.workspace.clone());

        let url = params
            .get("url")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != BLANK);

        let result = match url {
            Some(url) if session.goto(url).await => {
                json!({"status": format!("browser opened with url: {url}")})
            }
            Some(url) => json!({"error": format!("browser opened but navigation to {url} failed")}),
            None => json!({"status": "browser opened"}),
        };

        *slot = Some(session);
        Ok(result)
    }
}

/// Visit a URL in the open browser.
pub struct GoToUrlTool;

#[async_trait]
impl Tool for GoToUrlTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "go_to_url",
            description: "Visit a url in the open browser and wait for the page to load.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The url to visit"
                    }
                },
                "required": ["url"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        required_str(params, "url").map(|_| ())
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value> {
        let slot = ctx.browser.lock().await;
        let Some(session) = slot.as_ref() else {
            return Ok(not_opened("visit a url"));
        };
        let url = match required_str(&params, "url") {
            Ok(url) => url,
            Err(e) => return Ok(json!({"error": e.to_string()})),
        };
        if session.goto(url).await {
            Ok(json!({"status": format!("Navigated to {url} successfully.")}))
        } else {
            Ok(json!({"error": format!("Navigation to {url} failed.")}))
        }
    }
}

/// Report the URL recorded by the most recent navigation.
pub struct GetCurrentUrlTool;

#[async_trait]
impl Tool for GetCurrentUrlTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_current_url",
            description: "Get the currently visited url, e.g. to save it and return to it later.",
            parameters: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, _params: Value) -> Result<Value> {
        let slot = ctx.browser.lock().await;
        let Some(session) = slot.as_ref() else {
            return Ok(not_opened("get the current url from"));
        };
        match session.current_url().await {
            Some(url) => Ok(json!({"url": url})),
            None => Ok(json!({"error": "No url has been visited yet."})),
        }
    }
}

/// Return to the previous page.
pub struct GoBackTool;

#[async_trait]
impl Tool for GoBackTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "go_back",
            description: "Return to the previous url or page in the open browser.",
            parameters: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, _params: Value) -> Result<Value> {
        let slot = ctx.browser.lock().await;
        let Some(session) = slot.as_ref() else {
            return Ok(not_opened("go back in"));
        };
        if session.go_back().await {
            let url = session.current_url().await.unwrap_or_else(|| BLANK.to_string());
            Ok(json!({"status": format!("Returned back, you are now at {url}")}))
        } else {
            Ok(json!({"error": "Failed to return back."}))
        }
    }
}

/// Pause for a random duration inside a range.
pub struct SleepForTool;

#[async_trait]
impl Tool for SleepForTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "sleep_for",
            description: "Sleep for a random number of seconds between begin and end before continuing, e.g. sleep_for(0.5, 1.5).",
            parameters: json!({
                "type": "object",
                "properties": {
                    "begin": {
                        "type": "number",
                        "description": "Lower bound in seconds"
                    },
                    "end": {
                        "type": "number",
                        "description": "Upper bound in seconds"
                    }
                },
                "required": ["begin", "end"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        required_f64(params, "begin")?;
        required_f64(params, "end")?;
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value> {
        let slot = ctx.browser.lock().await;
        let Some(session) = slot.as_ref() else {
            return Ok(not_opened("sleep for"));
        };
        let (begin, end) = match (required_f64(&params, "begin"), required_f64(&params, "end")) {
            (Ok(b), Ok(e)) => (b, e),
            (Err(e), _) | (_, Err(e)) => return Ok(json!({"error": e.to_string()})),
        };
        session.sleep_for(begin, end).await;
        Ok(json!({"status": format!("Slept between {begin} and {end} seconds.")}))
    }
}

/// Run JavaScript on the visited page and return the script's result.
pub struct ExecuteJavascriptTool;

#[async_trait]
impl Tool for ExecuteJavascriptTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "execute_javascript",
            description: "Execute JavaScript on the visited page and return the script's result. Use it to read page source, submit requests, test for vulnerabilities, or manipulate the page.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "script": {
                        "type": "string",
                        "description": "The JavaScript code to execute"
                    }
                },
                "required": ["script"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        required_str(params, "script").map(|_| ())
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value> {
        let slot = ctx.browser.lock().await;
        let Some(session) = slot.as_ref() else {
            return Ok(not_opened("execute javascript on"));
        };
        let script = match required_str(&params, "script") {
            Ok(script) => script,
            Err(e) => return Ok(json!({"error": e.to_string()})),
        };
        match session.evaluate(script).await {
            // The evaluated value, unmodified, whatever its shape.
            Ok(value) => Ok(value),
            Err(e) => Ok(json!({"error": e.to_string()})),
        }
    }
}

/// Capture the current page as a base64 PNG.
pub struct TakeScreenshotTool;

#[async_trait]
impl Tool for TakeScreenshotTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "take_screenshot",
            description: "Capture a screenshot of the current page as a base64-encoded PNG. Use only when necessary; image payloads are expensive.",
            parameters: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, _params: Value) -> Result<Value> {
        let slot = ctx.browser.lock().await;
        let Some(session) = slot.as_ref() else {
            return Ok(not_opened("capture a screenshot of"));
        };
        match session.screenshot_base64().await {
            Ok(data) => Ok(Value::String(data)),
            Err(e) => Ok(json!({"error": e.to_string()})),
        }
    }
}

/// Close the browser and vacate the slot.
pub struct CloseBrowserTool;

#[async_trait]
impl Tool for CloseBrowserTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "close_browser",
            description: "Close the open browser and release its resources.",
            parameters: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: ToolContext, _params: Value) -> Result<Value> {
        let mut slot = ctx.browser.lock().await;
        let Some(session) = slot.take() else {
            return Ok(not_opened("close"));
        };
        session.teardown().await;
        Ok(json!({"status": "browser closed"}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webscout_core::Config;

    /// Context with an unreachable browser binary: sessions occupy the slot
    /// but initialization fails fast, keeping tests hermetic.
    fn test_ctx(dir: &tempfile::TempDir) -> ToolContext {
        let mut config = Config::default();
        config.browser.chrome_path = Some("/nonexistent/chrome-bin".to_string());
        ToolContext::new(dir.path().to_path_buf(), config)
    }

    fn is_not_opened(value: &Value) -> bool {
        value
            .get("error")
            .and_then(|v| v.as_str())
            .is_some_and(|s| s.contains("No browser is opened"))
    }

    #[tokio::test]
    async fn every_operation_before_open_reports_not_opened() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(&dir);

        let results = [
            GoToUrlTool.execute(ctx.clone(), json!({"url": "https://example.com"})).await,
            GetCurrentUrlTool.execute(ctx.clone(), json!({})).await,
            GoBackTool.execute(ctx.clone(), json!({})).await,
            SleepForTool.execute(ctx.clone(), json!({"begin": 0.0, "end": 0.1})).await,
            ExecuteJavascriptTool.execute(ctx.clone(), json!({"script": "1+1"})).await,
            TakeScreenshotTool.execute(ctx.clone(), json!({})).await,
            CloseBrowserTool.execute(ctx.clone(), json!({})).await,
        ];

        for result in results {
            let value = result.expect("boundary ops never raise");
            assert!(is_not_opened(&value), "unexpected payload: {value}");
        }
    }

    #[tokio::test]
    async fn second_open_reports_already_opened() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(&dir);

        let first = OpenBrowserTool.execute(ctx.clone(), json!({})).await.unwrap();
        assert_eq!(first["status"], "browser opened");

        let second = OpenBrowserTool.execute(ctx.clone(), json!({})).await.unwrap();
        assert_eq!(second["status"], "browser already opened");

        // Exactly one live session occupies the slot.
        assert!(ctx.browser.lock().await.is_some());

        let closed = CloseBrowserTool.execute(ctx.clone(), json!({})).await.unwrap();
        assert_eq!(closed["status"], "browser closed");
    }

    #[tokio::test]
    async fn close_restores_pre_open_behavior() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(&dir);

        OpenBrowserTool.execute(ctx.clone(), json!({})).await.unwrap();
        CloseBrowserTool.execute(ctx.clone(), json!({})).await.unwrap();
        assert!(ctx.browser.lock().await.is_none());

        let value = GetCurrentUrlTool.execute(ctx.clone(), json!({})).await.unwrap();
        assert!(is_not_opened(&value));
    }

    #[tokio::test]
    async fn validation_requires_inputs() {
        assert!(GoToUrlTool.validate(&json!({})).is_err());
        assert!(GoToUrlTool.validate(&json!({"url": "  "})).is_err());
        assert!(GoToUrlTool.validate(&json!({"url": "https://example.com"})).is_ok());

        assert!(ExecuteJavascriptTool.validate(&json!({})).is_err());
        assert!(SleepForTool.validate(&json!({"begin": 1.0})).is_err());
        assert!(SleepForTool.validate(&json!({"begin": 1.0, "end": 2.0})).is_ok());
    }

    #[tokio::test]
    async fn sleep_for_runs_against_open_slot() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = test_ctx(&dir);

        OpenBrowserTool.execute(ctx.clone(), json!({})).await.unwrap();
        // Inverted range is normalized, not rejected.
        let value = SleepForTool
            .execute(ctx.clone(), json!({"begin": 0.02, "end": 0.01}))
            .await
            .unwrap();
        assert!(value["status"].as_str().unwrap().starts_with("Slept between"));

        CloseBrowserTool.execute(ctx.clone(), json!({})).await.unwrap();
    }
}
