use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};
use webscout_core::{Error, Result};

use crate::browser::tools::{
    CloseBrowserTool, ExecuteJavascriptTool, GetCurrentUrlTool, GoBackTool, GoToUrlTool,
    OpenBrowserTool, SleepForTool, TakeScreenshotTool,
};
use crate::{Tool, ToolContext};

#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(OpenBrowserTool));
        registry.register(Arc::new(GoToUrlTool));
        registry.register(Arc::new(GetCurrentUrlTool));
        registry.register(Arc::new(GoBackTool));
        registry.register(Arc::new(SleepForTool));
        registry.register(Arc::new(ExecuteJavascriptTool));
        registry.register(Arc::new(TakeScreenshotTool));
        registry.register(Arc::new(CloseBrowserTool));

        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        debug!(name = schema.name, "Registering tool");
        self.tools.insert(schema.name.to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Tool schemas in the function-calling shape agent frameworks expect.
    pub fn get_tool_schemas(&self) -> Vec<Value> {
        self.tools
            .values()
            .map(|tool| {
                let schema = tool.schema();
                json!({
                    "type": "function",
                    "function": {
                        "name": schema.name,
                        "description": schema.description,
                        "parameters": schema.parameters
                    }
                })
            })
            .collect()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub async fn execute(&self, name: &str, ctx: ToolContext, params: Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::Tool(format!("Unknown tool: {name}")))?;

        if let Err(e) = tool.validate(&params) {
            warn!(tool = name, error = %e, "Tool validation failed");
            return Err(e);
        }

        debug!(tool = name, "Executing tool");
        tool.execute(ctx, params).await
    }

    /// Like `execute`, but any registry-level failure (unknown tool, bad
    /// params) comes back as an `{"error": ...}` payload. Callers never
    /// observe an `Err` through this path.
    pub async fn dispatch(&self, name: &str, ctx: ToolContext, params: Value) -> Value {
        match self.execute(name, ctx, params).await {
            Ok(value) => value,
            Err(e) => json!({"error": format!("Error: {e}")}),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webscout_core::Config;

    #[test]
    fn registry_new_is_empty() {
        let reg = ToolRegistry::new();
        assert!(reg.tool_names().is_empty());
        assert!(reg.get("open_browser").is_none());
    }

    #[test]
    fn registry_with_defaults_has_browser_tools() {
        let reg = ToolRegistry::with_defaults();
        let names = reg.tool_names();
        for expected in [
            "open_browser",
            "go_to_url",
            "get_current_url",
            "go_back",
            "sleep_for",
            "execute_javascript",
            "take_screenshot",
            "close_browser",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn schemas_are_function_shaped() {
        let reg = ToolRegistry::with_defaults();
        for schema in reg.get_tool_schemas() {
            assert_eq!(schema["type"], "function");
            assert!(schema["function"]["name"].is_string());
            assert!(schema["function"]["parameters"]["type"] == "object");
        }
    }

    #[tokio::test]
    async fn dispatch_stringifies_registry_errors() {
        let reg = ToolRegistry::with_defaults();
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path().to_path_buf(), Config::default());

        let unknown = reg.dispatch("no_such_tool", ctx.clone(), json!({})).await;
        assert!(unknown["error"].as_str().unwrap().contains("Unknown tool"));

        let invalid = reg.dispatch("go_to_url", ctx, json!({})).await;
        assert!(invalid["error"].as_str().unwrap().contains("required"));
    }
}
