pub mod browser;
pub mod registry;

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

use webscout_core::{Config, Result};

pub use browser::{BrowserHost, Session};
pub use registry::ToolRegistry;

/// Shared state handed to every tool invocation.
///
/// The browser slot lives here rather than in process-global state so that
/// embedders and tests can hold independent instances.
#[derive(Clone)]
pub struct ToolContext {
    pub workspace: PathBuf,
    pub config: Config,
    pub browser: BrowserHost,
}

impl ToolContext {
    pub fn new(workspace: PathBuf, config: Config) -> Self {
        Self {
            workspace,
            config,
            browser: browser::new_host(),
        }
    }
}

pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;
    fn validate(&self, params: &Value) -> Result<()>;
    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value>;
}
